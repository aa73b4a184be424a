//! Filter compiler.
//!
//! Turns raw request parameters into a [`FilterSpec`] according to the
//! resource's field declarations, and evaluates a compiled spec against
//! in-memory documents. The SQL rendering of the same spec lives in the
//! query builder; both must agree.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::schema::{DATE_FROM_PARAM, DATE_TO_PARAM, FieldKind, ResourceSchema, SEARCH_PARAM};
use super::types::{ALL_SENTINEL, Constraint, FilterSpec, ListingParams, QueryContext, SearchField};

/// Naive datetime layouts accepted for date bounds besides RFC 3339.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Which side of a date range a parameter bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Compile request parameters into a filter for `schema`.
///
/// Never fails: values that cannot be interpreted leave their field
/// unconstrained.
pub fn compile(schema: &ResourceSchema, params: &ListingParams, ctx: &QueryContext) -> FilterSpec {
    let mut spec = FilterSpec::default();
    let mut search_fields = Vec::new();

    for decl in schema.fields() {
        match decl.kind {
            FieldKind::Exact => {
                if let Some(value) = params.constraint_value(decl.param) {
                    spec.push(Constraint::Equals {
                        field: decl.path.to_string(),
                        value: value.to_string(),
                    });
                }
            }
            FieldKind::Set => {
                if let Some(raw) = params.constraint_value(decl.param)
                    && let Some(constraint) = set_constraint(decl.path, raw)
                {
                    spec.push(constraint);
                }
            }
            FieldKind::Boolean => {
                let value = match params.get(decl.param) {
                    Some("true") => Some(true),
                    Some("false") => Some(false),
                    _ => None,
                };
                if let Some(value) = value {
                    spec.push(Constraint::Boolean {
                        field: decl.path.to_string(),
                        value,
                    });
                }
            }
            FieldKind::TextSearch => search_fields.push(SearchField {
                path: decl.path.to_string(),
                list: decl.list,
            }),
            FieldKind::DateRange => {
                let from = date_bound(params, DATE_FROM_PARAM, Bound::Start, ctx.offset);
                let to = date_bound(params, DATE_TO_PARAM, Bound::End, ctx.offset);
                if from.is_some() || to.is_some() {
                    spec.push(Constraint::DateRange {
                        field: decl.path.to_string(),
                        from,
                        to,
                    });
                }
            }
        }
    }

    if let Some(pattern) = params.get(SEARCH_PARAM)
        && !search_fields.is_empty()
    {
        spec.push(Constraint::Search {
            pattern: pattern.to_string(),
            fields: search_fields,
        });
    }

    spec
}

/// Split a comma-separated value into a membership constraint.
fn set_constraint(path: &str, raw: &str) -> Option<Constraint> {
    if !raw.contains(',') {
        return Some(Constraint::Equals {
            field: path.to_string(),
            value: raw.to_string(),
        });
    }

    let values: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL_SENTINEL)
        .map(str::to_string)
        .collect();

    match values.len() {
        0 => None,
        1 => values.into_iter().next().map(|value| Constraint::Equals {
            field: path.to_string(),
            value,
        }),
        _ => Some(Constraint::OneOf {
            field: path.to_string(),
            values,
        }),
    }
}

fn date_bound(
    params: &ListingParams,
    name: &str,
    bound: Bound,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let raw = params.get(name)?;
    let parsed = parse_date_bound(raw, bound, offset);
    if parsed.is_none() {
        tracing::debug!(param = name, value = raw, "ignoring unparsable date bound");
    }
    parsed
}

/// Parse a date bound. An upper bound always extends to the end of its
/// local day (23:59:59.999) so the whole day is included.
fn parse_date_bound(raw: &str, bound: Bound, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let local = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&offset).naive_local()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)?
    } else {
        NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?
    };

    let local = match bound {
        Bound::Start => local,
        Bound::End => local.date().and_hms_milli_opt(23, 59, 59, 999)?,
    };

    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Resolve a dotted path inside a document. JSON `null` counts as absent.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |value, segment| value.get(segment))
        .filter(|v| !v.is_null())
}

/// Interpret a document value as a timestamp.
pub fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a scalar document value the way equality filters see it.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalar equality; lists never equal a single value.
fn value_equals(value: &Value, expected: &str) -> bool {
    scalar_string(value).is_some_and(|s| s == expected)
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|v| value_contains(v, needle)),
        _ => false,
    }
}

impl Constraint {
    /// Evaluate against one document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Constraint::Equals { field, value } => {
                lookup(doc, field).is_some_and(|v| value_equals(v, value))
            }
            Constraint::OneOf { field, values } => lookup(doc, field)
                .is_some_and(|v| values.iter().any(|expected| value_equals(v, expected))),
            Constraint::Search { pattern, fields } => {
                let needle = pattern.to_lowercase();
                fields
                    .iter()
                    .any(|f| lookup(doc, &f.path).is_some_and(|v| value_contains(v, &needle)))
            }
            Constraint::DateRange { field, from, to } => {
                match lookup(doc, field).and_then(as_timestamp) {
                    Some(ts) => from.is_none_or(|f| ts >= f) && to.is_none_or(|t| ts <= t),
                    None => false,
                }
            }
            Constraint::Boolean { field, value } => {
                lookup(doc, field).and_then(Value::as_bool) == Some(*value)
            }
        }
    }
}

impl FilterSpec {
    /// Evaluate every constraint against one document.
    pub fn matches(&self, doc: &Value) -> bool {
        self.constraints().iter().all(|c| c.matches(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::schema::ResourceSchema;
    use serde_json::json;

    fn manila() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn ctx() -> QueryContext {
        QueryContext::new(Utc::now(), manila())
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::builder("incident_report")
            .exact("type", "type")
            .set("status", "status")
            .boolean("isUrgent", "isUrgent")
            .search("title")
            .search("description")
            .search_list("tags")
            .date_range("createdAt")
            .build()
    }

    fn params(pairs: &[(&str, &str)]) -> ListingParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn no_params_no_constraints() {
        let spec = compile(&schema(), &params(&[]), &ctx());
        assert!(spec.is_empty());
    }

    #[test]
    fn all_sentinel_is_absent() {
        let spec = compile(
            &schema(),
            &params(&[("type", "All"), ("status", "All")]),
            &ctx(),
        );
        assert!(spec.is_empty());
    }

    #[test]
    fn exact_field_compiles_equality() {
        let spec = compile(&schema(), &params(&[("type", "Fire")]), &ctx());
        assert_eq!(
            spec.constraints(),
            &[Constraint::Equals {
                field: "type".to_string(),
                value: "Fire".to_string(),
            }]
        );
    }

    #[test]
    fn set_field_splits_on_comma() {
        let spec = compile(
            &schema(),
            &params(&[("status", "Pending, Resolved,,All")]),
            &ctx(),
        );
        assert_eq!(
            spec.constraints(),
            &[Constraint::OneOf {
                field: "status".to_string(),
                values: vec!["Pending".to_string(), "Resolved".to_string()],
            }]
        );
    }

    #[test]
    fn set_field_without_comma_is_exact() {
        let spec = compile(&schema(), &params(&[("status", "Pending")]), &ctx());
        assert!(matches!(spec.constraints()[0], Constraint::Equals { .. }));
    }

    #[test]
    fn set_field_collapsing_to_one_value_is_exact() {
        let spec = compile(&schema(), &params(&[("status", "Pending,")]), &ctx());
        assert_eq!(
            spec.constraints(),
            &[Constraint::Equals {
                field: "status".to_string(),
                value: "Pending".to_string(),
            }]
        );
    }

    #[test]
    fn boolean_accepts_only_true_false() {
        let yes = compile(&schema(), &params(&[("isUrgent", "true")]), &ctx());
        let no = compile(&schema(), &params(&[("isUrgent", "false")]), &ctx());
        let other = compile(&schema(), &params(&[("isUrgent", "yes")]), &ctx());
        let caps = compile(&schema(), &params(&[("isUrgent", "TRUE")]), &ctx());

        assert!(matches!(
            yes.constraints()[0],
            Constraint::Boolean { value: true, .. }
        ));
        assert!(matches!(
            no.constraints()[0],
            Constraint::Boolean { value: false, .. }
        ));
        assert!(other.is_empty());
        assert!(caps.is_empty());
    }

    #[test]
    fn search_collects_declared_fields() {
        let spec = compile(&schema(), &params(&[("search", "fire")]), &ctx());
        let Constraint::Search { pattern, fields } = &spec.constraints()[0] else {
            panic!("expected search constraint");
        };

        assert_eq!(pattern, "fire");
        assert_eq!(fields.len(), 3);
        assert!(fields[2].list);
    }

    #[test]
    fn date_to_extends_to_end_of_local_day() {
        let spec = compile(
            &schema(),
            &params(&[("dateFrom", "2024-01-02"), ("dateTo", "2024-01-03")]),
            &ctx(),
        );
        let Constraint::DateRange { from, to, .. } = &spec.constraints()[0] else {
            panic!("expected date range");
        };

        // Midnight 2024-01-02 in UTC+8 is 16:00 the previous day in UTC.
        assert_eq!(from.unwrap().to_rfc3339(), "2024-01-01T16:00:00+00:00");
        assert_eq!(to.unwrap().to_rfc3339(), "2024-01-03T15:59:59.999+00:00");
    }

    #[test]
    fn date_to_rfc3339_still_covers_whole_day() {
        let bound = parse_date_bound("2024-01-03T09:30:00+08:00", Bound::End, manila()).unwrap();
        assert_eq!(bound.to_rfc3339(), "2024-01-03T15:59:59.999+00:00");
    }

    #[test]
    fn malformed_date_is_unconstrained() {
        let spec = compile(&schema(), &params(&[("dateFrom", "not-a-date")]), &ctx());
        assert!(spec.is_empty());

        let spec = compile(
            &schema(),
            &params(&[("dateFrom", "garbage"), ("dateTo", "2024-01-03")]),
            &ctx(),
        );
        let Constraint::DateRange { from, to, .. } = &spec.constraints()[0] else {
            panic!("expected date range");
        };
        assert!(from.is_none());
        assert!(to.is_some());
    }

    #[test]
    fn naive_datetime_bound_is_local() {
        let bound = parse_date_bound("2024-01-02T08:00", Bound::Start, manila()).unwrap();
        assert_eq!(bound.to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }

    #[test]
    fn lookup_walks_nested_paths() {
        let doc = json!({"dateTime": {"scheduled": "2024-01-02T00:00:00Z"}, "empty": null});

        assert_eq!(
            lookup(&doc, "dateTime.scheduled"),
            Some(&json!("2024-01-02T00:00:00Z"))
        );
        assert!(lookup(&doc, "dateTime.missing").is_none());
        assert!(lookup(&doc, "empty").is_none());
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let spec = compile(&schema(), &params(&[("search", "FIRE")]), &ctx());

        assert!(spec.matches(&json!({"title": "Fire Alert"})));
        assert!(spec.matches(&json!({"description": "no fire mentioned"})));
        assert!(spec.matches(&json!({"tags": ["drill", "fire-drill"]})));
        assert!(!spec.matches(&json!({"title": "Flood", "tags": ["water"]})));
    }

    #[test]
    fn equality_never_matches_list_elements() {
        let c = Constraint::Equals {
            field: "tags".to_string(),
            value: "flood".to_string(),
        };
        assert!(!c.matches(&json!({"tags": ["fire", "flood"]})));
        assert!(!c.matches(&json!({"tags": ["flood"]})));
        assert!(c.matches(&json!({"tags": "flood"})));

        let one_of = Constraint::OneOf {
            field: "tags".to_string(),
            values: vec!["flood".to_string(), "fire".to_string()],
        };
        assert!(!one_of.matches(&json!({"tags": ["flood"]})));
        assert!(one_of.matches(&json!({"tags": "fire"})));
    }

    #[test]
    fn date_range_requires_timestamp() {
        let c = Constraint::DateRange {
            field: "createdAt".to_string(),
            from: None,
            to: Some(Utc::now()),
        };
        assert!(c.matches(&json!({"createdAt": "2024-01-02T00:00:00Z"})));
        assert!(!c.matches(&json!({"createdAt": "yesterday"})));
        assert!(!c.matches(&json!({})));
    }

    #[test]
    fn boolean_requires_json_bool() {
        let c = Constraint::Boolean {
            field: "isUrgent".to_string(),
            value: true,
        };
        assert!(c.matches(&json!({"isUrgent": true})));
        assert!(!c.matches(&json!({"isUrgent": "true"})));
        assert!(!c.matches(&json!({})));
    }
}
