//! Per-resource listing declarations.
//!
//! Each list endpoint declares which parameters filter which document
//! fields, which fields take part in text search, which keys are sortable
//! and which statistics its dashboard needs. The pipeline is driven
//! entirely by this declaration.

use super::aggregate::StatSpec;

/// Query parameter carrying the text search pattern.
pub const SEARCH_PARAM: &str = "search";
/// Query parameter carrying the inclusive lower date bound.
pub const DATE_FROM_PARAM: &str = "dateFrom";
/// Query parameter carrying the inclusive upper date bound.
pub const DATE_TO_PARAM: &str = "dateTo";

/// How a declared field is constrained by request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `param=value` → equality.
    Exact,
    /// `param=a,b` → one of; a single value → equality.
    Set,
    /// Matched by the shared `search` parameter.
    TextSearch,
    /// Bounded by `dateFrom` / `dateTo`.
    DateRange,
    /// `param=true|false`.
    Boolean,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Query parameter name (`search` / `dateFrom` for shared kinds).
    pub param: &'static str,

    /// Document path, dots for nesting (e.g. `dateTime.scheduled`).
    pub path: &'static str,

    pub kind: FieldKind,

    /// Document value is a list of strings.
    pub list: bool,
}

/// Pager limits for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 100,
        }
    }
}

/// Field ordered by the priority rank table instead of lexically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedSort {
    /// Document path holding the enumerated value.
    pub field: &'static str,

    /// Additional sort keys that select this ordering.
    pub aliases: Vec<&'static str>,

    /// Display-name field used as ascending secondary key.
    pub tiebreak: &'static str,
}

impl RankedSort {
    pub fn new(field: &'static str, tiebreak: &'static str) -> Self {
        Self {
            field,
            aliases: Vec::new(),
            tiebreak,
        }
    }

    pub fn alias(mut self, key: &'static str) -> Self {
        self.aliases.push(key);
        self
    }

    fn answers_to(&self, key: &str) -> bool {
        self.field == key || self.aliases.contains(&key)
    }
}

/// Complete listing declaration of one resource.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    collection: &'static str,
    fields: Vec<FieldDecl>,
    sortable: Vec<&'static str>,
    default_sort: &'static str,
    ranked: Option<RankedSort>,
    pager: PagerConfig,
    stats: Vec<StatSpec>,
}

impl ResourceSchema {
    /// Start declaring the resource stored in `collection`.
    pub fn builder(collection: &'static str) -> ResourceSchemaBuilder {
        ResourceSchemaBuilder {
            schema: ResourceSchema {
                collection,
                fields: Vec::new(),
                sortable: Vec::new(),
                default_sort: "createdAt",
                ranked: None,
                pager: PagerConfig::default(),
                stats: Vec::new(),
            },
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn default_sort(&self) -> &'static str {
        self.default_sort
    }

    pub fn pager(&self) -> PagerConfig {
        self.pager
    }

    pub fn stats(&self) -> &[StatSpec] {
        &self.stats
    }

    /// The ranked ordering selected by `key`, if any.
    pub fn ranked_for(&self, key: &str) -> Option<&RankedSort> {
        self.ranked.as_ref().filter(|r| r.answers_to(key))
    }

    /// Whether `key` may be used as a plain sort key.
    pub fn is_sortable(&self, key: &str) -> bool {
        key == self.default_sort || self.sortable.contains(&key)
    }

    /// Check the declaration for paths the SQL compiler cannot address.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_safe_segment(self.collection) {
            errors.push(format!("invalid collection name: '{}'", self.collection));
        }

        let mut paths: Vec<&str> = self.fields.iter().map(|f| f.path).collect();
        paths.extend(self.sortable.iter().copied());
        paths.push(self.default_sort);
        if let Some(ref ranked) = self.ranked {
            paths.push(ranked.field);
            paths.push(ranked.tiebreak);
        }
        paths.extend(self.stats.iter().map(|s| s.field()));

        for path in paths {
            if !is_safe_path(path) {
                errors.push(format!("invalid field path: '{path}'"));
            }
        }

        if self.pager.default_limit == 0 || self.pager.max_limit == 0 {
            errors.push("pager limits must be positive".to_string());
        }

        let date_ranges = self
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::DateRange)
            .count();
        if date_ranges > 1 {
            errors.push(format!(
                "{date_ranges} date-range fields declared, at most 1 allowed"
            ));
        }

        errors
    }
}

/// Consuming builder for [`ResourceSchema`].
pub struct ResourceSchemaBuilder {
    schema: ResourceSchema,
}

impl ResourceSchemaBuilder {
    fn field(
        mut self,
        param: &'static str,
        path: &'static str,
        kind: FieldKind,
        list: bool,
    ) -> Self {
        self.schema.fields.push(FieldDecl {
            param,
            path,
            kind,
            list,
        });
        self
    }

    /// `param=value` constrains `path` to equality.
    pub fn exact(self, param: &'static str, path: &'static str) -> Self {
        self.field(param, path, FieldKind::Exact, false)
    }

    /// `param=a,b` constrains `path` to membership.
    pub fn set(self, param: &'static str, path: &'static str) -> Self {
        self.field(param, path, FieldKind::Set, false)
    }

    /// `param=true|false` constrains boolean `path`.
    pub fn boolean(self, param: &'static str, path: &'static str) -> Self {
        self.field(param, path, FieldKind::Boolean, false)
    }

    /// Include string field `path` in text search.
    pub fn search(self, path: &'static str) -> Self {
        self.field(SEARCH_PARAM, path, FieldKind::TextSearch, false)
    }

    /// Include string-list field `path` (tags) in text search.
    pub fn search_list(self, path: &'static str) -> Self {
        self.field(SEARCH_PARAM, path, FieldKind::TextSearch, true)
    }

    /// Bound timestamp field `path` with `dateFrom` / `dateTo`.
    pub fn date_range(self, path: &'static str) -> Self {
        self.field(DATE_FROM_PARAM, path, FieldKind::DateRange, false)
    }

    pub fn sortable(mut self, keys: &[&'static str]) -> Self {
        self.schema.sortable.extend_from_slice(keys);
        self
    }

    pub fn default_sort(mut self, key: &'static str) -> Self {
        self.schema.default_sort = key;
        self
    }

    pub fn ranked(mut self, ranked: RankedSort) -> Self {
        self.schema.ranked = Some(ranked);
        self
    }

    pub fn pager(mut self, default_limit: u32, max_limit: u32) -> Self {
        self.schema.pager = PagerConfig {
            default_limit,
            max_limit,
        };
        self
    }

    pub fn stat(mut self, stat: StatSpec) -> Self {
        self.schema.stats.push(stat);
        self
    }

    pub fn build(self) -> ResourceSchema {
        self.schema
    }
}

/// A path segment usable inside a JSONB accessor.
pub(super) fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

/// A dotted path whose every segment is safe.
pub(super) fn is_safe_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_safe_segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResourceSchema {
        ResourceSchema::builder("hotline")
            .exact("department", "department")
            .set("category", "category")
            .boolean("isActive", "isActive")
            .search("name")
            .search_list("tags")
            .sortable(&["name", "createdAt"])
            .ranked(RankedSort::new("priority", "name").alias("urgency"))
            .pager(50, 100)
            .build()
    }

    #[test]
    fn builder_records_declarations() {
        let schema = sample();

        assert_eq!(schema.collection(), "hotline");
        assert_eq!(schema.fields().len(), 5);
        assert_eq!(schema.fields()[4].kind, FieldKind::TextSearch);
        assert!(schema.fields()[4].list);
        assert_eq!(schema.pager().default_limit, 50);
        assert_eq!(schema.default_sort(), "createdAt");
    }

    #[test]
    fn ranked_answers_to_field_and_alias() {
        let schema = sample();

        assert!(schema.ranked_for("priority").is_some());
        assert!(schema.ranked_for("urgency").is_some());
        assert!(schema.ranked_for("name").is_none());
    }

    #[test]
    fn sortable_includes_default() {
        let schema = sample();

        assert!(schema.is_sortable("createdAt"));
        assert!(schema.is_sortable("name"));
        assert!(!schema.is_sortable("password"));
    }

    #[test]
    fn validate_accepts_dotted_paths() {
        let schema = ResourceSchema::builder("appointment")
            .date_range("dateTime.scheduled")
            .sortable(&["dateTime.scheduled"])
            .build();

        assert!(schema.validate().is_empty());
    }

    #[test]
    fn validate_rejects_injection_paths() {
        let schema = ResourceSchema::builder("appointment")
            .exact("status", "status'; DROP TABLE appointment; --")
            .build();

        let errors = schema.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("invalid field path"));
    }

    #[test]
    fn validate_rejects_two_date_ranges() {
        let schema = ResourceSchema::builder("incident_report")
            .date_range("createdAt")
            .date_range("dateTime.occurred")
            .build();

        assert!(schema.validate().iter().any(|e| e.contains("date-range")));
    }

    #[test]
    fn safe_segment_rules() {
        assert!(is_safe_segment("createdAt"));
        assert!(is_safe_segment("_id"));
        assert!(!is_safe_segment("1st"));
        assert!(!is_safe_segment("a-b"));
        assert!(!is_safe_segment(""));
        assert!(!is_safe_path("a..b"));
    }
}
