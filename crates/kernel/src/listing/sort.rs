//! Sort resolver.
//!
//! Maps `sortBy` / `sortOrder` onto a [`SortSpec`]. The enumerated
//! priority field orders through [`Priority`] ranks, never lexically
//! ("Critical" < "High" as strings would misplace it).

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use super::filter::lookup;
use super::schema::ResourceSchema;

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Closed priority vocabulary, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Every priority in rank order.
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Rank given to values outside the vocabulary; sorts after `Low`.
    pub const UNRANKED: u8 = 4;

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Rank of a stored value.
    pub fn rank_of(value: Option<&str>) -> u8 {
        value
            .and_then(|v| v.parse::<Priority>().ok())
            .map_or(Self::UNRANKED, Priority::rank)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown priority: {s}"))
    }
}

/// Resolved ordering for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    /// Document path of the primary key.
    pub field: String,

    pub direction: SortDirection,

    /// Set when `field` orders by priority rank; holds the ascending
    /// secondary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<String>,
}

impl SortSpec {
    pub fn is_ranked(&self) -> bool {
        self.tiebreak.is_some()
    }

    /// Order two documents.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let (pa, pb) = (lookup(a, &self.field), lookup(b, &self.field));

        match self.tiebreak {
            Some(ref tiebreak) => {
                let ra = Priority::rank_of(pa.and_then(Value::as_str));
                let rb = Priority::rank_of(pb.and_then(Value::as_str));
                self.direction
                    .apply(ra.cmp(&rb))
                    .then_with(|| compare_values(lookup(a, tiebreak), lookup(b, tiebreak)))
            }
            None => self.direction.apply(compare_values(pa, pb)),
        }
    }

    /// Stable in-place sort; equal keys keep their incoming order.
    pub fn sort(&self, records: &mut [Value]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

/// Resolve request parameters into a sort for `schema`.
///
/// Unknown keys fall back to the schema's default sort. Plain keys sort
/// descending unless `sortOrder` is exactly `asc`; the ranked key sorts
/// most urgent first unless `sortOrder` is exactly `desc`, which reverses
/// the whole rank.
pub fn resolve(
    sort_by: Option<&str>,
    sort_order: Option<&str>,
    schema: &ResourceSchema,
) -> SortSpec {
    if let Some(key) = sort_by
        && let Some(ranked) = schema.ranked_for(key)
    {
        let direction = if sort_order == Some("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        return SortSpec {
            field: ranked.field.to_string(),
            direction,
            tiebreak: Some(ranked.tiebreak.to_string()),
        };
    }

    let field = match sort_by {
        Some(key) if schema.is_sortable(key) => key,
        Some(key) => {
            tracing::debug!(sort_by = key, "unknown sort key, using default");
            schema.default_sort()
        }
        None => schema.default_sort(),
    };

    let direction = if sort_order == Some("asc") {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };

    SortSpec {
        field: field.to_string(),
        direction,
        tiebreak: None,
    }
}

/// Total order over optional JSON values; absent sorts first, then by
/// type (bool < number < string), then by value.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
