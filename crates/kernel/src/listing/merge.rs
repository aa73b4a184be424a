//! Identity merger.
//!
//! The resident directory spans two collections with different shapes.
//! Each collection is a [`ResidentSource`] that applies its own
//! source-side filters and projects into [`ResidentView`]; the
//! [`ResidentDirectory`] fetches every source concurrently, concatenates
//! the views and runs filter, statistics, sort and pager over the union
//! in memory.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, FixedOffset, NaiveDate, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::aggregate::report;
use super::filter::compile;
use super::pager::PageSpec;
use super::schema::ResourceSchema;
use super::sort;
use super::types::{Constraint, FilterSpec, ListingParams, ListingResult, QueryContext};

/// Parameter selecting a single source.
pub const KIND_PARAM: &str = "kind";

/// Fields whose values are display-cased before comparing.
const DISPLAY_CASED_FIELDS: &[&str] = &["gender", "civilStatus"];

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Which collection a view was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKind {
    Resident,
    Staff,
}

impl ResidentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResidentKind::Resident => "resident",
            ResidentKind::Staff => "staff",
        }
    }
}

impl fmt::Display for ResidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized read-only projection of a citizen or a staff record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub kind: ResidentKind,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub civil_status: Option<String>,
    /// `YYYY-MM-DD` when the whole birth date is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_date: Option<String>,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Join non-empty name parts with single spaces.
pub fn join_name(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case every word: `"legally SEPARATED"` → `"Legally Separated"`.
/// Blank input yields `None`.
pub fn display_case(raw: &str) -> Option<String> {
    let words: Vec<String> = raw
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Birth date stored as independent, possibly empty, parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartialBirthDate {
    #[serde(deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub month: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub day: Option<String>,
}

impl PartialBirthDate {
    pub fn year(&self) -> Option<i32> {
        self.year
            .as_deref()
            .and_then(|y| y.trim().parse::<i32>().ok())
            .filter(|y| *y > 0)
    }

    /// Month number; accepts `1`..`12` or an English month name
    /// (full or three-letter).
    pub fn month(&self) -> Option<u32> {
        let raw = self.month.as_deref()?.trim();
        if let Ok(n) = raw.parse::<u32>() {
            return (1..=12).contains(&n).then_some(n);
        }

        let lower = raw.to_lowercase();
        if lower.len() < 3 {
            return None;
        }
        MONTH_NAMES
            .iter()
            .position(|name| *name == lower || (lower.len() == 3 && name.starts_with(&lower)))
            .map(|i| i as u32 + 1)
    }

    pub fn day(&self) -> Option<u32> {
        self.day
            .as_deref()
            .and_then(|d| d.trim().parse::<u32>().ok())
            .filter(|d| (1..=31).contains(d))
    }

    /// Whole date, when every part is present and valid.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year()?, self.month()?, self.day()?)
    }

    /// Completed years on `today`. Unknown without a usable year; missing
    /// month or day only drop the birthday adjustment they would feed.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let year = self.year()?;
        let mut age = today.year() - year;

        if let Some(month) = self.month() {
            let before_birthday = match self.day() {
                Some(day) => (today.month(), today.day()) < (month, day),
                None => today.month() < month,
            };
            if before_birthday {
                age -= 1;
            }
        }

        u32::try_from(age).ok()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// One collection feeding the resident directory.
#[async_trait]
pub trait ResidentSource: Send + Sync {
    fn kind(&self) -> ResidentKind;

    /// Fetch records matching this source's own filters, projected.
    async fn fetch(
        &self,
        params: &ListingParams,
        ctx: &QueryContext,
    ) -> Result<Vec<ResidentView>>;
}

/// `ageMin` / `ageMax` bounds; unparsable bounds are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl AgeRange {
    pub fn from_params(params: &ListingParams) -> Self {
        Self {
            min: parse_age(params, "ageMin"),
            max: parse_age(params, "ageMax"),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// A record of unknown age never satisfies a bounded range.
    pub fn admits(&self, age: Option<u32>) -> bool {
        if !self.is_bounded() {
            return true;
        }
        age.is_some_and(|age| {
            self.min.is_none_or(|min| age >= min) && self.max.is_none_or(|max| age <= max)
        })
    }
}

fn parse_age(params: &ListingParams, name: &str) -> Option<u32> {
    let raw = params.get(name)?;
    let parsed = raw.parse::<u32>().ok();
    if parsed.is_none() {
        tracing::debug!(param = name, value = raw, "ignoring unparsable age bound");
    }
    parsed
}

/// The merged resident directory.
pub struct ResidentDirectory {
    schema: ResourceSchema,
    sources: Vec<Arc<dyn ResidentSource>>,
    offset: FixedOffset,
}

impl ResidentDirectory {
    /// Sources are concatenated in the order given.
    pub fn new(
        schema: ResourceSchema,
        sources: Vec<Arc<dyn ResidentSource>>,
        offset: FixedOffset,
    ) -> Arc<Self> {
        Arc::new(Self {
            schema,
            sources,
            offset,
        })
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub async fn list(&self, params: &ListingParams) -> Result<ListingResult> {
        let ctx = QueryContext::new(Utc::now(), self.offset);
        self.list_at(params, &ctx).await
    }

    pub async fn list_at(
        &self,
        params: &ListingParams,
        ctx: &QueryContext,
    ) -> Result<ListingResult> {
        let filter = normalize(compile(&self.schema, params, ctx));
        let ages = AgeRange::from_params(params);

        let kind = params.constraint_value(KIND_PARAM);
        let sources: Vec<&Arc<dyn ResidentSource>> = self
            .sources
            .iter()
            .filter(|s| kind.is_none_or(|k| k == s.kind().as_str()))
            .collect();

        tracing::debug!(
            sources = sources.len(),
            constraints = filter.constraints().len(),
            age_bounded = ages.is_bounded(),
            "merging resident sources"
        );

        let fetched = try_join_all(sources.iter().map(|s| s.fetch(params, ctx))).await?;

        let mut merged = Vec::new();
        for view in fetched.into_iter().flatten() {
            if !ages.admits(view.age) {
                continue;
            }
            let doc = serde_json::to_value(&view)
                .context(format!("failed to encode resident '{}'", view.id))?;
            if filter.matches(&doc) {
                merged.push(doc);
            }
        }

        let statistics = report(&merged, self.schema.stats(), ctx);

        let sort = sort::resolve(params.get("sortBy"), params.get("sortOrder"), &self.schema);
        sort.sort(&mut merged);

        let page = PageSpec::resolve(params.get("page"), params.get("limit"), self.schema.pager());
        let total_items = merged.len() as u64;
        let data = page.slice(merged);

        Ok(ListingResult::new(
            data,
            total_items,
            &page,
            statistics,
            filter,
        ))
    }
}

/// Display-case equality values so they compare against the normalized view.
fn normalize(filter: FilterSpec) -> FilterSpec {
    let constraints = filter
        .constraints()
        .iter()
        .cloned()
        .map(|constraint| match constraint {
            Constraint::Equals { field, value }
                if DISPLAY_CASED_FIELDS.contains(&field.as_str()) =>
            {
                let value = display_case(&value).unwrap_or(value);
                Constraint::Equals { field, value }
            }
            other => other,
        })
        .collect();
    FilterSpec::new(constraints)
}
