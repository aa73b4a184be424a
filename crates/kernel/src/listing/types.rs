//! Listing layer types.
//!
//! Provides type definitions shared by the listing pipeline:
//! - ListingParams: raw query-string parameters
//! - Constraint / FilterSpec: the compiled predicate
//! - QueryContext: request-time values ("now", local offset)
//! - Pagination / ListingResult: what a list endpoint returns

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;

use super::aggregate::Statistics;
use super::pager::PageSpec;

/// Sentinel parameter value meaning "no constraint".
pub const ALL_SENTINEL: &str = "All";

/// Raw query-string parameters of one list request.
#[derive(Debug, Clone, Default)]
pub struct ListingParams(HashMap<String, String>);

impl ListingParams {
    /// Get a parameter, trimmed; empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = self.0.get(name)?.trim();
        (!value.is_empty()).then_some(value)
    }

    /// Get a parameter that constrains a field: absent, empty and `All`
    /// all mean "unconstrained".
    pub fn constraint_value(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| *v != ALL_SENTINEL)
    }
}

impl From<HashMap<String, String>> for ListingParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ListingParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Request-time values the pipeline resolves against.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext {
    /// Wall clock at request time.
    pub now: DateTime<Utc>,

    /// Local offset used for day boundaries and trend buckets.
    pub offset: FixedOffset,
}

impl QueryContext {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }
}

/// A field eligible for text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchField {
    /// Document path (dots for nesting).
    pub path: String,

    /// True when the document value is a list of strings (e.g. tags).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub list: bool,
}

/// One compiled constraint over a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Constraint {
    /// Field equals value.
    Equals { field: String, value: String },
    /// Field is one of values.
    OneOf { field: String, values: Vec<String> },
    /// Case-insensitive substring across fields, OR-combined.
    Search {
        pattern: String,
        fields: Vec<SearchField>,
    },
    /// Timestamp field within inclusive bounds.
    DateRange {
        field: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        to: Option<DateTime<Utc>>,
    },
    /// Boolean field equals value.
    Boolean { field: String, value: bool },
}

/// Compiled predicate: every constraint must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterSpec {
    constraints: Vec<Constraint>,
}

impl FilterSpec {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self { constraints }
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Pager block of the response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed).
    pub current: u32,

    /// Total number of pages.
    pub total: u32,

    /// Number of records on this page.
    pub count: usize,

    /// Count of the whole filtered set.
    pub total_items: u64,

    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Create the pager block from the resolved page and total count.
    pub fn new(page: &PageSpec, count: usize, total_items: u64) -> Self {
        let pages = total_items.div_ceil(u64::from(page.per_page));
        let total = u32::try_from(pages).unwrap_or(u32::MAX);

        Self {
            current: page.page,
            total,
            count,
            total_items,
            has_next: page.page < total,
            has_prev: page.page > 1,
        }
    }
}

/// Result of one list request.
#[derive(Debug, Clone, Serialize)]
pub struct ListingResult {
    /// Ordered page of records.
    pub data: Vec<Value>,

    pub pagination: Pagination,

    pub statistics: Statistics,

    /// The constraints that produced `data`.
    pub filters: FilterSpec,
}

impl ListingResult {
    pub fn new(
        data: Vec<Value>,
        total_items: u64,
        page: &PageSpec,
        statistics: Statistics,
        filters: FilterSpec,
    ) -> Self {
        let pagination = Pagination::new(page, data.len(), total_items);
        Self {
            data,
            pagination,
            statistics,
            filters,
        }
    }
}
