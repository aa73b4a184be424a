//! Listing query layer.
//!
//! This module provides:
//! - ResourceSchema: per-resource declaration of filters, sorts and statistics
//! - Filter compiler, sort resolver and pager
//! - ListingQueryBuilder: SeaQuery-based SQL generation over JSONB documents
//! - ListingService: concurrent page, count and statistics execution
//! - ResidentDirectory: in-memory merge of several resident sources

pub mod aggregate;
pub mod filter;
mod merge;
pub mod pager;
mod query_builder;
mod schema;
mod service;
pub mod sort;
mod types;

pub use aggregate::{GroupCount, StatSpec, StatValue, Statistics, TrendBucket};
pub use filter::compile;
pub use merge::{
    AgeRange, KIND_PARAM, PartialBirthDate, ResidentDirectory, ResidentKind, ResidentSource,
    ResidentView, display_case, join_name,
};
pub use pager::PageSpec;
pub use query_builder::ListingQueryBuilder;
pub use schema::{FieldKind, PagerConfig, RankedSort, ResourceSchema, ResourceSchemaBuilder};
pub use service::{ListingService, fetch_documents};
pub use sort::{Priority, SortDirection, SortSpec};
pub use types::{
    ALL_SENTINEL, Constraint, FilterSpec, ListingParams, ListingResult, Pagination, QueryContext,
    SearchField,
};
