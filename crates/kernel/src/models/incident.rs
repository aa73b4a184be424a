//! Incident report listing declaration.
//!
//! Incidents carry a severity rather than a priority, but clients sort
//! them with `sortBy=priority` as well; both keys select the rank order.

use std::sync::LazyLock;

use crate::listing::aggregate::DEFAULT_TOP_N;
use crate::listing::{RankedSort, ResourceSchema, StatSpec};

/// Collection holding incident report documents.
pub const COLLECTION: &str = "incident_report";

/// Statuses counted as handled by `resolutionRate`.
pub const RESOLVED_STATUSES: &[&str] = &["Resolved", "Closed"];

pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder(COLLECTION)
        .exact("type", "type")
        .set("status", "status")
        .set("severity", "severity")
        .boolean("isUrgent", "isUrgent")
        .search("title")
        .search("description")
        .search("location")
        .search("reporterName")
        .search_list("tags")
        .date_range("dateTime.occurred")
        .sortable(&["dateTime.occurred", "title", "status"])
        .ranked(RankedSort::new("severity", "title").alias("priority"))
        .pager(25, 100)
        .stat(StatSpec::breakdown("byStatus", "status"))
        .stat(StatSpec::breakdown("bySeverity", "severity"))
        .stat(StatSpec::top("topTypes", "type", DEFAULT_TOP_N))
        .stat(StatSpec::trend("trend", "createdAt"))
        .stat(StatSpec::rate(
            "resolutionRate",
            "status",
            RESOLVED_STATUSES,
        ))
        .build()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_is_valid() {
        assert!(SCHEMA.validate().is_empty(), "{:?}", SCHEMA.validate());
    }

    #[test]
    fn priority_alias_orders_by_severity() {
        let ranked = SCHEMA.ranked_for("priority").unwrap();
        assert_eq!(ranked.field, "severity");
        assert!(SCHEMA.ranked_for("severity").is_some());
    }
}
