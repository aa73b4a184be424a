//! Document request listing declaration.
//!
//! Requests for barangay clearances, certificates of residency and the
//! like. There is no priority field, so no ranked ordering.

use std::sync::LazyLock;

use crate::listing::aggregate::DEFAULT_TOP_N;
use crate::listing::{ResourceSchema, StatSpec};

/// Collection holding document request documents.
pub const COLLECTION: &str = "document_request";

/// Statuses counted as fulfilled by `completionRate`.
pub const FULFILLED_STATUSES: &[&str] = &["Released", "Completed"];

pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder(COLLECTION)
        .exact("documentType", "documentType")
        .set("status", "status")
        .boolean("isUrgent", "isUrgent")
        .search("fullName")
        .search("purpose")
        .search("referenceNumber")
        .search("documentType")
        .date_range("createdAt")
        .sortable(&["fullName", "status", "documentType"])
        .pager(25, 100)
        .stat(StatSpec::breakdown("byStatus", "status"))
        .stat(StatSpec::top(
            "topDocumentTypes",
            "documentType",
            DEFAULT_TOP_N,
        ))
        .stat(StatSpec::trend("trend", "createdAt"))
        .stat(StatSpec::rate(
            "completionRate",
            "status",
            FULFILLED_STATUSES,
        ))
        .build()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_is_valid() {
        assert!(SCHEMA.validate().is_empty(), "{:?}", SCHEMA.validate());
        assert!(SCHEMA.ranked_for("priority").is_none());
    }
}
