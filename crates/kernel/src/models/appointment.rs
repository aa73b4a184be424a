//! Appointment listing declaration.

use std::sync::LazyLock;

use crate::listing::{RankedSort, ResourceSchema, StatSpec};

/// Collection holding appointment documents.
pub const COLLECTION: &str = "appointment";

pub const COMPLETED_STATUSES: &[&str] = &["Completed"];

pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder(COLLECTION)
        .exact("department", "department")
        .set("status", "status")
        .set("type", "type")
        .set("priority", "priority")
        .boolean("isUrgent", "isUrgent")
        .search("fullName")
        .search("purpose")
        .search("email")
        .search("contactNumber")
        .search("referenceNumber")
        .date_range("dateTime.scheduled")
        .sortable(&["dateTime.scheduled", "fullName", "status"])
        .ranked(RankedSort::new("priority", "fullName"))
        .pager(25, 100)
        .stat(StatSpec::breakdown("byStatus", "status"))
        .stat(StatSpec::breakdown("byType", "type"))
        .stat(StatSpec::breakdown("byDepartment", "department"))
        .stat(StatSpec::trend("trend", "createdAt"))
        .stat(StatSpec::rate(
            "completionRate",
            "status",
            COMPLETED_STATUSES,
        ))
        .build()
});
