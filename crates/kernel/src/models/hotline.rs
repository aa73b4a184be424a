//! Emergency hotline listing declaration.

use std::sync::LazyLock;

use crate::listing::{RankedSort, ResourceSchema, StatSpec};

/// Collection holding hotline documents.
pub const COLLECTION: &str = "hotline";

pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder(COLLECTION)
        .exact("department", "department")
        .set("category", "category")
        .set("priority", "priority")
        .boolean("isActive", "isActive")
        .boolean("isEmergency", "isEmergency")
        .search("name")
        .search("number")
        .search("department")
        .search("description")
        .search_list("tags")
        .date_range("createdAt")
        .sortable(&["name", "category", "department"])
        .ranked(RankedSort::new("priority", "name"))
        .pager(50, 100)
        .stat(StatSpec::breakdown("byCategory", "category"))
        .stat(StatSpec::breakdown("byDepartment", "department"))
        .stat(StatSpec::breakdown("byPriority", "priority"))
        .build()
});
