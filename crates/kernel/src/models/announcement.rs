//! Announcement listing declaration.
//!
//! Announcements are posted by barangay staff and shown on the public
//! board; urgent ones are pinned by the client.

use std::sync::LazyLock;

use crate::listing::{RankedSort, ResourceSchema, StatSpec};

/// Collection holding announcement documents.
pub const COLLECTION: &str = "announcement";

pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder(COLLECTION)
        .set("category", "category")
        .set("priority", "priority")
        .set("status", "status")
        .boolean("isActive", "isActive")
        .boolean("isUrgent", "isUrgent")
        .search("title")
        .search("content")
        .search("author")
        .search_list("tags")
        .date_range("publishDate")
        .sortable(&["publishDate", "title", "category"])
        .ranked(RankedSort::new("priority", "title"))
        .pager(20, 100)
        .stat(StatSpec::breakdown("byCategory", "category"))
        .stat(StatSpec::breakdown("byStatus", "status"))
        .stat(StatSpec::breakdown("byPriority", "priority"))
        .build()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_is_valid() {
        assert!(SCHEMA.validate().is_empty(), "{:?}", SCHEMA.validate());
        assert_eq!(SCHEMA.pager().default_limit, 20);
        assert!(SCHEMA.ranked_for("priority").is_some());
    }
}
