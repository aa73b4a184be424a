//! Merged resident directory declaration.
//!
//! Applied to [`ResidentView`](crate::listing::ResidentView) documents
//! after the citizen and staff sources are merged. Source-side filters
//! (`purok`, `isVerified`, `department`, `isActive`) are declared by the
//! sources themselves.

use std::sync::LazyLock;

use crate::listing::{KIND_PARAM, ResourceSchema, StatSpec};

pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder("resident")
        .exact("gender", "gender")
        .exact("civilStatus", "civilStatus")
        .exact(KIND_PARAM, "kind")
        .search("firstName")
        .search("middleName")
        .search("lastName")
        .search("email")
        .search("contactNumber")
        .search("address")
        .search("position")
        .date_range("registeredDate")
        .sortable(&["lastName", "firstName", "birthdate", "age"])
        .default_sort("registeredDate")
        .pager(20, 100)
        .stat(StatSpec::breakdown("byKind", "kind"))
        .stat(StatSpec::breakdown("byGender", "gender"))
        .stat(StatSpec::breakdown("byCivilStatus", "civilStatus"))
        .stat(StatSpec::rate("verificationRate", "isVerified", &["true"]))
        .build()
});
