//! Barangay test utilities.
//!
//! Fixture builders for the JSON documents stored in each collection,
//! and assertion helpers for list responses.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue, json};
use uuid::Uuid;

/// Create a test record with an id, a title and a creation timestamp.
pub fn test_record(title: &str) -> TestRecord {
    TestRecord {
        id: Uuid::now_v7(),
        doc: Map::new(),
    }
    .with("title", json!(title))
    .created_at(Utc::now())
}

/// Create a test citizen with a verified account and no birth date.
pub fn test_citizen(first_name: &str, last_name: &str) -> TestRecord {
    TestRecord {
        id: Uuid::now_v7(),
        doc: Map::new(),
    }
    .with("firstName", json!(first_name))
    .with("lastName", json!(last_name))
    .with("isVerified", json!(true))
    .with("birthDate", json!({"year": "", "month": "", "day": ""}))
    .created_at(Utc::now())
}

/// Create a test staff member with an active account.
pub fn test_staff(first_name: &str, last_name: &str, position: &str) -> TestRecord {
    TestRecord {
        id: Uuid::now_v7(),
        doc: Map::new(),
    }
    .with("firstName", json!(first_name))
    .with("lastName", json!(last_name))
    .with("position", json!(position))
    .with("isActive", json!(true))
    .created_at(Utc::now())
}

/// A document builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub id: Uuid,
    pub doc: Map<String, JsonValue>,
}

impl TestRecord {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Set a field; dots in `path` create nested objects.
    pub fn with(mut self, path: &str, value: JsonValue) -> Self {
        let segments: Vec<&str> = path.split('.').collect();
        insert_path(&mut self.doc, &segments, value);
        self
    }

    /// Set a string field.
    pub fn with_str(self, path: &str, value: &str) -> Self {
        self.with(path, json!(value))
    }

    /// Set a timestamp field as RFC 3339.
    pub fn with_time(self, path: &str, at: DateTime<Utc>) -> Self {
        self.with(path, json!(at.to_rfc3339_opts(SecondsFormat::Millis, true)))
    }

    /// Set `createdAt`.
    pub fn created_at(self, at: DateTime<Utc>) -> Self {
        self.with_time("createdAt", at)
    }

    /// Set `tags`.
    pub fn with_tags(self, tags: &[&str]) -> Self {
        self.with("tags", json!(tags))
    }

    /// Set the partial birth date parts (any may be empty).
    pub fn born(self, year: &str, month: &str, day: &str) -> Self {
        self.with(
            "birthDate",
            json!({"year": year, "month": month, "day": day}),
        )
    }

    /// The stored document body.
    pub fn doc(&self) -> JsonValue {
        JsonValue::Object(self.doc.clone())
    }

    /// The document as the store returns it, with `_id`.
    pub fn into_doc(self) -> JsonValue {
        let mut doc = self.doc;
        doc.insert("_id".to_string(), json!(self.id.to_string()));
        JsonValue::Object(doc)
    }
}

fn insert_path(map: &mut Map<String, JsonValue>, segments: &[&str], value: JsonValue) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = map
                .entry((*first).to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(next) = entry {
                insert_path(next, rest, value);
            }
        }
    }
}

/// Assertion helpers for list responses.
pub mod assert {
    use serde_json::Value;

    /// Assert the success envelope shape.
    pub fn is_listing(body: &Value) {
        assert_eq!(
            body["success"], true,
            "Expected success envelope, got: {body}"
        );
        for key in ["data", "pagination", "statistics", "filters"] {
            assert!(body.get(key).is_some(), "Expected key '{key}', got: {body}");
        }
    }

    /// Assert that `field` of the returned records equals `expected`, in order.
    pub fn field_order(records: &[Value], field: &str, expected: &[&str]) {
        let actual: Vec<&str> = records
            .iter()
            .map(|r| r[field].as_str().unwrap_or_default())
            .collect();
        assert_eq!(actual, expected, "Unexpected order of '{field}'");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_builder_nests_paths() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let record = test_record("Flood at Purok 2")
            .with_str("status", "Pending")
            .with_time("dateTime.occurred", at)
            .with_tags(&["flood"]);
        let doc = record.doc();

        assert_eq!(doc["title"], "Flood at Purok 2");
        assert_eq!(doc["dateTime"]["occurred"], "2024-01-02T03:04:05.000Z");
        assert_eq!(doc["tags"][0], "flood");
        assert!(doc.get("_id").is_none());
    }

    #[test]
    fn into_doc_adds_id() {
        let id = Uuid::now_v7();
        let doc = test_record("x").with_id(id).into_doc();
        assert_eq!(doc["_id"], id.to_string());
    }

    #[test]
    fn citizen_defaults() {
        let doc = test_citizen("Maria", "Clara").born("1990", "May", "").doc();
        assert_eq!(doc["isVerified"], true);
        assert_eq!(doc["birthDate"]["month"], "May");
        assert_eq!(doc["birthDate"]["day"], "");
    }

    #[test]
    fn staff_defaults() {
        let doc = test_staff("Jose", "Rizal", "Kagawad").doc();
        assert_eq!(doc["position"], "Kagawad");
        assert_eq!(doc["isActive"], true);
    }

    #[test]
    fn assertions() {
        let records = vec![json!({"name": "a"}), json!({"name": "b"})];
        assert::field_order(&records, "name", &["a", "b"]);
        assert::is_listing(&json!({
            "success": true, "data": [], "pagination": {}, "statistics": {}, "filters": []
        }));
    }
}
