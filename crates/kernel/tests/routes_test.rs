#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Route-level tests without a database.
//!
//! The router's pool points at a closed port, so every store-backed route
//! exercises the failure path.

mod common;

use common::{StaticSource, get_json, test_router};

#[tokio::test]
async fn store_failure_is_a_vague_500() {
    let router = test_router(vec![StaticSource::citizens(Vec::new())]);

    for uri in [
        "/api/announcements",
        "/api/hotlines?category=Police",
        "/api/incidents?status=Pending&sortBy=priority",
        "/api/appointments?page=2",
        "/api/document-requests",
    ] {
        let (status, body) = get_json(&router, uri).await;
        assert_eq!(status, 500, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert_eq!(body["message"], "internal server error", "{uri}");
    }
}

#[tokio::test]
async fn health_reports_unreachable_postgres() {
    let router = test_router(Vec::new());

    let (status, body) = get_json(&router, "/health").await;

    assert_eq!(status, 503);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["postgres"], false);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let router = test_router(Vec::new());

    let (status, body) = get_json(&router, "/api/nothing-here").await;

    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "not found");
}

#[tokio::test]
async fn empty_directory_lists_nothing() {
    let router = test_router(Vec::new());

    let (status, body) = get_json(&router, "/api/residents?page=3&limit=abc").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(body["pagination"]["totalItems"], 0);
    assert_eq!(body["statistics"]["verificationRate"], 0);
}
