//! List endpoints of the single-collection resources.
//!
//! Each route runs the shared listing pipeline with its resource's
//! declaration.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::listing::ResourceSchema;
use crate::models::{announcement, appointment, document_request, hotline, incident};
use crate::routes::helpers::{ListingResponse, RawQuery, listing_params, respond};
use crate::state::AppState;

/// Create the listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/announcements", get(list_announcements))
        .route("/api/hotlines", get(list_hotlines))
        .route("/api/incidents", get(list_incidents))
        .route("/api/appointments", get(list_appointments))
        .route("/api/document-requests", get(list_document_requests))
}

async fn run(
    state: &AppState,
    schema: &ResourceSchema,
    query: RawQuery,
) -> AppResult<Json<ListingResponse>> {
    let params = listing_params(query)?;
    let result = state.listings().list(schema, &params).await?;
    Ok(respond(result))
}

async fn list_announcements(
    State(state): State<AppState>,
    query: RawQuery,
) -> AppResult<Json<ListingResponse>> {
    run(&state, &announcement::SCHEMA, query).await
}

async fn list_hotlines(
    State(state): State<AppState>,
    query: RawQuery,
) -> AppResult<Json<ListingResponse>> {
    run(&state, &hotline::SCHEMA, query).await
}

async fn list_incidents(
    State(state): State<AppState>,
    query: RawQuery,
) -> AppResult<Json<ListingResponse>> {
    run(&state, &incident::SCHEMA, query).await
}

async fn list_appointments(
    State(state): State<AppState>,
    query: RawQuery,
) -> AppResult<Json<ListingResponse>> {
    run(&state, &appointment::SCHEMA, query).await
}

async fn list_document_requests(
    State(state): State<AppState>,
    query: RawQuery,
) -> AppResult<Json<ListingResponse>> {
    run(&state, &document_request::SCHEMA, query).await
}
