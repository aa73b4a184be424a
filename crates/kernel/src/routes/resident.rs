//! Resident directory endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::routes::helpers::{ListingResponse, RawQuery, listing_params, respond};
use crate::state::AppState;

/// Create the resident directory router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/residents", get(list_residents))
}

async fn list_residents(
    State(state): State<AppState>,
    query: RawQuery,
) -> AppResult<Json<ListingResponse>> {
    let params = listing_params(query)?;
    let result = state.residents().list(&params).await?;
    Ok(respond(result))
}
