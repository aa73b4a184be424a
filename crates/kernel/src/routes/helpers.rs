//! Shared route helpers for list endpoints.

use std::collections::HashMap;

use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::listing::{FilterSpec, ListingParams, ListingResult, Pagination, Statistics};

/// Query string of a list request, as received.
pub type RawQuery = Result<Query<HashMap<String, String>>, QueryRejection>;

/// Success envelope of every list endpoint.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub success: bool,
    pub data: Vec<Value>,
    pub pagination: Pagination,
    pub statistics: Statistics,
    pub filters: FilterSpec,
}

impl From<ListingResult> for ListingResponse {
    fn from(result: ListingResult) -> Self {
        Self {
            success: true,
            data: result.data,
            pagination: result.pagination,
            statistics: result.statistics,
            filters: result.filters,
        }
    }
}

/// Unpack the query string; only a malformed query string is rejected.
pub fn listing_params(query: RawQuery) -> AppResult<ListingParams> {
    let Query(map) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(ListingParams::from(map))
}

/// Render a listing result.
pub fn respond(result: ListingResult) -> Json<ListingResponse> {
    Json(ListingResponse::from(result))
}
