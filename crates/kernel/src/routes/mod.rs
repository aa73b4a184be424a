//! HTTP route handlers.

pub mod health;
pub mod helpers;
pub mod listing;
pub mod resident;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Every route of the service, without middleware layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(listing::router())
        .merge(resident::router())
        .fallback(|| async { AppError::NotFound })
        .with_state(state)
}
