//! HTTP surface beyond the A2A protocol itself (§4.9): health, metrics,
//! and the error taxonomy.

pub mod errors;
pub mod health;
pub mod metrics;

use axum::Router;

use crate::AppState;

/// Create the API router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
        .merge(errors::router())
}
