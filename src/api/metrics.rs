//! `GET /metrics` (§4.9): Prometheus text exposition of the middleware
//! counters registered in [`crate::metrics`].

use axum::routing::get;
use axum::Router;

use crate::AppState;

/// Create the metrics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_text))
}

async fn metrics_text() -> String {
    crate::metrics::render()
}
