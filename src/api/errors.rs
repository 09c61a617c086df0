//! `GET /errors` (§4.9, §7): serve the error taxonomy as JSON, so a
//! caller can look up what a JSON-RPC error code means without reading
//! this source.

use axum::routing::get;
use axum::{Json, Router};

use crate::gateway::errors::TAXONOMY;
use crate::AppState;

/// Create the error-taxonomy router.
pub fn router() -> Router<AppState> {
    Router::new().route("/errors", get(list_errors))
}

async fn list_errors() -> Json<&'static [crate::gateway::errors::ErrorTaxonomyEntry]> {
    Json(TAXONOMY)
}
