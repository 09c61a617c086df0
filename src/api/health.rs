//! `GET /health` (§4.9): liveness plus boolean connectivity to the three
//! external systems this gateway depends on.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::store::StoreError;
use crate::workflow::WorkflowClientError;
use crate::AppState;

const HEALTH_PROBE_ID: &str = "__gateway_health_probe__";

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    connectivity: Connectivity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Connectivity {
    workflow_engine: bool,
    redis: bool,
    registry: bool,
}

async fn redis_reachable(state: &AppState) -> bool {
    matches!(
        state.store.get(HEALTH_PROBE_ID).await,
        Ok(_) | Err(StoreError::NotFound(_))
    )
}

async fn workflow_engine_reachable(state: &AppState) -> bool {
    !matches!(
        state.workflow_client.query_progress_signals(HEALTH_PROBE_ID).await,
        Err(WorkflowClientError::Unavailable(_))
    )
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (workflow_engine, redis, registry) = tokio::join!(
        workflow_engine_reachable(&state),
        redis_reachable(&state),
        state.registry.ping(),
    );

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        connectivity: Connectivity {
            workflow_engine,
            redis,
            registry,
        },
    })
}
