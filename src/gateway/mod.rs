//! The gateway core: JSON-RPC dispatch (§4.5), the Task Lifecycle Manager
//! (§4.6), the Completion Monitor (§4.7), and the Streaming Bridge (§4.8).

pub mod dispatcher;
pub mod errors;
pub mod lifecycle;
pub mod monitor;
pub mod streaming;

use axum::routing::post;
use axum::Router;

use crate::AppState;

/// Mount `POST /{agentId}` and the legacy `POST /a2a` surface.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/a2a", post(dispatcher::dispatch_legacy))
        .route("/{agent_id}", post(dispatcher::dispatch_agent))
}
