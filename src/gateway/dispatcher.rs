//! Protocol Dispatcher (§4.5): decodes the JSON-RPC envelope, validates
//! it, and routes `method` to the Task Lifecycle Manager or Streaming
//! Bridge. HTTP status is always 200 once the envelope itself parses —
//! errors travel inside the JSON-RPC response.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::errors::GatewayError;
use super::{lifecycle, streaming};
use crate::AppState;

/// `{jsonrpc, method, params, id}` — the request envelope. `params` and
/// `id` are left as raw [`Value`]s; each handler interprets `params` for
/// its own method.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

/// Render a successful JSON-RPC response envelope.
pub fn ok_envelope(id: &Value, result: Value) -> Value {
    serde_json::json!({ "jsonrpc": "2.0", "result": result, "id": id })
}

/// Render an error JSON-RPC response envelope.
pub fn err_envelope(id: &Value, err: &GatewayError) -> Value {
    serde_json::json!({ "jsonrpc": "2.0", "error": err.to_json_rpc_error(), "id": id })
}

const SUNSET_DATE: &str = "2026-12-31";

/// Apply the deprecation headers mandated for legacy-name dispatch (§7).
fn apply_deprecation_headers(headers: &mut HeaderMap) {
    headers.insert("Deprecation", HeaderValue::from_static("true"));
    headers.insert("Sunset", HeaderValue::from_static(SUNSET_DATE));
    headers.insert(
        "Link",
        HeaderValue::from_static("</docs/api.md>; rel=\"sunset\""),
    );
}

/// `POST /{agentId}` — primary A2A surface.
pub async fn dispatch_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    body: axum::body::Bytes,
) -> Response {
    dispatch(state, agent_id, &body, false).await
}

/// `POST /a2a` — legacy dispatch. `agentId` is carried in `params` instead
/// of the path, and every successful response gets deprecation headers.
pub async fn dispatch_legacy(State(state): State<AppState>, body: axum::body::Bytes) -> Response {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return parse_error_response(&Value::Null),
    };
    let agent_id = raw
        .get("params")
        .and_then(|p| p.get("agentId"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut response = dispatch(state, agent_id, &body, true).await;
    apply_deprecation_headers(response.headers_mut());
    tracing::warn!("legacy /a2a endpoint invoked; clients should migrate to POST /{{agentId}}");
    response
}

fn parse_error_response(id: &Value) -> Response {
    Json(err_envelope(id, &GatewayError::ParseError)).into_response()
}

async fn dispatch(state: AppState, agent_id: String, body: &[u8], legacy: bool) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(_) => return parse_error_response(&Value::Null),
    };

    if request.jsonrpc.as_deref() != Some("2.0") {
        return Json(err_envelope(
            &request.id,
            &GatewayError::InvalidRequest("jsonrpc must be \"2.0\"".to_string()),
        ))
        .into_response();
    }
    let Some(method) = request.method.as_deref().filter(|m| !m.is_empty()) else {
        return Json(err_envelope(
            &request.id,
            &GatewayError::InvalidRequest("method is required".to_string()),
        ))
        .into_response();
    };

    let canonical = canonicalize_method(method);
    match canonical {
        "message/send" => lifecycle::handle_message_send(state, agent_id, request).await,
        "message/stream" => streaming::handle_message_stream(state, agent_id, request).await,
        "tasks/get" => lifecycle::handle_tasks_get(state, request).await,
        "tasks/cancel" => lifecycle::handle_tasks_cancel(state, request).await,
        "x-a2a.getTasksByMetadata" => lifecycle::handle_get_tasks_by_metadata(state, request).await,
        _ => {
            let _ = legacy;
            Json(err_envelope(&request.id, &GatewayError::MethodNotFound(method.to_string())))
                .into_response()
        }
    }
}

/// Legacy method spellings map onto the same four handlers (§4.5 "legacy
/// names"). The canonical v0.2.5 names pass through unchanged.
fn canonicalize_method(method: &str) -> &str {
    match method {
        "sendTask" | "tasks/send" => "message/send",
        "sendTaskSubscribe" | "tasks/sendSubscribe" => "message/stream",
        "getTask" => "tasks/get",
        "cancelTask" => "tasks/cancel",
        other => other,
    }
}
