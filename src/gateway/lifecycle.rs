//! Task Lifecycle Manager (§4.6): `message/send`, `tasks/get`,
//! `tasks/cancel`, and the `x-a2a.getTasksByMetadata` diagnostic method.

use std::collections::HashMap;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::dispatcher::{err_envelope, ok_envelope, JsonRpcRequest};
use super::errors::GatewayError;
use super::monitor;
use crate::config::routing::AgentRoute;
use crate::domain::{normalize_message_input, Task, TaskState};
use crate::store::StoreError;
use crate::workflow::WorkflowClientError;
use crate::AppState;

/// `{message, metadata?}` — the shared params shape for `message/send`
/// and `message/stream` (§6.1).
#[derive(Debug, Default, Deserialize)]
pub struct MessageParams {
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TaskIdParams {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MetadataLookupParams {
    #[serde(rename = "metadataKey")]
    metadata_key: String,
    #[serde(rename = "metadataValue")]
    metadata_value: String,
    limit: Option<usize>,
}

fn store_error_to_gateway(err: StoreError) -> GatewayError {
    match err {
        StoreError::NotFound(id) => GatewayError::TaskNotFound(id),
        StoreError::Redis(e) => GatewayError::RedisDown(e.to_string()),
        StoreError::Malformed(e) => GatewayError::Internal(e),
    }
}

/// Resolve `agentId` against the routing table. Unknown agent is the one
/// listed failure mode (§4.6 step 1).
pub(super) fn resolve_route(state: &AppState, agent_id: &str) -> Result<AgentRoute, GatewayError> {
    state
        .routing
        .get(agent_id)
        .cloned()
        .ok_or_else(|| GatewayError::AgentNotFound(agent_id.to_string()))
}

/// Build a fresh `Task` from a `message/send`-or-`message/stream` params
/// object and persist it in the `submitted` state.
pub(super) async fn build_and_persist_task(
    state: &AppState,
    agent_id: &str,
    params: &MessageParams,
) -> Result<Task, GatewayError> {
    let input = normalize_message_input(&params.message);
    let id = uuid::Uuid::new_v4().to_string();
    let task = Task::new(id, agent_id.to_string(), input, params.metadata.clone());

    state
        .store
        .put(&task)
        .await
        .map_err(store_error_to_gateway)?;

    Ok(task)
}

/// Start the workflow backing `task`. On failure, per §4.6 step 4, the
/// task's store state is left untouched (still `submitted`).
pub(super) async fn start_workflow(state: &AppState, route: &AgentRoute, task: &Task) -> Result<(), GatewayError> {
    state
        .workflow_client
        .start(&route.workflow_type, &route.task_queue, &task.id, &task.input)
        .await
        .map_err(|e| GatewayError::TaskCreationFailed(e.to_string()))
}

/// `message/send` — §4.6.
pub async fn handle_message_send(state: AppState, agent_id: String, request: JsonRpcRequest) -> Response {
    let params: MessageParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Json(err_envelope(&request.id, &GatewayError::InvalidParams(e.to_string()))).into_response()
        }
    };

    let route = match resolve_route(&state, &agent_id) {
        Ok(r) => r,
        Err(e) => return Json(err_envelope(&request.id, &e)).into_response(),
    };

    let task = match build_and_persist_task(&state, &agent_id, &params).await {
        Ok(t) => t,
        Err(e) => return Json(err_envelope(&request.id, &e)).into_response(),
    };

    if let Err(e) = start_workflow(&state, &route, &task).await {
        return Json(err_envelope(&request.id, &e)).into_response();
    }

    if let Err(e) = state
        .store
        .update_status(&task.id, TaskState::Working, None, None)
        .await
        .map_err(store_error_to_gateway)
    {
        return Json(err_envelope(&request.id, &e)).into_response();
    }

    monitor::spawn(state.clone(), task.id.clone());

    match state.store.get(&task.id).await {
        Ok(current) => Json(ok_envelope(&request.id, serde_json::to_value(current).unwrap_or(Value::Null)))
            .into_response(),
        Err(e) => Json(err_envelope(&request.id, &store_error_to_gateway(e))).into_response(),
    }
}

/// `tasks/get` — §4.6.
pub async fn handle_tasks_get(state: AppState, request: JsonRpcRequest) -> Response {
    let params: TaskIdParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Json(err_envelope(&request.id, &GatewayError::InvalidParams(e.to_string()))).into_response()
        }
    };

    match state.store.get(&params.id).await {
        Ok(task) => Json(ok_envelope(&request.id, serde_json::to_value(task).unwrap_or(Value::Null))).into_response(),
        Err(e) => Json(err_envelope(&request.id, &store_error_to_gateway(e))).into_response(),
    }
}

/// `tasks/cancel` — §4.6. Idempotent: canceling an already-terminal task
/// succeeds without error, per [`crate::store::TaskStore::update_status`]'s
/// set-once semantics.
pub async fn handle_tasks_cancel(state: AppState, request: JsonRpcRequest) -> Response {
    let params: TaskIdParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Json(err_envelope(&request.id, &GatewayError::InvalidParams(e.to_string()))).into_response()
        }
    };

    if let Err(e) = state.workflow_client.signal_cancel(&params.id).await {
        let gateway_err = match e {
            WorkflowClientError::Unavailable(d) => GatewayError::WorkflowEngineDown(d),
            other => GatewayError::Internal(other.to_string()),
        };
        return Json(err_envelope(&request.id, &gateway_err)).into_response();
    }

    if let Err(e) = state
        .store
        .update_status(&params.id, TaskState::Canceled, None, None)
        .await
        .map_err(store_error_to_gateway)
    {
        return Json(err_envelope(&request.id, &e)).into_response();
    }

    Json(ok_envelope(&request.id, serde_json::json!({ "status": "canceled" }))).into_response()
}

/// `x-a2a.getTasksByMetadata` — diagnostic extension exercised by §8
/// scenario 6. Not part of the core v0.2.5 surface.
pub async fn handle_get_tasks_by_metadata(state: AppState, request: JsonRpcRequest) -> Response {
    let params: MetadataLookupParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Json(err_envelope(&request.id, &GatewayError::InvalidParams(e.to_string()))).into_response()
        }
    };

    match state
        .store
        .find_by_metadata(&params.metadata_key, &params.metadata_value, params.limit)
        .await
    {
        Ok(tasks) => {
            let ids: Vec<String> = tasks.into_iter().map(|t| t.id).collect();
            Json(ok_envelope(&request.id, serde_json::json!({ "taskIds": ids }))).into_response()
        }
        Err(e) => Json(err_envelope(&request.id, &store_error_to_gateway(e))).into_response(),
    }
}
