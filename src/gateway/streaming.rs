//! Streaming Bridge (§4.8): turns `message/stream` into a live SSE
//! connection by polling `workflowClient.queryProgressSignals` every
//! ~100 ms and translating each new signal into A2A wire events, while
//! concurrently keeping the Task Store projection in sync.

use std::convert::Infallible;
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use super::dispatcher::{err_envelope, JsonRpcRequest};
use super::errors::GatewayError;
use super::lifecycle::{self, MessageParams};
use crate::domain::{now_iso8601_millis, ProgressSignal, TaskState};
use crate::events::{translate_signal, Artifact, StatusPayload, StreamEvent, TaskArtifactUpdateEvent, TaskStatusUpdateEvent, TranslationCursor};
use crate::AppState;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn status_event(task_id: &str, context_id: &str, state: TaskState, is_final: bool) -> StreamEvent {
    StreamEvent::Status(TaskStatusUpdateEvent {
        task_id: task_id.to_string(),
        context_id: context_id.to_string(),
        kind: "status-update",
        status: StatusPayload {
            state,
            timestamp: now_iso8601_millis(),
        },
        is_final,
    })
}

fn artifact_event(task_id: &str, context_id: &str, artifact_id: String, value: &Value, last_chunk: bool) -> StreamEvent {
    let text = value
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    StreamEvent::Artifact(TaskArtifactUpdateEvent {
        task_id: task_id.to_string(),
        context_id: context_id.to_string(),
        kind: "artifact-update",
        artifact: Artifact {
            artifact_id,
            name: None,
            parts: vec![crate::domain::Part::text(text)],
        },
        append: false,
        last_chunk,
    })
}

/// Derive the `(state, artifacts, error)` triple a signal implies for the
/// Task Store projection, matching the Completion Monitor's rules (§4.8
/// step 6).
fn signal_projection(signal: &ProgressSignal) -> (TaskState, Option<Value>, Option<String>) {
    match signal.status.as_str() {
        "completed" => (TaskState::Completed, signal.result.clone(), None),
        "failed" => (TaskState::Failed, None, signal.error.clone()),
        _ => (TaskState::Working, None, None),
    }
}

fn sse_event(payload: &StreamEvent) -> Result<Event, Infallible> {
    Ok(Event::default().data(payload.to_sse_data()))
}

/// `message/stream` — §4.8.
pub async fn handle_message_stream(state: AppState, agent_id: String, request: JsonRpcRequest) -> Response {
    let params: MessageParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Json(err_envelope(&request.id, &GatewayError::InvalidParams(e.to_string()))).into_response()
        }
    };

    let route = match lifecycle::resolve_route(&state, &agent_id) {
        Ok(r) => r,
        Err(e) => return Json(err_envelope(&request.id, &e)).into_response(),
    };

    let task = match lifecycle::build_and_persist_task(&state, &agent_id, &params).await {
        Ok(t) => t,
        Err(e) => return Json(err_envelope(&request.id, &e)).into_response(),
    };

    let task_id = task.id.clone();
    let context_id = task.context_id.clone();
    let workflow_client = state.workflow_client.clone();
    let store = state.store.clone();

    let stream = async_stream::stream! {
        match workflow_client.start(&route.workflow_type, &route.task_queue, &task_id, &task.input).await {
            Ok(()) => {
                yield sse_event(&status_event(&task_id, &context_id, TaskState::Submitted, false));
            }
            Err(e) => {
                let _ = store
                    .update_status(&task_id, TaskState::Failed, None, Some(e.to_string()))
                    .await;
                yield sse_event(&status_event(&task_id, &context_id, TaskState::Failed, true));
                return;
            }
        }

        let mut consumed = 0usize;
        let mut cursor = TranslationCursor::default();
        let mut terminal_sent = false;

        let mut completion = workflow_client.await_completion(&task_id);
        let mut completion_done = false;

        while !terminal_sent {
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {
                    match workflow_client.query_progress_signals(&task_id).await {
                        Ok(signals) if signals.len() > consumed => {
                            for signal in &signals[consumed..] {
                                let (proj_state, proj_artifacts, proj_error) = signal_projection(signal);
                                if let Err(e) = store.update_status(&task_id, proj_state, proj_artifacts, proj_error).await {
                                    tracing::warn!(task_id = %task_id, error = %e, "streaming bridge failed to update task store");
                                }

                                for event in translate_signal(signal, &task_id, &context_id, &mut cursor) {
                                    if event.is_terminal_status() {
                                        terminal_sent = true;
                                    }
                                    yield sse_event(&event);
                                }
                            }
                            consumed = signals.len();
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(task_id = %task_id, error = %e, "progress signal query failed");
                        }
                    }
                }
                result = &mut completion, if !completion_done && !terminal_sent => {
                    completion_done = true;
                    match result {
                        Ok(value) => {
                            let _ = store
                                .update_status(&task_id, TaskState::Completed, value.clone(), None)
                                .await;
                            yield sse_event(&status_event(&task_id, &context_id, TaskState::Completed, true));
                            if let Some(v) = value {
                                let artifact_id = format!("artifact-{}", &task_id.chars().take(8).collect::<String>());
                                yield sse_event(&artifact_event(&task_id, &context_id, artifact_id, &v, true));
                            }
                            terminal_sent = true;
                        }
                        Err(e) => {
                            let _ = store
                                .update_status(&task_id, TaskState::Failed, None, Some(e.to_string()))
                                .await;
                            yield sse_event(&status_event(&task_id, &context_id, TaskState::Failed, true));
                            terminal_sent = true;
                        }
                    }
                }
            }
        }
    };

    let mut response = Sse::new(stream).into_response();
    let headers = response.headers_mut();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Headers", HeaderValue::from_static("Cache-Control"));
    response
}

/// Fallback response when the SSE response writer cannot be confirmed to
/// support incremental flushing (§4.8 step 2). Never exercised by the
/// axum/hyper stack this gateway runs on, but kept as the documented
/// escape hatch the design calls for.
#[allow(dead_code)]
fn writer_unavailable_response(id: &Value) -> Response {
    let mut response = Json(err_envelope(id, &GatewayError::Internal("SSE writer does not support flushing".to_string())))
        .into_response();
    *response.status_mut() = StatusCode::OK;
    response
}
