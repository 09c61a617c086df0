//! A2A v0.2.5 SSE event model and progress-signal translation.
//!
//! The Streaming Bridge (`gateway::streaming`) turns each
//! [`crate::domain::ProgressSignal`] it reads from the workflow client into
//! zero or more of the events defined here, per the translation table in
//! §4.8.1: a bare `status-update` for `working`/anything-else signals, a
//! `status-update` followed by a terminal `artifact-update` for
//! `completed`, and a terminal `status-update` alone for `failed`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{now_iso8601_millis, ProgressSignal, TaskState};

/// A structured, parts-based payload returned by an agent as task output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parts: Vec<crate::domain::Part>,
}

/// `TaskStatusUpdateEvent` — §6.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub kind: &'static str,
    pub status: StatusPayload,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub state: TaskState,
    pub timestamp: String,
}

/// `TaskArtifactUpdateEvent` — §6.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub kind: &'static str,
    pub artifact: Artifact,
    pub append: bool,
    pub last_chunk: bool,
}

/// Either SSE event shape. Untagged: each variant's own `kind` field is
/// already the wire discriminator (§6.2), so no extra enum tag is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Status(TaskStatusUpdateEvent),
    Artifact(TaskArtifactUpdateEvent),
}

impl StreamEvent {
    /// `true` for a status event with `final = true` — the one event per
    /// stream that may appear at most once (§8 property 5).
    #[must_use]
    pub fn is_terminal_status(&self) -> bool {
        matches!(self, Self::Status(s) if s.is_final)
    }

    /// Render as the SSE wire line body: `data: <compact-json>\n\n`.
    #[must_use]
    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

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

fn artifact_event(
    task_id: &str,
    context_id: &str,
    artifact: Artifact,
    append: bool,
    last_chunk: bool,
) -> StreamEvent {
    StreamEvent::Artifact(TaskArtifactUpdateEvent {
        task_id: task_id.to_string(),
        context_id: context_id.to_string(),
        kind: "artifact-update",
        artifact,
        append,
        last_chunk,
    })
}

/// Extract the textual content of `value`: a bare string, `{text: ...}`,
/// or `{parts: [{text: ...}, ...]}` — the shapes a worker is expected to
/// put in a signal's `result`.
fn extract_text(value: &Value) -> String {
    if let Some(s) = value.as_str() {
        return s.to_string();
    }
    if let Some(s) = value.get("text").and_then(Value::as_str) {
        return s.to_string();
    }
    if let Some(parts) = value.get("parts").and_then(Value::as_array) {
        return parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("");
    }
    String::new()
}

fn artifact_id_for(signal: &ProgressSignal, task_id: &str) -> String {
    signal
        .result
        .as_ref()
        .and_then(|r| r.get("artifactId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let prefix: String = task_id.chars().take(8).collect();
            format!("artifact-{prefix}")
        })
}

/// Per-stream state needed to translate a sequence of progress signals:
/// the artifact id (stable once assigned) and the length of text already
/// emitted, for progressive (word-by-word) delivery.
#[derive(Debug, Default)]
pub struct TranslationCursor {
    artifact_id: Option<String>,
    emitted_text_len: usize,
}

/// Translate one progress signal into the events the Streaming Bridge
/// should write, in order, per §4.8.1. `cursor` tracks incremental
/// artifact state across calls for the same stream.
pub fn translate_signal(
    signal: &ProgressSignal,
    task_id: &str,
    context_id: &str,
    cursor: &mut TranslationCursor,
) -> Vec<StreamEvent> {
    match signal.status.as_str() {
        "working" => {
            let mut events = vec![status_event(task_id, context_id, TaskState::Working, false)];
            if let Some(result) = &signal.result {
                let full_text = extract_text(result);
                if full_text.len() > cursor.emitted_text_len {
                    let delta = full_text[cursor.emitted_text_len..].to_string();
                    let artifact_id = cursor
                        .artifact_id
                        .get_or_insert_with(|| artifact_id_for(signal, task_id))
                        .clone();
                    let append = cursor.emitted_text_len > 0;
                    cursor.emitted_text_len = full_text.len();
                    events.push(artifact_event(
                        task_id,
                        context_id,
                        Artifact {
                            artifact_id,
                            name: None,
                            parts: vec![crate::domain::Part::text(delta)],
                        },
                        append,
                        false,
                    ));
                }
            }
            events
        }
        "completed" => {
            let mut events = vec![status_event(task_id, context_id, TaskState::Completed, true)];
            if let Some(result) = &signal.result {
                let full_text = extract_text(result);
                let delta = if full_text.len() > cursor.emitted_text_len {
                    full_text[cursor.emitted_text_len..].to_string()
                } else {
                    String::new()
                };
                let artifact_id = cursor
                    .artifact_id
                    .clone()
                    .unwrap_or_else(|| artifact_id_for(signal, task_id));
                let append = cursor.emitted_text_len > 0;
                events.push(artifact_event(
                    task_id,
                    context_id,
                    Artifact {
                        artifact_id,
                        name: None,
                        parts: vec![crate::domain::Part::text(delta)],
                    },
                    append,
                    true,
                ));
            }
            events
        }
        "failed" => vec![status_event(task_id, context_id, TaskState::Failed, true)],
        _ => vec![status_event(task_id, context_id, TaskState::Working, false)],
    }
}
