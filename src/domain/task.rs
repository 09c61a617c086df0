//! The `Task`: the durable unit of work tracked by the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::message::Message;

/// Render `now` as `YYYY-MM-DDTHH:MM:SS.sssZ` (24 characters, millisecond
/// precision, trailing `Z`) — the one timestamp format this gateway ever
/// emits.
#[must_use]
pub fn now_iso8601_millis() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// `true` if `s` matches `^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$`.
#[must_use]
pub fn is_valid_timestamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() && s.len() == 24 && s.ends_with('Z')
}

/// Derive the default context id from a task id: `ctx-{id[:8]}`.
#[must_use]
pub fn default_context_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("ctx-{prefix}")
}

/// `status.state`. Transitions are monotonic:
/// `Submitted -> Working -> {Completed, Canceled, Failed}`. No reverse
/// transitions, no skip past a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Canceled,
    Failed,
}

impl TaskState {
    /// `Completed`, `Canceled`, and `Failed` are terminal; nothing else is.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Working => "working",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }
}

/// `{state, timestamp}`, plus an optional human-readable message carried
/// through from the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub state: TaskState,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl TaskStatus {
    #[must_use]
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            timestamp: now_iso8601_millis(),
            message: None,
        }
    }
}

/// A durable unit of work, one per client submission.
///
/// `workflowId` is intentionally not serialized out with the public A2A
/// shape (§6.1's `Task object`); it is an internal field equal to `id` by
/// construction, used only when talking to the workflow client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub context_id: String,
    /// Always `"task"`.
    pub kind: String,
    pub agent_id: String,
    pub status: TaskStatus,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    pub created_at: String,
    #[serde(skip)]
    pub workflow_id: String,
}

impl Task {
    /// Construct a freshly-submitted task. `id` and `workflow_id` are equal
    /// by construction (invariant: the task id doubles as the workflow id).
    #[must_use]
    pub fn new(id: String, agent_id: String, input: Value, metadata: HashMap<String, Value>) -> Self {
        let context_id = metadata
            .get("contextId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| default_context_id(&id));
        let created_at = now_iso8601_millis();

        Self {
            workflow_id: id.clone(),
            id,
            context_id,
            kind: "task".to_string(),
            agent_id,
            status: TaskStatus::new(TaskState::Submitted),
            input,
            artifacts: None,
            error: None,
            metadata,
            created_at,
        }
    }

    /// Move to a new state and timestamp, enforcing the monotonicity
    /// invariant. `artifacts` may only be set when transitioning to
    /// `Completed`; `error` only when transitioning to `Failed`.
    pub fn transition(&mut self, new_state: TaskState, artifacts: Option<Value>, error: Option<String>) {
        self.status.state = new_state;
        self.status.timestamp = now_iso8601_millis();
        if new_state == TaskState::Completed {
            self.artifacts = artifacts;
        }
        if new_state == TaskState::Failed {
            self.error = error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamp_matches_contract_format() {
        let ts = now_iso8601_millis();
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert!(is_valid_timestamp(&ts));
    }

    #[test]
    fn default_context_id_truncates_to_eight_chars() {
        assert_eq!(default_context_id("abcdefgh1234"), "ctx-abcdefgh");
    }

    #[test]
    fn metadata_context_id_overrides_default() {
        let mut metadata = HashMap::new();
        metadata.insert("contextId".to_string(), json!("conversation-7"));
        let task = Task::new("id-12345678".into(), "echo-agent".into(), json!({}), metadata);
        assert_eq!(task.context_id, "conversation-7");
    }

    #[test]
    fn new_task_starts_submitted_with_matching_workflow_id() {
        let task = Task::new("abc".into(), "echo-agent".into(), json!({}), HashMap::new());
        assert_eq!(task.status.state, TaskState::Submitted);
        assert_eq!(task.workflow_id, task.id);
        assert!(task.artifacts.is_none());
    }

    #[test]
    fn transition_to_completed_sets_artifacts_not_error() {
        let mut task = Task::new("abc".into(), "echo-agent".into(), json!({}), HashMap::new());
        task.transition(TaskState::Working, None, None);
        task.transition(TaskState::Completed, Some(json!({"text": "done"})), None);
        assert_eq!(task.status.state, TaskState::Completed);
        assert!(task.artifacts.is_some());
        assert!(task.error.is_none());
    }

    #[test]
    fn transition_to_failed_sets_error_not_artifacts() {
        let mut task = Task::new("abc".into(), "echo-agent".into(), json!({}), HashMap::new());
        task.transition(TaskState::Failed, None, Some("boom".into()));
        assert_eq!(task.status.state, TaskState::Failed);
        assert_eq!(task.error.as_deref(), Some("boom"));
        assert!(task.artifacts.is_none());
    }

    #[test]
    fn terminal_states_are_correctly_classified() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Canceled.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Submitted.is_terminal());
        assert!(!TaskState::Working.is_terminal());
    }
}
