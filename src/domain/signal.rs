//! Progress signals: the ephemeral, workflow-local records the Streaming
//! Bridge and Completion Monitor read back from the workflow engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in a workflow's ordered, append-only progress array, as
/// returned by the `get_progress_signals` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSignal {
    pub task_id: String,
    pub status: String,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}
