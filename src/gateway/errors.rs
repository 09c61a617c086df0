//! The gateway's error taxonomy (§7): every error this core can return,
//! given a stable numeric code, a category, and whether a caller can
//! usefully retry. Errors are always surfaced in the JSON-RPC envelope,
//! never via HTTP status — HTTP is 200 whenever the envelope is
//! well-formed.

use serde::{Deserialize, Serialize};

/// One entry of the error taxonomy, as served at `GET /errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorTaxonomyEntry {
    pub code: i32,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub recoverable: bool,
}

/// A typed gateway error. Every variant maps to exactly one taxonomy
/// entry via [`GatewayError::taxonomy_entry`].
#[derive(Debug, Clone)]
pub enum GatewayError {
    ParseError,
    InvalidRequest(String),
    MethodNotFound(String),
    InvalidParams(String),
    Internal(String),
    TaskNotFound(String),
    InvalidState(String),
    TaskCreationFailed(String),
    TaskUpdateFailed(String),
    TaskCancelFailed(String),
    AgentNotFound(String),
    WorkflowEngineDown(String),
    RedisDown(String),
    RegistryDown(String),
}

impl GatewayError {
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal(_) => -32603,
            Self::TaskNotFound(_) => -32000,
            Self::InvalidState(_) => -32001,
            Self::TaskCreationFailed(_) => -32002,
            Self::TaskUpdateFailed(_) => -32003,
            Self::TaskCancelFailed(_) => -32004,
            Self::AgentNotFound(_) => -32020,
            Self::WorkflowEngineDown(_) => -32060,
            Self::RedisDown(_) => -32061,
            Self::RegistryDown(_) => -32063,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ParseError => "Parse error".to_string(),
            Self::InvalidRequest(detail) => format!("Invalid request: {detail}"),
            Self::MethodNotFound(method) => format!("Method not found: {method}"),
            Self::InvalidParams(detail) => format!("Invalid params: {detail}"),
            Self::Internal(detail) => format!("Internal error: {detail}"),
            Self::TaskNotFound(id) => format!("Task not found: {id}"),
            Self::InvalidState(detail) => format!("Invalid state: {detail}"),
            Self::TaskCreationFailed(detail) => format!("Task creation failed: {detail}"),
            Self::TaskUpdateFailed(detail) => format!("Task update failed: {detail}"),
            Self::TaskCancelFailed(detail) => format!("Task cancel failed: {detail}"),
            Self::AgentNotFound(agent_id) => format!("Agent not found: {agent_id}"),
            Self::WorkflowEngineDown(detail) => format!("Workflow engine unavailable: {detail}"),
            Self::RedisDown(detail) => format!("Task store unavailable: {detail}"),
            Self::RegistryDown(detail) => format!("Agent registry unavailable: {detail}"),
        }
    }

    #[must_use]
    pub fn taxonomy_entry(&self) -> ErrorTaxonomyEntry {
        TAXONOMY
            .iter()
            .find(|e| e.code == self.code())
            .cloned()
            .unwrap_or(ErrorTaxonomyEntry {
                code: self.code(),
                title: "Unknown",
                description: "",
                category: "unknown",
                recoverable: false,
            })
    }

    /// Render as the JSON-RPC error object: `{code, message, data}`.
    #[must_use]
    pub fn to_json_rpc_error(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "message": self.message(),
            "data": {
                "category": self.taxonomy_entry().category,
                "recoverable": self.taxonomy_entry().recoverable,
            }
        })
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for GatewayError {}

/// The full error taxonomy, served at `GET /errors` as a diagnostic aid.
/// Reserved auth/limit codes (−32040…−32045) are listed but never
/// returned by this core, which does not enforce auth or quotas.
pub static TAXONOMY: &[ErrorTaxonomyEntry] = &[
    ErrorTaxonomyEntry { code: -32700, title: "Parse error", description: "The JSON sent is not a valid JSON-RPC request.", category: "json-rpc", recoverable: false },
    ErrorTaxonomyEntry { code: -32600, title: "Invalid request", description: "The JSON sent is not a valid JSON-RPC envelope.", category: "json-rpc", recoverable: false },
    ErrorTaxonomyEntry { code: -32601, title: "Method not found", description: "The method does not exist or is not available.", category: "json-rpc", recoverable: false },
    ErrorTaxonomyEntry { code: -32602, title: "Invalid params", description: "Invalid method parameter(s).", category: "json-rpc", recoverable: false },
    ErrorTaxonomyEntry { code: -32603, title: "Internal error", description: "An unexpected internal error occurred.", category: "json-rpc", recoverable: true },
    ErrorTaxonomyEntry { code: -32000, title: "Task not found", description: "No task exists with the given id.", category: "task", recoverable: false },
    ErrorTaxonomyEntry { code: -32001, title: "Invalid state", description: "The requested transition is not valid from the task's current state.", category: "task", recoverable: false },
    ErrorTaxonomyEntry { code: -32002, title: "Task creation failed", description: "Starting the workflow for a new task failed.", category: "task", recoverable: true },
    ErrorTaxonomyEntry { code: -32003, title: "Task update failed", description: "Persisting a task status update failed.", category: "task", recoverable: true },
    ErrorTaxonomyEntry { code: -32004, title: "Task cancel failed", description: "Signaling cancellation to the workflow failed.", category: "task", recoverable: true },
    ErrorTaxonomyEntry { code: -32005, title: "Timeout", description: "The operation exceeded its time budget.", category: "task", recoverable: true },
    ErrorTaxonomyEntry { code: -32006, title: "Quota exceeded", description: "A configured quota was exceeded.", category: "task", recoverable: false },
    ErrorTaxonomyEntry { code: -32020, title: "Agent not found", description: "No routing entry exists for the given agentId.", category: "agent", recoverable: false },
    ErrorTaxonomyEntry { code: -32021, title: "Agent unavailable", description: "The agent is configured but currently unavailable.", category: "agent", recoverable: true },
    ErrorTaxonomyEntry { code: -32022, title: "Agent incompatible", description: "The agent cannot handle the requested operation.", category: "agent", recoverable: false },
    ErrorTaxonomyEntry { code: -32023, title: "Agent registration failed", description: "Registering an agent card with the registry failed.", category: "agent", recoverable: true },
    ErrorTaxonomyEntry { code: -32024, title: "Capability mismatch", description: "The agent's declared capabilities do not satisfy the request.", category: "agent", recoverable: false },
    ErrorTaxonomyEntry { code: -32025, title: "Agent quota", description: "A per-agent quota was exceeded.", category: "agent", recoverable: false },
    ErrorTaxonomyEntry { code: -32040, title: "Unauthorized", description: "Reserved: this core does not enforce authentication.", category: "auth", recoverable: false },
    ErrorTaxonomyEntry { code: -32041, title: "Forbidden", description: "Reserved: this core does not enforce authorization.", category: "auth", recoverable: false },
    ErrorTaxonomyEntry { code: -32042, title: "Rate limited", description: "Reserved: this core does not enforce rate limits.", category: "auth", recoverable: true },
    ErrorTaxonomyEntry { code: -32060, title: "Workflow engine down", description: "The external workflow engine could not be reached.", category: "service", recoverable: true },
    ErrorTaxonomyEntry { code: -32061, title: "Redis down", description: "The Task Store's Redis backend could not be reached.", category: "service", recoverable: true },
    ErrorTaxonomyEntry { code: -32062, title: "Database error", description: "Reserved for a persistence backend beyond Redis.", category: "service", recoverable: true },
    ErrorTaxonomyEntry { code: -32063, title: "Registry unavailable", description: "The agent registry could not be reached.", category: "service", recoverable: true },
    ErrorTaxonomyEntry { code: -32064, title: "Service timeout", description: "A downstream service exceeded its time budget.", category: "service", recoverable: true },
    ErrorTaxonomyEntry { code: -32065, title: "External error", description: "An unspecified downstream service error.", category: "service", recoverable: true },
    ErrorTaxonomyEntry { code: -32080, title: "Validation error", description: "A general input validation error.", category: "validation", recoverable: false },
    ErrorTaxonomyEntry { code: -32081, title: "Malformed message", description: "The submitted message does not match the accepted shapes.", category: "validation", recoverable: false },
    ErrorTaxonomyEntry { code: -32082, title: "Configuration error", description: "The gateway's own configuration is invalid.", category: "validation", recoverable: false },
    ErrorTaxonomyEntry { code: -32083, title: "Environment error", description: "A required environment setting is missing or invalid.", category: "validation", recoverable: false },
    ErrorTaxonomyEntry { code: -32084, title: "Schema error", description: "The payload does not match the expected schema.", category: "validation", recoverable: false },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_not_found_matches_its_taxonomy_entry() {
        let err = GatewayError::AgentNotFound("missing-agent".into());
        assert_eq!(err.code(), -32020);
        assert_eq!(err.taxonomy_entry().title, "Agent not found");
    }

    #[test]
    fn every_taxonomy_entry_has_a_unique_code() {
        let mut codes: Vec<i32> = TAXONOMY.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        let mut deduped = codes.clone();
        deduped.dedup();
        assert_eq!(codes.len(), deduped.len());
    }

    #[test]
    fn json_rpc_error_carries_code_and_category() {
        let err = GatewayError::TaskNotFound("abc".into());
        let value = err.to_json_rpc_error();
        assert_eq!(value["code"], -32000);
        assert_eq!(value["data"]["category"], "task");
    }
}
