//! Agent routing table: `agentId -> {taskQueue, workflowType}`.
//!
//! Routing is configuration, not code — the well-known
//! `{agentId}Workflow` naming shortcut is deliberately not supported by
//! this loader (see [`RoutingConfig::load`]'s contract and
//! [`super::validator::ConfigValidator`]'s check that flags it).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

/// One agent's routing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRoute {
    pub task_queue: String,
    pub workflow_type: String,
}

/// Informational category metadata; not consumed by routing logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCategory {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Parsed `agent-routing.yaml` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub version: String,
    #[serde(default)]
    pub routing: HashMap<String, AgentRoute>,
    #[serde(default, rename = "workflowCategories")]
    pub workflow_categories: HashMap<String, WorkflowCategory>,
}

impl RoutingConfig {
    /// Load and parse the routing document at `path`.
    ///
    /// An empty routing table is acceptable; a missing or malformed file
    /// is a fatal startup error.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::missing_required(
                format!("agent routing file at {}", path.display()),
                "resolving agentId -> workflow routing for message/send and message/stream",
                "AGENT_ROUTING_CONFIG",
            )
            .with_io_context(&e)
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            ConfigurationError::invalid(
                format!("agent routing file at {} is malformed: {e}", path.display()),
                "Ensure the file matches `{version, routing: {agentId: {taskQueue, workflowType}}}`",
            )
        })
    }

    /// Look up the `(taskQueue, workflowType)` pair for an agent id.
    #[must_use]
    pub fn resolve(&self, agent_id: &str) -> Option<&AgentRoute> {
        self.routing.get(agent_id)
    }
}

impl ConfigurationError {
    /// Append the underlying IO error to a `MissingRequired` error's context, if applicable.
    fn with_io_context(self, io_err: &std::io::Error) -> Self {
        match self {
            Self::MissingRequired {
                setting,
                context,
                env_var,
            } => Self::MissingRequired {
                setting: format!("{setting} ({io_err})"),
                context,
                env_var,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_routing_document() {
        let yaml = r#"
version: "1.0"
routing:
  echo-agent:
    taskQueue: echo-queue
    workflowType: EchoWorkflow
"#;
        let routing: RoutingConfig = serde_yaml::from_str(yaml).unwrap();
        let route = routing.resolve("echo-agent").unwrap();
        assert_eq!(route.task_queue, "echo-queue");
        assert_eq!(route.workflow_type, "EchoWorkflow");
    }

    #[test]
    fn empty_routing_table_is_acceptable() {
        let yaml = "version: \"1.0\"\nrouting: {}\n";
        let routing: RoutingConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(routing.routing.is_empty());
    }

    #[test]
    fn unknown_agent_resolves_to_none() {
        let yaml = "version: \"1.0\"\nrouting: {}\n";
        let routing: RoutingConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(routing.resolve("nonexistent").is_none());
    }
}
