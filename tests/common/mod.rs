//! Shared test harness: an in-memory `TaskStore` and a scriptable
//! `WorkflowClient`, assembled into a real `AppState`/`Router` without
//! touching Redis or a workflow engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;

use a2a_gateway::config::routing::AgentRoute;
use a2a_gateway::config::{AppConfig, GatewayConfig, LoggingConfig, RedisConfig, RegistryConfig, ServerConfig, WorkflowEngineConfig};
use a2a_gateway::domain::{ProgressSignal, Task, TaskState};
use a2a_gateway::registry::RegistryClient;
use a2a_gateway::store::{StoreError, SweepReport, TaskStore};
use a2a_gateway::workflow::{WorkflowClient, WorkflowClientError};
use a2a_gateway::{api, gateway, AppState};

/// A `TaskStore` backed by a `Mutex<HashMap>`, mirroring the Redis
/// implementation's set-once-terminal and metadata-scan semantics without
/// needing a real connection.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn put(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks.lock().unwrap().insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Task, StoreError> {
        self.tasks
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_status(
        &self,
        id: &str,
        new_state: TaskState,
        artifacts: Option<Value>,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if task.status.state.is_terminal() {
            return Ok(());
        }
        task.transition(new_state, artifacts, error);
        Ok(())
    }

    async fn find_by_metadata(&self, key: &str, value: &str, limit: Option<usize>) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.lock().unwrap();
        let mut matches: Vec<Task> = tasks
            .values()
            .filter(|t| t.metadata.get(key).and_then(Value::as_str) == Some(value))
            .cloned()
            .collect();
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn sweep(&self) -> Result<SweepReport, StoreError> {
        Ok(SweepReport::default())
    }
}

/// Scripted behavior for [`FakeWorkflowClient`].
pub enum Script {
    /// `start` succeeds; `queryProgressSignals` reveals one more signal of
    /// `signals` per call, driving the happy-path poll loop to completion.
    /// `awaitCompletion` never resolves, since the poll path alone reaches
    /// a terminal event.
    Progressive(Vec<ProgressSignal>),
    /// `start` succeeds; `queryProgressSignals` always returns nothing (the
    /// "query-name regression" scenario — a worker that never populates
    /// its progress query), and `awaitCompletion` resolves shortly after,
    /// exercising the completion-await fallback.
    CompletionOnly(Value),
    /// `start` fails outright.
    StartFails,
}

pub struct FakeWorkflowClient {
    script: Script,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeWorkflowClient {
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl WorkflowClient for FakeWorkflowClient {
    async fn start(&self, _workflow_type: &str, _task_queue: &str, _id: &str, _input: &Value) -> Result<(), WorkflowClientError> {
        match &self.script {
            Script::StartFails => Err(WorkflowClientError::Rejected("no worker registered".to_string())),
            _ => Ok(()),
        }
    }

    async fn signal_cancel(&self, _id: &str) -> Result<(), WorkflowClientError> {
        Ok(())
    }

    async fn query_progress_signals(&self, id: &str) -> Result<Vec<ProgressSignal>, WorkflowClientError> {
        match &self.script {
            Script::Progressive(signals) => {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(id.to_string()).or_insert(0);
                *count = (*count + 1).min(signals.len());
                Ok(signals[..*count].to_vec())
            }
            Script::CompletionOnly(_) | Script::StartFails => Ok(vec![]),
        }
    }

    async fn await_completion(&self, _id: &str) -> Result<Option<Value>, WorkflowClientError> {
        match &self.script {
            Script::Progressive(_) => std::future::pending().await,
            Script::CompletionOnly(value) => {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(Some(value.clone()))
            }
            Script::StartFails => std::future::pending().await,
        }
    }
}

/// Build a router with `echo-agent` routed to a `FakeWorkflowClient` driven
/// by `script`, and an `InMemoryTaskStore`.
#[must_use]
pub fn test_app(script: Script) -> Router {
    let mut routing = HashMap::new();
    routing.insert(
        "echo-agent".to_string(),
        AgentRoute {
            task_queue: "echo-queue".to_string(),
            workflow_type: "EchoWorkflow".to_string(),
        },
    );

    let config = AppConfig {
        server: ServerConfig::default(),
        workflow_engine: WorkflowEngineConfig::default(),
        redis: RedisConfig::default(),
        registry: RegistryConfig::default(),
        routing_config_path: String::new(),
        logging: LoggingConfig::default(),
        gateway: GatewayConfig::default(),
    };

    let state = AppState {
        config: Arc::new(config),
        routing: Arc::new(routing),
        store: Arc::new(InMemoryTaskStore::default()),
        workflow_client: Arc::new(FakeWorkflowClient::new(script)),
        registry: Arc::new(RegistryClient::new("http://127.0.0.1:0")),
    };

    a2a_gateway::metrics::init_metrics().expect("metrics registration is idempotent and infallible in tests");

    Router::new()
        .merge(api::create_router())
        .merge(gateway::create_router())
        .layer(axum::middleware::from_fn(a2a_gateway::metrics::track_metrics))
        .with_state(state)
}
