//! `WorkflowClient`: `start`, `signalCancel`, `queryProgressSignals`,
//! `awaitCompletion` (§4.4), backed by a gRPC channel to the external
//! workflow engine.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ProgressSignal;
use crate::logging::OpTimer;

#[cfg(feature = "grpc")]
pub mod proto {
    include!("../proto/a2a.workflow.v1.rs");
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowClientError {
    #[error("workflow engine unreachable: {0}")]
    Unavailable(String),
    #[error("workflow engine rejected the call: {0}")]
    Rejected(String),
    #[error("workflow completed with error: {0}")]
    WorkflowFailed(String),
    #[error("malformed payload exchanged with workflow engine: {0}")]
    Malformed(String),
}

/// Abstract interface over the workflow engine (§4.4). `id` doubles as the
/// workflow identifier throughout — `start` is idempotent by `id`.
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Start a new workflow. Idempotent by `id`.
    async fn start(
        &self,
        workflow_type: &str,
        task_queue: &str,
        id: &str,
        input: &Value,
    ) -> Result<(), WorkflowClientError>;

    /// Best-effort cancellation signal.
    async fn signal_cancel(&self, id: &str) -> Result<(), WorkflowClientError>;

    /// Synchronous read of workflow-local progress state, via the
    /// well-known query name `get_progress_signals` (§6.7). The exact
    /// spelling is a protocol contract with the worker.
    async fn query_progress_signals(&self, id: &str) -> Result<Vec<ProgressSignal>, WorkflowClientError>;

    /// Block until the workflow reaches a terminal state.
    async fn await_completion(&self, id: &str) -> Result<Option<Value>, WorkflowClientError>;
}

/// The well-known query name every agent workflow must expose. Never
/// spelled any other way — see `query-name regression` in the testable
/// properties this gateway is held to.
pub const PROGRESS_SIGNALS_QUERY_NAME: &str = "get_progress_signals";

/// gRPC-backed [`WorkflowClient`], talking to the engine described by
/// `protos/workflow_engine.proto`.
#[cfg(feature = "grpc")]
pub struct GrpcWorkflowClient {
    client: proto::workflow_engine_client::WorkflowEngineClient<tonic::transport::Channel>,
}

#[cfg(feature = "grpc")]
impl GrpcWorkflowClient {
    /// Connect to `endpoint` (e.g. `http://localhost:7233`). Fails fast if
    /// the channel cannot be built; per §7, an unreachable workflow engine
    /// at startup is fatal.
    pub async fn connect(endpoint: &str) -> Result<Self, WorkflowClientError> {
        let timer = OpTimer::new("workflow_client", "connect");

        let channel = tonic::transport::Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| WorkflowClientError::Unavailable(e.to_string()))?
            .connect()
            .await
            .map_err(|e| WorkflowClientError::Unavailable(e.to_string()));

        let channel = match channel {
            Ok(c) => c,
            Err(e) => {
                timer.finish_with_result(Err::<(), _>(&e));
                return Err(e);
            }
        };

        timer.finish();
        Ok(Self {
            client: proto::workflow_engine_client::WorkflowEngineClient::new(channel),
        })
    }
}

#[cfg(feature = "grpc")]
#[async_trait]
impl WorkflowClient for GrpcWorkflowClient {
    async fn start(
        &self,
        workflow_type: &str,
        task_queue: &str,
        id: &str,
        input: &Value,
    ) -> Result<(), WorkflowClientError> {
        let timer = OpTimer::new("workflow_client", "start");
        let mut client = self.client.clone();

        let result = client
            .start(proto::StartRequest {
                workflow_type: workflow_type.to_string(),
                task_queue: task_queue.to_string(),
                id: id.to_string(),
                input_json: input.to_string(),
            })
            .await
            .map(|_| ())
            .map_err(|status| WorkflowClientError::Rejected(status.message().to_string()));

        timer.finish_with_result(result.as_ref());
        result
    }

    async fn signal_cancel(&self, id: &str) -> Result<(), WorkflowClientError> {
        let mut client = self.client.clone();
        client
            .signal_cancel(proto::SignalCancelRequest { id: id.to_string() })
            .await
            .map(|_| ())
            .map_err(|status| WorkflowClientError::Rejected(status.message().to_string()))
    }

    async fn query_progress_signals(&self, id: &str) -> Result<Vec<ProgressSignal>, WorkflowClientError> {
        let mut client = self.client.clone();
        let response = client
            .query_progress_signals(proto::QueryProgressSignalsRequest { id: id.to_string() })
            .await
            .map_err(|status| WorkflowClientError::Rejected(status.message().to_string()))?
            .into_inner();

        response
            .signals
            .into_iter()
            .map(|s| {
                let result = s
                    .result_json
                    .map(|j| serde_json::from_str(&j))
                    .transpose()
                    .map_err(|e: serde_json::Error| WorkflowClientError::Malformed(e.to_string()))?;
                Ok(ProgressSignal {
                    task_id: s.task_id,
                    status: s.status,
                    progress: s.progress,
                    result,
                    error: s.error,
                    timestamp: s.timestamp,
                })
            })
            .collect()
    }

    async fn await_completion(&self, id: &str) -> Result<Option<Value>, WorkflowClientError> {
        let timer = OpTimer::new("workflow_client", "await_completion");
        let mut client = self.client.clone();

        let response = client
            .await_completion(proto::AwaitCompletionRequest { id: id.to_string() })
            .await
            .map_err(|status| WorkflowClientError::Rejected(status.message().to_string()));

        let response = match response {
            Ok(r) => r.into_inner(),
            Err(e) => {
                timer.finish_with_result(Err::<(), _>(&e));
                return Err(e);
            }
        };

        timer.finish();

        if let Some(error) = response.error {
            return Err(WorkflowClientError::WorkflowFailed(error));
        }

        response
            .result_json
            .map(|j| serde_json::from_str(&j))
            .transpose()
            .map_err(|e: serde_json::Error| WorkflowClientError::Malformed(e.to_string()))
    }
}
