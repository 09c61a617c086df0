//! A2A Protocol Gateway
//!
//! A JSON-RPC 2.0 / SSE gateway fronting durable workflow-engine-backed
//! agent workers, speaking the Agent-to-Agent protocol v0.2.5.
//!
//! - **Config**: environment- and routing-document-driven agent resolution
//! - **Task Store**: Redis-backed projection of durable task state
//! - **Registry Client**: passthrough HTTP client to the agent registry
//! - **Workflow Client**: gRPC interface over the external workflow engine
//! - **Gateway**: JSON-RPC dispatch, task lifecycle, streaming bridge
//!
//! # Architecture
//!
//! - [`config`]: Configuration management and environment loading
//! - [`domain`]: Core domain models (task, message, progress signal)
//! - [`events`]: A2A SSE event model and signal translation
//! - [`store`]: Redis-backed Task Store
//! - [`registry`]: Agent Registry Client
//! - [`workflow`]: Workflow Client (gRPC)
//! - [`gateway`]: JSON-RPC dispatcher, task lifecycle, streaming bridge
//! - [`api`]: Health, metrics, and error-taxonomy endpoints
//!
//! # Example
//!
//! ```rust,ignore
//! use a2a_gateway::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let app = create_app(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod config;
pub mod domain;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod store;
pub mod workflow;

use std::collections::HashMap;
use std::sync::Arc;

use config::routing::AgentRoute;
use config::AppConfig;
use registry::RegistryClient;
use store::TaskStore;
use workflow::WorkflowClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// `agentId -> {taskQueue, workflowType}`, loaded once at startup.
    pub routing: Arc<HashMap<String, AgentRoute>>,
    /// The Task Store.
    pub store: Arc<dyn TaskStore>,
    /// The Workflow Client.
    pub workflow_client: Arc<dyn WorkflowClient>,
    /// The Registry Client.
    pub registry: Arc<RegistryClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"AppConfig")
            .field("routing", &format!("{} agents", self.routing.len()))
            .field("store", &"TaskStore")
            .field("workflow_client", &"WorkflowClient")
            .field("registry", &"RegistryClient")
            .finish()
    }
}
