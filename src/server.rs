//! HTTP server setup and middleware: the staged boot sequence that turns
//! an [`AppConfig`] into a runnable [`Router`].

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, RoutingConfig};
use crate::logging::OpTimer;
use crate::registry::RegistryClient;
use crate::store::{RedisTaskStore, TaskStore};
use crate::workflow::WorkflowClient;
use crate::{api, gateway, log_banner, log_init_step, log_success, metrics, AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the application: load routing, connect to Redis, the registry,
/// and the workflow engine, then assemble the router with its
/// middleware stack.
pub async fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");

    log_banner!(
        format!("A2A Protocol Gateway v{VERSION}"),
        format!("Listening for agent: {}", config.workflow_engine.endpoint())
    );

    // [1/5] Load the routing table.
    let step_timer = OpTimer::new("server", "routing");
    let routing_path = std::path::Path::new(&config.routing_config_path);
    let routing = RoutingConfig::load(routing_path)?;
    log_init_step!(
        1,
        5,
        "Routing table",
        format!("{} agent(s) configured", routing.routing.len())
    );
    step_timer.finish();

    // [2/5] Connect to Redis (Task Store).
    let step_timer = OpTimer::new("server", "redis");
    let redis_url = config
        .redis
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("REDIS_URL is required"))?;
    let redis = connect_redis(redis_url).await?;
    log_init_step!(2, 5, "Task Store", format!("connected to {redis_url}"));
    step_timer.finish();

    // [3/5] Build the Registry Client.
    let step_timer = OpTimer::new("server", "registry");
    let registry_url = config
        .registry
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("AGENT_REGISTRY_URL is required"))?;
    let registry = Arc::new(RegistryClient::new(registry_url));
    log_init_step!(3, 5, "Registry Client", registry_url);
    step_timer.finish();

    // [4/5] Connect to the workflow engine.
    let step_timer = OpTimer::new("server", "workflow_client");
    let workflow_client = connect_workflow_client(&config).await?;
    log_init_step!(4, 5, "Workflow Client", config.workflow_engine.endpoint());
    step_timer.finish();

    metrics::init_metrics()?;

    let store = Arc::new(RedisTaskStore::new(redis)) as Arc<dyn TaskStore>;
    spawn_sweep(store.clone());

    let state = AppState {
        config: Arc::new(config.clone()),
        routing: Arc::new(routing.routing),
        store,
        workflow_client,
        registry,
    };

    // [5/5] Assemble the router with its middleware stack.
    let step_timer = OpTimer::new("server", "router");
    let app = Router::new()
        .merge(api::create_router())
        .merge(gateway::create_router())
        .layer(axum::middleware::from_fn(metrics::track_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    log_init_step!(5, 5, "Router", "routes + middleware configured");
    step_timer.finish();

    overall_timer.finish();
    log_success!("A2A gateway assembled successfully");

    Ok(app)
}

async fn connect_redis(url: &str) -> anyhow::Result<redis::aio::ConnectionManager> {
    let client = redis::Client::open(url)?;
    let conn = redis::aio::ConnectionManager::new(client).await?;
    Ok(conn)
}

#[cfg(feature = "grpc")]
async fn connect_workflow_client(config: &AppConfig) -> anyhow::Result<Arc<dyn WorkflowClient>> {
    let client = crate::workflow::GrpcWorkflowClient::connect(&config.workflow_engine.endpoint()).await?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "grpc"))]
async fn connect_workflow_client(_config: &AppConfig) -> anyhow::Result<Arc<dyn WorkflowClient>> {
    anyhow::bail!("no WorkflowClient implementation available: build with the `grpc` feature")
}

/// Spawn the hourly TTL sweep (§4.2). Detached; failures are logged, not
/// propagated.
pub fn spawn_sweep(store: Arc<dyn TaskStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            match store.sweep().await {
                Ok(report) => tracing::info!(
                    reconciled = report.reconciled_indices,
                    force_deleted = report.force_deleted,
                    "task store sweep completed"
                ),
                Err(e) => tracing::error!(error = %e, "task store sweep failed"),
            }
        }
    });
}

