//! A2A Protocol Gateway — main entry point.

use clap::Parser;
use mimalloc::MiMalloc;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use a2a_gateway::config::AppConfig;
use a2a_gateway::server::create_app;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Command-line arguments. Every flag also accepts the environment
/// variable named in §6.3, which takes precedence when both are set via
/// [`AppConfig::load`].
#[derive(Parser, Debug)]
#[command(name = "a2a-gateway")]
#[command(about = "Agent-to-Agent protocol gateway fronting durable workflow-backed agents")]
#[command(version)]
struct Args {
    /// Host to bind to.
    #[arg(long, env = "A2A_HOST", default_value = "0.0.0.0")]
    host: String,

    /// A2A gateway port.
    #[arg(short, long, env = "A2A_PORT", default_value = "8080")]
    port: u16,

    /// Log level.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load()?;

    let otel_enabled = config.gateway.enable_tracing;
    init_tracing(&args.log_level, otel_enabled);

    tracing::info!("Starting A2A gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Configuration loaded and validated");

    let app = create_app(config).await?;
    tracing::info!("Application initialized");

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");

    if otel_enabled {
        opentelemetry::global::shutdown_tracer_provider();
    }

    Ok(())
}

/// Initialize tracing/logging. When `enable_otlp` is set (`ENABLE_TRACING`),
/// spans are additionally exported over OTLP to `OTEL_EXPORTER_OTLP_ENDPOINT`
/// (default `http://localhost:4317`); on exporter setup failure this falls
/// back to plain `fmt` logging rather than failing startup.
fn init_tracing(log_level: &str, enable_otlp: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if enable_otlp {
        match build_otel_layer() {
            Ok(otel_layer) => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(otel_layer)
                    .init();
                tracing::info!("OTLP trace export enabled");
                return;
            }
            Err(e) => {
                eprintln!("OTLP exporter setup failed ({e}); continuing without trace export");
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the OTLP span exporter layer and its backing tracer provider.
fn build_otel_layer(
) -> anyhow::Result<tracing_opentelemetry::OpenTelemetryLayer<tracing_subscriber::Registry, opentelemetry_sdk::trace::Tracer>> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "a2a-gateway".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()?;

    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_resource(opentelemetry_sdk::Resource::new(vec![
            opentelemetry::KeyValue::new("service.name", service_name.clone()),
            opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(service_name);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
