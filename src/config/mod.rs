//! Configuration management for the A2A gateway.
//!
//! Configuration is loaded from environment variables (optionally via a
//! local `.env` file) and validated as a single fail-fast step at startup:
//! every problem is collected and reported together, rather than stopping
//! at the first one.
//!
//! ```rust,ignore
//! use a2a_gateway::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! ```

pub mod error;
pub mod routing;
pub mod validator;

pub use error::{ConfigResult, ConfigurationError};
pub use routing::RoutingConfig;
pub use validator::ConfigValidator;

use serde::{Deserialize, Serialize};

/// Main application configuration, loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Workflow engine connection configuration.
    pub workflow_engine: WorkflowEngineConfig,
    /// Task Store (Redis) configuration.
    pub redis: RedisConfig,
    /// Agent registry configuration.
    pub registry: RegistryConfig,
    /// Agent routing table location.
    #[serde(default)]
    pub routing_config_path: String,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Gateway auth/tracing toggles.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Load configuration from the environment and validate it.
    ///
    /// Returns every configuration problem found, not just the first one.
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::load_unchecked()?;

        ConfigValidator::validate(&config)
            .map_err(|e| anyhow::anyhow!("Configuration validation failed:\n\n{e}"))?;

        Ok(config)
    }

    /// Load configuration without validation. Useful for tests that want to
    /// construct a config and validate it separately.
    pub fn load_unchecked() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.timeout_secs", 300)?
            .add_source(
                config::Environment::with_prefix("A2A")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = builder.try_deserialize().unwrap_or_else(|_| AppConfig {
            server: ServerConfig::default(),
            workflow_engine: WorkflowEngineConfig::default(),
            redis: RedisConfig::default(),
            registry: RegistryConfig::default(),
            routing_config_path: default_routing_path(),
            logging: LoggingConfig::default(),
            gateway: GatewayConfig::default(),
        });

        // Named environment variables override the generic layer, matching
        // the explicit env-var contract in the interface spec.
        if let Ok(port) = std::env::var("A2A_PORT") {
            if let Ok(p) = port.parse() {
                app_config.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("TEMPORAL_HOST") {
            app_config.workflow_engine.host = host;
        }
        if let Ok(port) = std::env::var("TEMPORAL_PORT") {
            app_config.workflow_engine.port_raw = Some(port);
        }
        if let Ok(ns) = std::env::var("TEMPORAL_NAMESPACE") {
            app_config.workflow_engine.namespace = ns;
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            app_config.redis.url = Some(url);
        }
        if let Ok(url) = std::env::var("AGENT_REGISTRY_URL") {
            app_config.registry.url = Some(url);
        }
        if let Ok(path) = std::env::var("AGENT_ROUTING_CONFIG") {
            app_config.routing_config_path = path;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            app_config.logging.level = level;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            app_config.gateway.jwt_secret = Some(secret);
        }
        if let Ok(flag) = std::env::var("ENABLE_TRACING") {
            app_config.gateway.enable_tracing = flag.eq_ignore_ascii_case("true");
        }

        Ok(app_config)
    }
}

fn default_routing_path() -> String {
    "config/agent-routing.yaml".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// A2A gateway port (`A2A_PORT`).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout, applied to non-streaming handlers.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

/// External durable workflow engine connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowEngineConfig {
    /// `TEMPORAL_HOST`.
    #[serde(default)]
    pub host: String,
    /// Raw `TEMPORAL_PORT` string, validated numerically by [`ConfigValidator`].
    #[serde(default)]
    pub port_raw: Option<String>,
    /// `TEMPORAL_NAMESPACE`.
    #[serde(default)]
    pub namespace: String,
}

impl WorkflowEngineConfig {
    /// The validated numeric port, if `port_raw` parses.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port_raw.as_deref().and_then(|p| p.parse().ok())
    }

    /// `host:port` endpoint string for the gRPC channel.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port().unwrap_or(0))
    }
}

/// Task Store (Redis) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisConfig {
    /// `REDIS_URL`, required, must start with `redis://` or `rediss://`.
    pub url: Option<String>,
}

/// Agent registry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// `AGENT_REGISTRY_URL`, required, must start with `http://` or `https://`.
    pub url: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `LOG_LEVEL`, e.g. `info`, `debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON-formatted log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Gateway-wide toggles that are boundary concerns (auth, tracing) rather
/// than core protocol behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `JWT_SECRET`. Optional; this core does not enforce auth, but warns
    /// if a secret is configured and looks weak.
    pub jwt_secret: Option<String>,
    /// `ENABLE_TRACING` — wires an OTLP exporter if true.
    #[serde(default)]
    pub enable_tracing: bool,
}
