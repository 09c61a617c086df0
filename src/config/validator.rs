//! Configuration validation for the A2A gateway.
//!
//! Checks every required environment setting and the routing document,
//! collecting *all* problems so an operator sees the complete list in one
//! run rather than fixing issues one at a time.

use std::path::Path;

use super::error::{ConfigResult, ConfigurationError};
use super::routing::RoutingConfig;
use super::AppConfig;

/// Validates an [`AppConfig`] against the environment contract in the
/// interface spec (§6.3) plus the routing document (§4.1, §6.4).
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire application configuration.
    pub fn validate(config: &AppConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if config.workflow_engine.host.trim().is_empty() {
            errors.push(ConfigurationError::missing_required(
                "Temporal host",
                "connecting to the external workflow engine",
                "TEMPORAL_HOST",
            ));
        }

        match &config.workflow_engine.port_raw {
            None => errors.push(ConfigurationError::missing_required(
                "Temporal port",
                "connecting to the external workflow engine",
                "TEMPORAL_PORT",
            )),
            Some(raw) if raw.parse::<u16>().is_err() => {
                errors.push(ConfigurationError::invalid(
                    format!("TEMPORAL_PORT '{raw}' is not a valid port number"),
                    "Set TEMPORAL_PORT to a number between 1 and 65535",
                ));
            }
            Some(_) => {}
        }

        if config.workflow_engine.namespace.trim().is_empty() {
            errors.push(ConfigurationError::missing_required(
                "Temporal namespace",
                "connecting to the external workflow engine",
                "TEMPORAL_NAMESPACE",
            ));
        }

        if config.server.port == 0 {
            errors.push(ConfigurationError::missing_required(
                "gateway port",
                "binding the HTTP server",
                "A2A_PORT",
            ));
        }

        match &config.redis.url {
            None => errors.push(ConfigurationError::missing_required(
                "Redis URL",
                "the Task Store",
                "REDIS_URL",
            )),
            Some(url) if !(url.starts_with("redis://") || url.starts_with("rediss://")) => {
                errors.push(ConfigurationError::invalid(
                    format!("REDIS_URL '{url}' has an unsupported scheme"),
                    "Set REDIS_URL to a redis:// or rediss:// URL",
                ));
            }
            Some(_) => {}
        }

        match &config.registry.url {
            None => errors.push(ConfigurationError::missing_required(
                "agent registry URL",
                "the Registry Client",
                "AGENT_REGISTRY_URL",
            )),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                errors.push(ConfigurationError::invalid(
                    format!("AGENT_REGISTRY_URL '{url}' has an unsupported scheme"),
                    "Set AGENT_REGISTRY_URL to an http:// or https:// URL",
                ));
            }
            Some(_) => {}
        }

        if let Err(e) = Self::validate_routing(&config.routing_config_path) {
            match e {
                ConfigurationError::Multiple(errs) => errors.extend(errs),
                e => errors.push(e),
            }
        }

        Self::warn_if_weak_secret(config);

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ConfigurationError::multiple(errors))
        }
    }

    /// Validate the routing document: it must parse, and no configured
    /// `workflowType` may silently equal the prohibited `{agentId}Workflow`
    /// hardcoded pattern (§9 prohibits hardcoded routing).
    fn validate_routing(path: &str) -> ConfigResult<()> {
        let routing = RoutingConfig::load(Path::new(path))?;

        for (agent_id, route) in &routing.routing {
            let hardcoded_pattern = format!("{agent_id}Workflow");
            if route.workflow_type == hardcoded_pattern {
                tracing::warn!(
                    agent_id = %agent_id,
                    workflow_type = %route.workflow_type,
                    "agent routing entry matches the prohibited {{agentId}}Workflow pattern \
                     verbatim; confirm this is intentional, not a leftover hardcoded default"
                );
            }
        }

        Ok(())
    }

    /// Warn (non-fatal) if a configured JWT secret looks weak.
    pub fn warn_if_weak_secret(config: &AppConfig) {
        if let Some(secret) = &config.gateway.jwt_secret {
            if secret.len() < 32 {
                tracing::warn!(
                    "JWT_SECRET is shorter than 32 characters; this is a boundary concern this \
                     core does not enforce, but a short secret is worth fixing before \
                     an auth layer relies on it"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RedisConfig, RegistryConfig, ServerConfig, WorkflowEngineConfig};

    fn base_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
                timeout_secs: 300,
            },
            workflow_engine: WorkflowEngineConfig {
                host: "localhost".into(),
                port_raw: Some("7233".into()),
                namespace: "default".into(),
            },
            redis: RedisConfig {
                url: Some("redis://localhost:6379".into()),
            },
            registry: RegistryConfig {
                url: Some("http://localhost:9000".into()),
            },
            routing_config_path: "config/agent-routing.yaml".into(),
            logging: crate::config::LoggingConfig::default(),
            gateway: crate::config::GatewayConfig::default(),
        }
    }

    #[test]
    fn missing_redis_url_is_fatal() {
        let mut config = base_config();
        config.redis.url = None;
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Redis URL"));
    }

    #[test]
    fn bad_temporal_port_is_fatal() {
        let mut config = base_config();
        config.workflow_engine.port_raw = Some("not-a-number".into());
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("TEMPORAL_PORT"));
    }

    #[test]
    fn redis_url_wrong_scheme_is_fatal() {
        let mut config = base_config();
        config.redis.url = Some("http://localhost:6379".into());
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn multiple_problems_are_all_reported() {
        let mut config = base_config();
        config.redis.url = None;
        config.registry.url = None;
        config.routing_config_path = "/nonexistent/path/routing.yaml".into();
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.is_multiple());
        assert!(err.count() >= 3);
    }
}
