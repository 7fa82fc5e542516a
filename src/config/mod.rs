//! # Configuration Management
//!
//! Settings for the dev server binary, read from `DATADOG_ENGINE_*`
//! environment variables and validated with `validator`. Engine settings
//! (root keys, roles) live in host storage, not here.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::Validate;

use crate::errors::{Error, Result};

const ENV_PREFIX: &str = "DATADOG_ENGINE";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Dev HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Ok(Self { server: ServerConfig::from_env()?, observability: ObservabilityConfig::from_env() })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.server.socket_addr()?;
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Address to bind to
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub bind_address: String,

    /// Port to listen on
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8200 }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_address =
            std::env::var(format!("{}_BIND_ADDRESS", ENV_PREFIX)).unwrap_or(defaults.bind_address);

        let port = match std::env::var(format!("{}_PORT", ENV_PREFIX)) {
            Ok(raw) => raw
                .parse()
                .map_err(|e| Error::config(format!("Invalid {}_PORT '{}': {}", ENV_PREFIX, raw, e)))?,
            Err(_) => defaults.port,
        };

        Ok(Self { bind_address, port })
    }

    /// Parsed socket address for the listener
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port).parse().map_err(|e| {
            Error::config(format!(
                "Invalid server address {}:{}: {}",
                self.bind_address, self.port, e
            ))
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_level =
            std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)).unwrap_or(defaults.log_level);

        let json_logging = std::env::var(format!("{}_JSON_LOGS", ENV_PREFIX))
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.json_logging);

        Self { service_name: defaults.service_name, log_level, json_logging }
    }
}
