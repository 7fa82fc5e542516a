//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! `RUST_LOG`, when set, takes precedence over the configured log level.
//! Secret values never reach log fields; handlers log key ids and role
//! names only.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Create a tracing span for an engine request.
///
/// ```rust,ignore
/// let span = request_span!("read", "roles/ci");
/// let span = request_span!("update", "config", mount = "datadog");
/// ```
#[macro_export]
macro_rules! request_span {
    ($operation:expr, $path:expr) => {
        tracing::info_span!(
            "engine_request",
            operation = %$operation,
            path = %$path,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "engine_request",
            operation = %$operation,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Filter from `RUST_LOG`, or from the configured level when unset
pub fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        }),
    }
}

/// Install the global fmt subscriber.
///
/// A subscriber installed earlier (tests, embedding hosts) is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let installed = if config.json_logging {
        fmt().json().with_env_filter(filter).with_current_span(true).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    if installed.is_ok() {
        tracing::info!(
            service_name = %config.service_name,
            log_level = %config.log_level,
            json_logging = config.json_logging,
            "Logging initialized"
        );
    }

    Ok(())
}

/// Log the effective configuration
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        bind_address = %config.server.bind_address,
        port = config.server.port,
        log_level = %config.observability.log_level,
        json_logging = config.observability.json_logging,
        "Datadog secrets engine configuration"
    );
}
