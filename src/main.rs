use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use datadog_secrets_engine::{
    api::{start_api_server, AppState},
    backend::factory,
    init_logging,
    logical::{BackendConfig, InmemStorage},
    observability::log_config_info,
    AppConfig, APP_NAME, VERSION,
};

/// Dev server for the Datadog secrets engine.
///
/// Mounts the engine over in-memory storage; nothing survives a restart.
#[derive(Parser, Debug)]
#[command(name = "datadog-secrets-engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long)]
    bind_address: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Lease TTL used when a role sets none, e.g. "768h"
    #[arg(long, value_parser = humantime::parse_duration)]
    default_lease_ttl: Option<Duration>,

    /// Upper bound for lease TTLs when a role sets none
    #[arg(long, value_parser = humantime::parse_duration)]
    max_lease_ttl: Option<Duration>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bind_address) = &self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(log_level) = &self.log_level {
            config.observability.log_level = log_level.clone();
        }
        if self.json_logs {
            config.observability.json_logging = true;
        }
    }

    fn backend_config(&self) -> BackendConfig {
        let defaults = BackendConfig::default();
        BackendConfig {
            default_lease_ttl: self.default_lease_ttl.unwrap_or(defaults.default_lease_ttl),
            max_lease_ttl: self.max_lease_ttl.unwrap_or(defaults.max_lease_ttl),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env file if it exists; must happen before config is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.observability).context("Failed to initialize logging")?;
    info!(app_name = APP_NAME, version = VERSION, "Starting Datadog secrets engine dev server");
    log_config_info(&config);

    let backend = factory(cli.backend_config()).context("Failed to build backend")?;
    let state = AppState::new(backend, Arc::new(InmemStorage::new()));

    start_api_server(&config.server, state).await.context("API server failed")?;

    info!("Datadog secrets engine stopped");
    Ok(())
}
