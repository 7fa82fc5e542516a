//! # Datadog Secrets Engine
//!
//! A secrets-engine plugin that issues and revokes Datadog API and Application
//! keys on behalf of a secrets-management host. Operators configure root
//! credentials and named roles; clients read a role's issuing path and receive
//! a freshly minted key bound to a host-managed lease.
//!
//! ## Architecture
//!
//! ```text
//! Host request → logical::framework::Backend → backend path handlers → datadog::DatadogClient
//!                      ↓                                ↓
//!               lease renew/revoke                host Storage (config, roles/*)
//! ```
//!
//! ## Core Components
//!
//! - **Host contract** ([`logical`]): requests, responses, lease descriptors,
//!   field schemas, storage trait and the path router
//! - **Backend** ([`backend`]): the `config`, `config/rotate`, `roles`,
//!   `apikey` and `appkey` paths plus the two secret types
//! - **Datadog client** ([`datadog`]): key-management calls over reqwest
//! - **Dev server** ([`api`]): axum surface that mounts the backend over
//!   in-memory storage
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use datadog_secrets_engine::backend::factory;
//! use datadog_secrets_engine::logical::{
//!     BackendConfig, InmemStorage, LogicalBackend, Operation, Request,
//! };
//! use serde_json::json;
//!
//! # async fn run() -> datadog_secrets_engine::Result<()> {
//! let backend = factory(BackendConfig::default())?;
//! let storage = Arc::new(InmemStorage::new());
//!
//! let request = Request::new(Operation::Create, "config", storage.clone())
//!     .with_data(json!({ "api_key": "...", "app_key": "..." }));
//! backend.handle_request(&request).await?;
//!
//! let issued = backend
//!     .handle_request(&Request::new(Operation::Read, "apikey/ci", storage))
//!     .await?;
//! # let _ = issued;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod datadog;
pub mod errors;
pub mod logical;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result, ResultExt};
pub use observability::init_logging;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
