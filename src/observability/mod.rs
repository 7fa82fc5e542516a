//! # Observability Infrastructure
//!
//! Structured logging for the engine and the dev server, plus the HTTP
//! trace layer used by the router.

pub mod http_tracing;
pub mod logging;

pub use http_tracing::trace_http_requests;
pub use logging::{init_logging, log_config_info};
