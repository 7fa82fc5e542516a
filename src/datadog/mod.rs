//! # Datadog Key Management
//!
//! Thin client over the Datadog v2 key-management endpoints. It creates,
//! lists and deletes API keys and the current user's application keys,
//! authenticating with the root keys from the engine config.
//!
//! There are no retries. Non-success responses surface as
//! [`DatadogError::Api`] with the status and body Datadog returned.

pub mod client;
pub mod error;
pub mod models;

pub use client::DatadogClient;
pub use error::DatadogError;
pub use models::{DatadogApiKey, DatadogAppKey, KeySummary};

/// Datadog US1 API endpoint
pub const DEFAULT_API_URL: &str = "https://api.datadoghq.com";
