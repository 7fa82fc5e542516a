//! Error types for Datadog API calls.

use thiserror::Error;

/// Result type for Datadog client operations.
pub type Result<T> = std::result::Result<T, DatadogError>;

/// Errors that can occur while talking to the Datadog key-management API.
#[derive(Error, Debug)]
pub enum DatadogError {
    /// Client could not be built from the supplied configuration.
    #[error("{message}")]
    Config { message: String },

    /// Request never produced an HTTP response.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Datadog answered with a non-success status.
    #[error("Datadog API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// Request arguments rejected before sending.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Response body did not have the expected shape.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl DatadogError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse { message: message.into() }
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
