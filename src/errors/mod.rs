//! # Error Handling
//!
//! Error types for the Datadog secrets engine, defined with `thiserror`.
//!
//! Handlers add context by wrapping ([`ResultExt::context`]) and otherwise
//! return errors unmodified; there is no local recovery or retry.

use crate::datadog::DatadogError;
use crate::logical::Operation;

/// Custom result type for secrets engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the secrets engine
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request or field validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Host storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Errors returned by the Datadog API client
    #[error("Datadog error: {0}")]
    Datadog(#[from] DatadogError),

    /// No path registered on the backend matches the request path
    #[error("unsupported path: {0}")]
    UnsupportedPath(String),

    /// The matched path does not handle the requested operation
    #[error("unsupported operation '{operation}' on path '{path}'")]
    UnsupportedOperation { operation: Operation, path: String },

    /// Network transport errors for the dev HTTP surface
    #[error("Transport error: {0}")]
    Transport(String),

    /// An error wrapped with the operation that produced it
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage(message.into())
    }

    /// Create a serialization error with context
    pub fn serialization<S: Into<String>>(source: serde_json::Error, context: S) -> Self {
        Self::Serialization { source, context: context.into() }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Wrap this error with additional context
    pub fn wrap<S: Into<String>>(self, context: S) -> Self {
        Self::Context { context: context.into(), source: Box::new(self) }
    }

    /// The innermost error beneath any context wrappers
    pub fn root(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the root cause is a Datadog API or transport failure
    pub fn is_datadog(&self) -> bool {
        matches!(self.root(), Self::Datadog(_))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Attach context to a fallible result.
pub trait ResultExt<T> {
    /// Wrap the error, if any, as `"{context}: {error}"`
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| e.into().wrap(context))
    }
}
