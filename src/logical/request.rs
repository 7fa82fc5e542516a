use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::{Operation, Secret, Storage};

/// A request routed to the engine by the host.
#[derive(Clone)]
pub struct Request {
    pub operation: Operation,

    /// Mount-relative path, without a leading slash
    pub path: String,

    /// Request body fields
    pub data: Map<String, Value>,

    /// Storage view scoped to the mount
    pub storage: Arc<dyn Storage>,

    /// The lease being renewed or revoked
    pub secret: Option<Secret>,
}

impl Request {
    pub fn new(operation: Operation, path: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        let path = path.into();
        Self {
            operation,
            path: path.trim_start_matches('/').to_string(),
            data: Map::new(),
            storage,
            secret: None,
        }
    }

    /// Set the request body. Non-object values are ignored.
    pub fn with_data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
        self
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field values may carry root credentials
        let fields: Vec<&String> = self.data.keys().collect();
        f.debug_struct("Request")
            .field("operation", &self.operation)
            .field("path", &self.path)
            .field("fields", &fields)
            .field("secret_type", &self.secret.as_ref().map(|s| s.secret_type.as_str()))
            .finish()
    }
}
