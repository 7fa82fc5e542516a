use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::Secret;

/// Engine reply to a host request.
///
/// User errors are reported as a response whose data holds a single `error`
/// key, which the host turns into a client error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<Secret>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Response {
    /// Response carrying `data`. Non-object values produce empty data.
    pub fn with_data(data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { data, ..Default::default() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_data(json!({ "error": message.into() }))
    }

    pub fn list<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        Self::with_data(json!({ "keys": keys }))
    }

    /// Response issuing a lease; `data` is returned to the caller.
    pub fn secret(secret: Secret, data: Value) -> Self {
        Self { secret: Some(secret), ..Self::with_data(data) }
    }

    pub fn is_error(&self) -> bool {
        self.data.len() == 1 && self.data.contains_key("error")
    }

    pub fn error_message(&self) -> Option<&str> {
        if self.is_error() {
            self.data.get("error").and_then(Value::as_str)
        } else {
            None
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
