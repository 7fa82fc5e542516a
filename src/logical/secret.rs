//! Lease descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::errors::{Error, Result};

/// A lease issued by the engine and tracked by the host.
///
/// `internal_data` is returned to the engine on renew and revoke but never
/// shown to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub secret_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_id: Option<String>,

    #[serde(default, with = "duration_secs")]
    pub ttl: Duration,

    #[serde(default, with = "duration_secs")]
    pub max_ttl: Duration,

    #[serde(default = "default_renewable")]
    pub renewable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub internal_data: Map<String, Value>,
}

fn default_renewable() -> bool {
    true
}

impl Secret {
    pub fn new(secret_type: impl Into<String>) -> Self {
        Self {
            secret_type: secret_type.into(),
            lease_id: None,
            ttl: Duration::ZERO,
            max_ttl: Duration::ZERO,
            renewable: true,
            issue_time: Some(Utc::now()),
            internal_data: Map::new(),
        }
    }

    pub fn with_internal(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.internal_data.insert(key.to_string(), value.into());
        self
    }

    /// An internal string value; a value of any other type is an error.
    pub fn internal_str(&self, key: &str) -> Result<Option<&str>> {
        match self.internal_data.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(Error::validation(format!(
                "invalid value for {} in secret internal data",
                key
            ))),
        }
    }

    /// Take TTL and max TTL from a role, leaving zero values untouched
    pub fn apply_role_ttls(&mut self, ttl: Duration, max_ttl: Duration) {
        if !ttl.is_zero() {
            self.ttl = ttl;
        }
        if !max_ttl.is_zero() {
            self.max_ttl = max_ttl;
        }
    }

    /// Time left before `max_ttl` runs out, `None` when unbounded or the
    /// issue time is unknown
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<Duration> {
        let issued = self.issue_time?;
        if self.max_ttl.is_zero() {
            return None;
        }
        let elapsed = (now - issued).to_std().unwrap_or(Duration::ZERO);
        Some(self.max_ttl.saturating_sub(elapsed))
    }
}

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
