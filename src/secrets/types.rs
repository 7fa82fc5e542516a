//! Redacting holder for root Datadog credentials.
//!
//! Root API and Application keys pass through config writes, storage and the
//! HTTP client. [`SecretString`] keeps them out of logs, Debug output and API
//! responses, and zeroes its memory on drop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// - Debug output shows `SecretString([REDACTED])`
/// - Display output shows `[REDACTED]`
/// - Serialization outputs `"[REDACTED]"` unless a field opts in with
///   `#[serde(serialize_with = "SecretString::serialize_exposed")]`, which
///   is reserved for the seal-wrapped `config` storage entry
/// - Deserialization accepts the actual value
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value.
    ///
    /// Only for building request headers and persisting to host storage.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Serializes the real value. Use as a `serialize_with` target on
    /// storage-only structs.
    pub fn serialize_exposed<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(secret.expose_secret())
    }

    /// Returns the length of the secret without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Default for SecretString {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_APP_KEY: &str = "b8fbb773f987b9b06cbced638d7dfc68cb3c7940";

    #[test]
    fn test_debug_and_display_are_redacted() {
        let secret = SecretString::new(ROOT_APP_KEY);

        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose_secret(), ROOT_APP_KEY);
    }

    #[test]
    fn test_default_serialization_redacts() {
        #[derive(Serialize)]
        struct Credentials {
            app_key_id: String,
            app_key: SecretString,
        }

        let creds = Credentials {
            app_key_id: "1e962ce6-b12a-4a87-bbb2-07fe5986334c".to_string(),
            app_key: SecretString::new(ROOT_APP_KEY),
        };
        let json = serde_json::to_string(&creds).unwrap();

        assert!(json.contains("1e962ce6"));
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains(ROOT_APP_KEY));
    }

    #[test]
    fn test_serialize_exposed_writes_real_value() {
        #[derive(Serialize, Deserialize)]
        struct StoredCredentials {
            #[serde(serialize_with = "SecretString::serialize_exposed")]
            app_key: SecretString,
        }

        let stored = StoredCredentials { app_key: SecretString::new(ROOT_APP_KEY) };
        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.contains(ROOT_APP_KEY));

        let decoded: StoredCredentials = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.app_key, stored.app_key);
    }

    #[test]
    fn test_length_and_empty() {
        assert_eq!(SecretString::new("12345").len(), 5);
        assert!(SecretString::default().is_empty());
    }
}
