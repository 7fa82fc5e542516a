//! JSON:API payloads for the v2 key-management endpoints.

use serde::{Deserialize, Serialize};

use crate::secrets::SecretString;

pub const API_KEYS_TYPE: &str = "api_keys";
pub const APPLICATION_KEYS_TYPE: &str = "application_keys";

/// `{"data": ...}` envelope used by every request and response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

/// Resource object sent on create
#[derive(Debug, Clone, Serialize)]
pub struct NewResource<A> {
    #[serde(rename = "type")]
    pub resource_type: &'static str,
    pub attributes: A,
}

/// Resource object returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    pub attributes: A,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyCreateAttributes {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppKeyCreateAttributes {
    pub name: String,
    /// `null` creates an unscoped key
    pub scopes: Option<Vec<String>>,
}

/// Attributes of a key resource. `key` is only present on create.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub key: Option<SecretString>,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A freshly created API key
#[derive(Debug, Clone)]
pub struct DatadogApiKey {
    pub api_key_id: String,
    pub api_key: SecretString,
}

/// A freshly created application key
#[derive(Debug, Clone)]
pub struct DatadogAppKey {
    pub app_key_id: String,
    pub app_key: SecretString,
}

/// Listing entry; key values are never part of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySummary {
    pub id: String,
    pub name: Option<String>,
    pub last4: Option<String>,
    pub created_at: Option<String>,
}

impl From<Resource<KeyAttributes>> for KeySummary {
    fn from(resource: Resource<KeyAttributes>) -> Self {
        Self {
            id: resource.id,
            name: resource.attributes.name,
            last4: resource.attributes.last4,
            created_at: resource.attributes.created_at,
        }
    }
}
