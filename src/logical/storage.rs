//! Host storage view.
//!
//! The host hands the engine a [`Storage`] scoped to its mount. Keys are
//! slash-separated paths; `list` returns direct children only.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use crate::errors::{Error, Result};

/// A single key/value entry in host storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Mount-relative storage key
    pub key: String,

    /// Raw entry value
    pub value: Vec<u8>,
}

impl StorageEntry {
    /// Create an entry from raw bytes
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self { key: key.into(), value }
    }

    /// Create an entry holding the JSON encoding of `value`
    pub fn from_json<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self> {
        let key = key.into();
        let value = serde_json::to_vec(value)
            .map_err(|e| Error::serialization(e, format!("encoding storage entry '{}'", key)))?;
        Ok(Self { key, value })
    }

    /// Decode the entry value as JSON
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.value)
            .map_err(|e| Error::serialization(e, format!("decoding storage entry '{}'", self.key)))
    }
}

/// Storage view provided by the host.
///
/// Implementations must be Send + Sync; the host may serve concurrent
/// requests against the same view.
#[async_trait]
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Fetch an entry, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>>;

    /// Insert or replace an entry
    async fn put(&self, entry: StorageEntry) -> Result<()>;

    /// Remove an entry; deleting an absent key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// List the direct children of `prefix`, sorted.
    ///
    /// Nested prefixes are returned once, with a trailing `/`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-memory storage view for tests and the dev server.
#[derive(Debug, Default)]
pub struct InmemStorage {
    entries: RwLock<BTreeMap<String, StorageEntry>>,
}

impl InmemStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for InmemStorage {
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, entry: StorageEntry) -> Result<()> {
        if entry.key.is_empty() {
            return Err(Error::storage("storage key cannot be empty"));
        }
        self.entries.write().await.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        let mut children = BTreeSet::new();

        for key in entries.range(prefix.to_string()..).map(|(k, _)| k) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.find('/') {
                Some(idx) => children.insert(rest[..=idx].to_string()),
                None => children.insert(rest.to_string()),
            };
        }

        Ok(children.into_iter().collect())
    }
}
