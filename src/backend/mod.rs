//! # Datadog Secrets Backend
//!
//! Path handlers and lease callbacks for issuing Datadog API and
//! Application keys. Paths:
//!
//! - `config`, `config/rotate`: root credentials
//! - `roles/<name>`, `roles/`: role policy
//! - `apikey/<name>`, `appkey/<name>`: key issuance
//!
//! The only in-process state is the lazily built [`DatadogClient`]; it is
//! dropped whenever the config changes.

mod path_api_key;
mod path_app_key;
mod path_config;
mod path_config_rotate;
mod path_roles;
pub mod scopes;
mod secret_api_key;
mod secret_app_key;

pub use path_config::{get_config, DatadogConfig, CONFIG_STORAGE_PATH};
pub use path_roles::{get_role, DatadogRoleEntry, ROLE_STORAGE_PREFIX};
pub use secret_api_key::DATADOG_API_KEY_TYPE;
pub use secret_app_key::DATADOG_APP_KEY_TYPE;

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::datadog::DatadogClient;
use crate::errors::{Error, Result, ResultExt};
use crate::logical::{Backend, BackendConfig, Request, Response, Storage};

const BACKEND_HELP: &str = r#"
The datadog secrets backend allows for the dynamic generation of
datadog API and App keys. After mounting this backend, credentials to
interact with the datadog API must be configured with the /config
endpoints.
"#;

/// Plugin state shared by every handler
#[derive(Debug, Default)]
pub struct DatadogBackend {
    client: RwLock<Option<Arc<DatadogClient>>>,
}

impl DatadogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached client; the next call rebuilds it from storage
    pub async fn reset(&self) {
        *self.client.write().await = None;
    }

    pub async fn invalidate(&self, key: &str) {
        if key == CONFIG_STORAGE_PATH {
            debug!(key = %key, "Config invalidated, dropping Datadog client");
            self.reset().await;
        }
    }

    /// Whether a client is currently cached
    pub async fn has_client(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// The cached client, built from the stored config on first use.
    ///
    /// A missing config is treated as empty and fails client construction.
    pub async fn get_client(&self, storage: &dyn Storage) -> Result<Arc<DatadogClient>> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(Arc::clone(client));
        }

        let mut guard = self.client.write().await;
        // Another request may have built it while we waited for the write lock
        if let Some(client) = guard.as_ref() {
            return Ok(Arc::clone(client));
        }

        let config = get_config(storage).await?.unwrap_or_default();
        let client = Arc::new(DatadogClient::new(
            &config.api_key,
            &config.app_key,
            config.api_url.as_deref(),
        )?);

        debug!(base_url = %client.base_url(), "Built Datadog client");
        *guard = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Shared renew callback for both secret types.
    ///
    /// TTLs come from the owning role. When the lease has a max TTL and a
    /// known issue time, the TTL is clamped to what is left of it.
    pub(crate) async fn lease_renew(&self, req: &Request) -> Result<Option<Response>> {
        let secret = req
            .secret
            .as_ref()
            .ok_or_else(|| Error::validation("renew request is missing the secret"))?;

        let role_name = secret
            .internal_str("role")?
            .ok_or_else(|| Error::validation("secret is missing role internal data"))?;

        let role = get_role(req.storage.as_ref(), role_name)
            .await
            .context("error retrieving role")?
            .ok_or_else(|| Error::not_found("error retrieving role: role is nil"))?;

        let mut renewed = secret.clone();
        renewed.apply_role_ttls(role.ttl, role.max_ttl);

        if let Some(remaining) = renewed.remaining_lifetime(Utc::now()) {
            if remaining.is_zero() {
                return Ok(Some(Response::error("lease has reached its max_ttl")));
            }
            if renewed.ttl.is_zero() || renewed.ttl > remaining {
                renewed.ttl = remaining;
            }
        }

        info!(
            secret_type = %renewed.secret_type,
            role = %role_name,
            ttl_secs = renewed.ttl.as_secs(),
            "Renewed Datadog key lease"
        );

        Ok(Some(Response { secret: Some(renewed), ..Default::default() }))
    }
}

/// Construct the backend with all paths and secret types registered
pub fn new_backend() -> Result<Backend<DatadogBackend>> {
    let mut paths = path_roles::paths()?;
    paths.push(path_config::path()?);
    paths.push(path_config_rotate::path()?);
    paths.push(path_api_key::path()?);
    paths.push(path_app_key::path()?);

    Ok(Backend::new(DatadogBackend::new(), BACKEND_HELP.trim())
        .paths(paths)
        .secret(secret_api_key::secret())
        .secret(secret_app_key::secret())
        .seal_wrap_storage(&[CONFIG_STORAGE_PATH, "roles/*"])
        .invalidate_handler(|b, key| Box::pin(b.invalidate(key))))
}

/// Build and set up a backend for a mount
pub fn factory(config: BackendConfig) -> Result<Arc<Backend<DatadogBackend>>> {
    let mut backend = new_backend()?;
    backend.setup(config);

    info!(
        default_lease_ttl_secs = config.default_lease_ttl.as_secs(),
        max_lease_ttl_secs = config.max_lease_ttl.as_secs(),
        "Datadog secrets backend initialized"
    );

    Ok(Arc::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::{InmemStorage, LogicalBackend, Operation, StorageEntry};
    use serde_json::json;

    async fn configured_storage() -> InmemStorage {
        let storage = InmemStorage::new();
        let config = DatadogConfig {
            api_key: "root-api-key".into(),
            app_key: "root-app-key".into(),
            ..Default::default()
        };
        storage.put(StorageEntry::from_json(CONFIG_STORAGE_PATH, &config).unwrap()).await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_get_client_without_config_fails() {
        let b = DatadogBackend::new();
        let err = b.get_client(&InmemStorage::new()).await.unwrap_err();
        assert!(err.to_string().contains("datadog API key was not provided"));
        assert!(!b.has_client().await);
    }

    #[tokio::test]
    async fn test_get_client_is_cached_until_reset() {
        let b = DatadogBackend::new();
        let storage = configured_storage().await;

        let first = b.get_client(&storage).await.unwrap();
        let second = b.get_client(&storage).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        b.reset().await;
        assert!(!b.has_client().await);
        let third = b.get_client(&storage).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_invalidate_only_resets_on_config() {
        let b = DatadogBackend::new();
        let storage = configured_storage().await;
        b.get_client(&storage).await.unwrap();

        b.invalidate("roles/ci").await;
        assert!(b.has_client().await);

        b.invalidate("config").await;
        assert!(!b.has_client().await);
    }

    #[tokio::test]
    async fn test_factory_registers_paths_and_secrets() {
        let backend = factory(BackendConfig::default()).unwrap();

        assert!(backend.secret_type(DATADOG_API_KEY_TYPE).is_some());
        assert!(backend.secret_type(DATADOG_APP_KEY_TYPE).is_some());
        assert_eq!(backend.seal_wrapped_paths(), vec!["config", "roles/*"]);
        assert!(backend.help().starts_with("The datadog secrets backend"));

        let storage: Arc<dyn Storage> = Arc::new(InmemStorage::new());
        let req = Request::new(Operation::Read, "config", storage).with_data(json!({}));
        assert!(backend.handle_request(&req).await.unwrap().is_none());
    }
}
