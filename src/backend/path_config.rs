use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use super::DatadogBackend;
use crate::datadog::client::parse_base_url;
use crate::errors::{Error, Result, ResultExt};
use crate::logical::{
    FieldData, FieldSchema, FieldType, Operation, Path, Request, Response, Storage, StorageEntry,
};
use crate::secrets::SecretString;

pub const CONFIG_STORAGE_PATH: &str = "config";

const HELP_SYNOPSIS: &str = "Configure the datadog backend";
const HELP_DESCRIPTION: &str = r#"
The Datadog secret backend requires credentials for managing
API and App keys.

You must provide an API and App key scoped at
least with the ability to create an API and
App key before using this secrets backend.
"#;

/// Root credentials stored at `config`.
///
/// Key values are persisted in clear; the host seal-wraps this entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatadogConfig {
    #[serde(serialize_with = "SecretString::serialize_exposed", default)]
    pub api_key: SecretString,

    #[serde(serialize_with = "SecretString::serialize_exposed", default)]
    pub app_key: SecretString,

    #[serde(default)]
    pub api_key_id: String,

    #[serde(default)]
    pub app_key_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl DatadogConfig {
    /// Response data; key values are never returned
    fn to_response_data(&self) -> Value {
        let mut data = Map::new();
        data.insert("api_key_id".to_string(), json!(self.api_key_id));
        data.insert("app_key_id".to_string(), json!(self.app_key_id));
        if let Some(api_url) = &self.api_url {
            data.insert("api_url".to_string(), json!(api_url));
        }
        Value::Object(data)
    }
}

pub(super) fn path() -> Result<Path<DatadogBackend>> {
    Ok(Path::<DatadogBackend>::new("config")?
        .field(
            "api_key",
            FieldSchema::new(FieldType::String, "The API Key for accessing datadog's API")
                .required()
                .display("API Key")
                .sensitive(),
        )
        .field(
            "app_key",
            FieldSchema::new(
                FieldType::String,
                "The Application Key scoped to admin level privileges",
            )
            .display("Application Key")
            .sensitive(),
        )
        .field(
            "api_key_id",
            FieldSchema::new(FieldType::String, "Datadog id of the root API Key"),
        )
        .field(
            "app_key_id",
            FieldSchema::new(FieldType::String, "Datadog id of the root Application Key"),
        )
        .field(
            "api_url",
            FieldSchema::new(
                FieldType::String,
                "Datadog API base URL. Defaults to https://api.datadoghq.com",
            ),
        )
        .operation(Operation::Read, |b, req, d| Box::pin(b.path_config_read(req, d)))
        .operation(Operation::Create, |b, req, d| Box::pin(b.path_config_write(req, d)))
        .operation(Operation::Update, |b, req, d| Box::pin(b.path_config_write(req, d)))
        .operation(Operation::Delete, |b, req, d| Box::pin(b.path_config_delete(req, d)))
        .existence_check(|b, req, d| Box::pin(b.path_config_exists(req, d)))
        .help(HELP_SYNOPSIS, HELP_DESCRIPTION))
}

impl DatadogBackend {
    async fn path_config_read(&self, req: &Request, _d: &FieldData) -> Result<Option<Response>> {
        let Some(config) = get_config(req.storage.as_ref()).await? else {
            return Ok(None);
        };

        Ok(Some(Response::with_data(config.to_response_data())))
    }

    async fn path_config_write(&self, req: &Request, d: &FieldData) -> Result<Option<Response>> {
        let create = req.operation == Operation::Create;

        let mut config = match get_config(req.storage.as_ref()).await? {
            Some(config) => config,
            None if create => DatadogConfig::default(),
            None => return Err(Error::not_found("config not found during update operation")),
        };

        match d.get_ok_string("api_key")? {
            Some(api_key) => config.api_key = SecretString::new(api_key),
            None if create => return Err(Error::validation("missing API Key in configuration")),
            None => {}
        }

        match d.get_ok_string("app_key")? {
            Some(app_key) => config.app_key = SecretString::new(app_key),
            None if create => {
                return Err(Error::validation("missing Application Key in configuration"))
            }
            None => {}
        }

        if let Some(api_key_id) = d.get_ok_string("api_key_id")? {
            config.api_key_id = api_key_id;
        }
        if let Some(app_key_id) = d.get_ok_string("app_key_id")? {
            config.app_key_id = app_key_id;
        }

        if let Some(api_url) = d.get_ok_string("api_url")? {
            if api_url.is_empty() {
                config.api_url = None;
            } else {
                parse_base_url(&api_url).map_err(|e| Error::validation(e.to_string()))?;
                config.api_url = Some(api_url);
            }
        }

        put_config(req.storage.as_ref(), &config).await?;
        self.reset().await;

        info!(
            operation = %req.operation,
            api_key_id = %config.api_key_id,
            app_key_id = %config.app_key_id,
            "Datadog root configuration written"
        );

        Ok(None)
    }

    async fn path_config_delete(&self, req: &Request, _d: &FieldData) -> Result<Option<Response>> {
        req.storage.delete(CONFIG_STORAGE_PATH).await?;
        self.reset().await;

        info!("Datadog root configuration deleted");
        Ok(None)
    }

    async fn path_config_exists(&self, req: &Request, _d: &FieldData) -> Result<bool> {
        let entry = req.storage.get(CONFIG_STORAGE_PATH).await.context("existence check failed")?;
        Ok(entry.is_some())
    }
}

/// Load the stored config, `None` when not configured
pub async fn get_config(storage: &dyn Storage) -> Result<Option<DatadogConfig>> {
    let Some(entry) = storage.get(CONFIG_STORAGE_PATH).await? else {
        return Ok(None);
    };

    entry.decode_json().map(Some).context("error reading root configuration")
}

pub(super) async fn put_config(storage: &dyn Storage, config: &DatadogConfig) -> Result<()> {
    storage.put(StorageEntry::from_json(CONFIG_STORAGE_PATH, config)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::InmemStorage;

    #[tokio::test]
    async fn test_stored_config_keeps_key_values() {
        let storage = InmemStorage::new();
        let config = DatadogConfig {
            api_key: "0f1e2d3c".into(),
            app_key: "a9b8c7d6".into(),
            api_key_id: "id-1".to_string(),
            ..Default::default()
        };
        put_config(&storage, &config).await.unwrap();

        let raw = storage.get(CONFIG_STORAGE_PATH).await.unwrap().unwrap();
        let text = String::from_utf8(raw.value).unwrap();
        assert!(text.contains("0f1e2d3c"));
        assert!(!text.contains("api_url"));

        assert_eq!(get_config(&storage).await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn test_corrupt_config_is_reported() {
        let storage = InmemStorage::new();
        storage.put(StorageEntry::new(CONFIG_STORAGE_PATH, b"{".to_vec())).await.unwrap();

        let err = get_config(&storage).await.unwrap_err();
        assert!(err.to_string().starts_with("error reading root configuration"));
    }

    #[test]
    fn test_response_data_omits_key_values() {
        let config = DatadogConfig {
            api_key: "0f1e2d3c".into(),
            app_key: "a9b8c7d6".into(),
            api_key_id: "id-1".to_string(),
            app_key_id: "id-2".to_string(),
            api_url: Some("https://api.datadoghq.eu".to_string()),
        };

        let data = config.to_response_data();
        assert_eq!(
            data,
            json!({
                "api_key_id": "id-1",
                "app_key_id": "id-2",
                "api_url": "https://api.datadoghq.eu"
            })
        );
        assert!(!data.to_string().contains("0f1e2d3c"));
    }
}
