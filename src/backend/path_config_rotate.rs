use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::path_config::{get_config, put_config};
use super::DatadogBackend;
use crate::errors::{Result, ResultExt};
use crate::logical::{FieldData, Operation, Path, Request, Response};

const HELP_SYNOPSIS: &str = "Rotate the datadog API and App keys.";
const HELP_DESCRIPTION: &str = r#"
This will rotate the datadog API and App keys that are
used to interact with the datadog platform.
"#;

pub(super) fn path() -> Result<Path<DatadogBackend>> {
    Ok(Path::<DatadogBackend>::new("config/rotate")?
        .operation(Operation::Read, |b, req, d| Box::pin(b.path_config_rotate(req, d)))
        .help(HELP_SYNOPSIS, HELP_DESCRIPTION))
}

impl DatadogBackend {
    async fn path_config_rotate(&self, req: &Request, _d: &FieldData) -> Result<Option<Response>> {
        let storage = req.storage.as_ref();

        let Some(mut config) = get_config(storage).await.context("error getting config")? else {
            return Ok(Some(Response::error("configuration not set")));
        };

        let client = self.get_client(storage).await.context("error getting client")?;

        let old_api_key_id = std::mem::take(&mut config.api_key_id);
        let old_app_key_id = std::mem::take(&mut config.app_key_id);

        let name = format!("vault-config-{}", Uuid::new_v4());
        let api_key = client.create_api_key(&name).await.context("error rotating API key")?;
        // Root application key stays unscoped
        let app_key = match client.create_app_key(&name, None).await {
            Ok(app_key) => app_key,
            Err(e) => {
                warn!(
                    orphaned_api_key_id = %api_key.api_key_id,
                    error = %e,
                    "Application key rotation failed; new root API key was left in Datadog"
                );
                return Err(e).context("error rotating App key");
            }
        };

        config.api_key = api_key.api_key;
        config.api_key_id = api_key.api_key_id;
        config.app_key = app_key.app_key;
        config.app_key_id = app_key.app_key_id;
        put_config(storage, &config).await?;

        self.reset().await;
        let client = self.get_client(storage).await.context("error getting client")?;

        let mut warnings = Vec::new();
        if old_api_key_id.is_empty() {
            warn!("Previous root API key id unknown, not deleting it");
            warnings.push("previous api_key_id unknown, old API key was not deleted");
        } else {
            client
                .delete_api_key(&old_api_key_id)
                .await
                .context("error deleting datadog API key")?;
        }

        if old_app_key_id.is_empty() {
            warn!("Previous root application key id unknown, not deleting it");
            warnings.push("previous app_key_id unknown, old application key was not deleted");
        } else {
            client
                .delete_app_key(&old_app_key_id)
                .await
                .context("error deleting datadog application key")?;
        }

        info!(
            api_key_id = %config.api_key_id,
            app_key_id = %config.app_key_id,
            previous_api_key_id = %old_api_key_id,
            previous_app_key_id = %old_app_key_id,
            "Rotated Datadog root credentials"
        );

        let mut response = Response::with_data(json!({
            "api_key_id": config.api_key_id,
            "app_key_id": config.app_key_id,
        }));
        for warning in warnings {
            response.add_warning(warning);
        }
        Ok(Some(response))
    }
}

