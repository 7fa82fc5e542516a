use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::path_roles::get_role;
use super::secret_app_key::DATADOG_APP_KEY_TYPE;
use super::DatadogBackend;
use crate::errors::{Result, ResultExt};
use crate::logical::{
    generic_name_regex, FieldData, FieldSchema, FieldType, Operation, Path, Request, Response,
    Secret,
};

const HELP_SYNOPSIS: &str = "Generate a datadog Application Key from a role.";
const HELP_DESCRIPTION: &str = r#"
This path generates a datadog Application Key based on a particular
role. The key carries the scopes configured on the role.
"#;

pub(super) fn path() -> Result<Path<DatadogBackend>> {
    Ok(Path::<DatadogBackend>::new(format!("appkey/{}", generic_name_regex("name")))?
        .field("name", FieldSchema::new(FieldType::LowerCaseString, "Name of the role").required())
        .operation(Operation::Read, |b, req, d| Box::pin(b.path_app_key_read(req, d)))
        .operation(Operation::Update, |b, req, d| Box::pin(b.path_app_key_read(req, d)))
        .help(HELP_SYNOPSIS, HELP_DESCRIPTION))
}

impl DatadogBackend {
    async fn path_app_key_read(&self, req: &Request, d: &FieldData) -> Result<Option<Response>> {
        let role_name = d.get_string("name")?;
        let storage = req.storage.as_ref();

        let Some(role) = get_role(storage, &role_name).await.context("error retrieving role")?
        else {
            return Ok(Some(Response::error(format!("role not found: {}", role_name))));
        };

        let client = self.get_client(storage).await.context("error getting client")?;

        let key_name = format!("{}-{}", role_name, Uuid::new_v4());
        let app_key = client
            .create_app_key(&key_name, Some(role.app_key_scopes.as_slice()))
            .await
            .context("error creating datadog application key")?;

        let mut secret = Secret::new(DATADOG_APP_KEY_TYPE)
            .with_internal("app_key_id", app_key.app_key_id.as_str())
            .with_internal("role", role.name.as_str());
        secret.apply_role_ttls(role.ttl, role.max_ttl);

        info!(
            role = %role.name,
            app_key_id = %app_key.app_key_id,
            key_name = %key_name,
            scopes = role.app_key_scopes.len(),
            "Issued Datadog application key"
        );

        Ok(Some(Response::secret(
            secret,
            json!({ "app_key": app_key.app_key.expose_secret() }),
        )))
    }
}
