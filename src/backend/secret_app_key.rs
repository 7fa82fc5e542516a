use tracing::info;

use super::DatadogBackend;
use crate::errors::{Error, Result, ResultExt};
use crate::logical::{FieldData, FieldSchema, FieldType, Request, Response, SecretType};

pub const DATADOG_APP_KEY_TYPE: &str = "datadog_app_key";

pub(super) fn secret() -> SecretType<DatadogBackend> {
    SecretType::<DatadogBackend>::new(DATADOG_APP_KEY_TYPE)
        .field("app_key", FieldSchema::new(FieldType::String, "datadog Application Key"))
        .renew(|b, req, _d| Box::pin(b.lease_renew(req)))
        .revoke(|b, req, d| Box::pin(b.app_key_revoke(req, d)))
}

impl DatadogBackend {
    async fn app_key_revoke(&self, req: &Request, _d: &FieldData) -> Result<Option<Response>> {
        let secret = req
            .secret
            .as_ref()
            .ok_or_else(|| Error::validation("revoke request is missing the secret"))?;

        let client = self.get_client(req.storage.as_ref()).await.context("error getting client")?;

        let app_key_id = secret
            .internal_str("app_key_id")?
            .ok_or_else(|| Error::validation("secret is missing app_key_id internal data"))?;

        client
            .delete_app_key(app_key_id)
            .await
            .context("error deleting datadog application key")
            .context("error revoking Application Key")?;

        info!(app_key_id = %app_key_id, "Revoked Datadog application key");
        Ok(None)
    }
}
