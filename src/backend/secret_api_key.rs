use tracing::info;

use super::DatadogBackend;
use crate::errors::{Error, Result, ResultExt};
use crate::logical::{FieldData, FieldSchema, FieldType, Request, Response, SecretType};

pub const DATADOG_API_KEY_TYPE: &str = "datadog_api_key";

pub(super) fn secret() -> SecretType<DatadogBackend> {
    SecretType::<DatadogBackend>::new(DATADOG_API_KEY_TYPE)
        .field("api_key", FieldSchema::new(FieldType::String, "datadog API Key"))
        .renew(|b, req, _d| Box::pin(b.lease_renew(req)))
        .revoke(|b, req, d| Box::pin(b.api_key_revoke(req, d)))
}

impl DatadogBackend {
    async fn api_key_revoke(&self, req: &Request, _d: &FieldData) -> Result<Option<Response>> {
        let secret = req
            .secret
            .as_ref()
            .ok_or_else(|| Error::validation("revoke request is missing the secret"))?;

        let client = self.get_client(req.storage.as_ref()).await.context("error getting client")?;

        let api_key_id = secret
            .internal_str("api_key_id")?
            .ok_or_else(|| Error::validation("secret is missing api_key_id internal data"))?;

        client
            .delete_api_key(api_key_id)
            .await
            .context("error deleting datadog API key")
            .context("error revoking API Key")?;

        info!(api_key_id = %api_key_id, "Revoked Datadog API key");
        Ok(None)
    }
}
