use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use super::scopes::find_invalid_scope;
use super::DatadogBackend;
use crate::errors::{Error, Result, ResultExt};
use crate::logical::secret::duration_secs;
use crate::logical::{
    generic_name_regex, FieldData, FieldSchema, FieldType, Operation, Path, Request, Response,
    Storage, StorageEntry,
};

pub const ROLE_STORAGE_PREFIX: &str = "roles/";

const HELP_SYNOPSIS: &str =
    "Manages the Vault role for generating Datadog API and Application Keys.";
const HELP_DESCRIPTION: &str = r#"
This path allows you to read and write roles used to generate Datadog API and Application Keys.
You can configure scopes associated with Application Keys by providing a list of scopes with the
input data.
"#;
const LIST_HELP_SYNOPSIS: &str = "List the existing roles in datadog backend";
const LIST_HELP_DESCRIPTION: &str = "Roles will be listed by the role name.";

/// Policy for keys issued under a role, stored at `roles/<name>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatadogRoleEntry {
    pub name: String,

    #[serde(default)]
    pub app_key_scopes: Vec<String>,

    #[serde(default, with = "duration_secs")]
    pub ttl: Duration,

    #[serde(default, with = "duration_secs")]
    pub max_ttl: Duration,
}

impl DatadogRoleEntry {
    fn to_response_data(&self) -> serde_json::Value {
        json!({
            "app_key_scopes": self.app_key_scopes,
            "ttl": self.ttl.as_secs(),
            "max_ttl": self.max_ttl.as_secs(),
        })
    }
}

pub(super) fn paths() -> Result<Vec<Path<DatadogBackend>>> {
    let role = Path::<DatadogBackend>::new(format!(
        "{}{}",
        ROLE_STORAGE_PREFIX,
        generic_name_regex("name")
    ))?
    .field(
        "name",
        FieldSchema::new(FieldType::LowerCaseString, "Required. Name of the role").required(),
    )
    .field(
        "app_key_scopes",
        FieldSchema::new(
            FieldType::CommaStringSlice,
            "Optional. List of datadog permissions scopes to be applied to the application key.",
        ),
    )
    .field(
        "ttl",
        FieldSchema::new(
            FieldType::DurationSecond,
            "Optional. Default lease time for generated credentials. If not set or set to 0, system default will be used.",
        ),
    )
    .field(
        "max_ttl",
        FieldSchema::new(
            FieldType::DurationSecond,
            "Optional. Maximum lease time for role. If not set or set to 0, system default will be used.",
        ),
    )
    .operation(Operation::Read, |b, req, d| Box::pin(b.path_roles_read(req, d)))
    .operation(Operation::Create, |b, req, d| Box::pin(b.path_roles_write(req, d)))
    .operation(Operation::Update, |b, req, d| Box::pin(b.path_roles_write(req, d)))
    .operation(Operation::Delete, |b, req, d| Box::pin(b.path_roles_delete(req, d)))
    .help(HELP_SYNOPSIS, HELP_DESCRIPTION);

    let list = Path::<DatadogBackend>::new("roles/?")?
        .operation(Operation::List, |b, req, d| Box::pin(b.path_roles_list(req, d)))
        .help(LIST_HELP_SYNOPSIS, LIST_HELP_DESCRIPTION);

    Ok(vec![role, list])
}

impl DatadogBackend {
    async fn path_roles_list(&self, req: &Request, _d: &FieldData) -> Result<Option<Response>> {
        let entries = req.storage.list(ROLE_STORAGE_PREFIX).await?;
        Ok(Some(Response::list(entries)))
    }

    async fn path_roles_read(&self, req: &Request, d: &FieldData) -> Result<Option<Response>> {
        let name = d.get_string("name")?;
        let Some(role) = get_role(req.storage.as_ref(), &name).await? else {
            return Ok(None);
        };

        Ok(Some(Response::with_data(role.to_response_data())))
    }

    async fn path_roles_write(&self, req: &Request, d: &FieldData) -> Result<Option<Response>> {
        let name = d.get_string("name")?;
        if name.is_empty() {
            return Ok(Some(Response::error("missing role name")));
        }

        let storage = req.storage.as_ref();
        let create = req.operation == Operation::Create;
        let mut role = get_role(storage, &name).await?.unwrap_or_default();
        role.name = name.clone();

        // On update only supplied fields change; on create the rest reset to defaults
        if let Some(scopes) = d.get_ok_string_slice("app_key_scopes")? {
            role.app_key_scopes = scopes;
        } else if create {
            role.app_key_scopes = Vec::new();
        }

        if let Some(scope) = find_invalid_scope(&role.app_key_scopes) {
            return Ok(Some(Response::error(format!(
                "provided scope {} is not a valid datadog application key scope",
                scope
            ))));
        }

        if let Some(ttl) = d.get_ok_duration("ttl")? {
            role.ttl = ttl;
        } else if create {
            role.ttl = Duration::ZERO;
        }

        if let Some(max_ttl) = d.get_ok_duration("max_ttl")? {
            role.max_ttl = max_ttl;
        } else if create {
            role.max_ttl = Duration::ZERO;
        }

        if !role.max_ttl.is_zero() && role.ttl > role.max_ttl {
            return Ok(Some(Response::error("ttl cannot be greater than max_ttl")));
        }

        put_role(storage, &role).await?;

        info!(
            role = %role.name,
            scopes = role.app_key_scopes.len(),
            ttl_secs = role.ttl.as_secs(),
            max_ttl_secs = role.max_ttl.as_secs(),
            "Datadog role written"
        );

        Ok(None)
    }

    async fn path_roles_delete(&self, req: &Request, d: &FieldData) -> Result<Option<Response>> {
        let name = d.get_string("name")?;
        req.storage
            .delete(&format!("{}{}", ROLE_STORAGE_PREFIX, name))
            .await
            .context("error deleting datadog role")?;

        info!(role = %name, "Datadog role deleted");
        Ok(None)
    }
}

/// Load a role, `None` when it does not exist
pub async fn get_role(storage: &dyn Storage, name: &str) -> Result<Option<DatadogRoleEntry>> {
    if name.is_empty() {
        return Err(Error::validation("missing role name"));
    }

    let Some(entry) = storage.get(&format!("{}{}", ROLE_STORAGE_PREFIX, name)).await? else {
        return Ok(None);
    };

    entry.decode_json().map(Some)
}

async fn put_role(storage: &dyn Storage, role: &DatadogRoleEntry) -> Result<()> {
    let key = format!("{}{}", ROLE_STORAGE_PREFIX, role.name);
    storage.put(StorageEntry::from_json(key, role)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::InmemStorage;

    #[tokio::test]
    async fn test_role_is_stored_with_ttl_seconds() {
        let storage = InmemStorage::new();
        let role = DatadogRoleEntry {
            name: "ci".to_string(),
            app_key_scopes: vec!["dashboards_read".to_string()],
            ttl: Duration::from_secs(60),
            max_ttl: Duration::from_secs(18000),
        };
        put_role(&storage, &role).await.unwrap();

        let raw = storage.get("roles/ci").await.unwrap().unwrap();
        let value: serde_json::Value = raw.decode_json().unwrap();
        assert_eq!(value["ttl"], 60);
        assert_eq!(value["max_ttl"], 18000);

        assert_eq!(get_role(&storage, "ci").await.unwrap(), Some(role));
        assert_eq!(get_role(&storage, "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_role_requires_name() {
        let err = get_role(&InmemStorage::new(), "").await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: missing role name");
    }
}
