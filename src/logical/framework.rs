//! Router that dispatches host requests to path and secret handlers.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{json, Map};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{FieldData, FieldSchema, Operation, OperationFuture, Path, Request, Response};
use crate::errors::{Error, Result};

type SecretHandler<S> =
    Arc<dyn for<'a> Fn(&'a S, &'a Request, &'a FieldData) -> OperationFuture<'a> + Send + Sync>;

type InvalidateHandler<S> = Arc<dyn for<'a> Fn(&'a S, &'a str) -> BoxFuture<'a, ()> + Send + Sync>;

/// Lease defaults supplied by the host at mount time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    pub default_lease_ttl: Duration,
    pub max_lease_ttl: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        // 768h, the host's system default
        let ttl = Duration::from_secs(768 * 60 * 60);
        Self { default_lease_ttl: ttl, max_lease_ttl: ttl }
    }
}

/// A secret type issued by the backend, with its lease callbacks
pub struct SecretType<S> {
    name: &'static str,
    fields: Arc<HashMap<String, FieldSchema>>,
    renew: Option<SecretHandler<S>>,
    revoke: Option<SecretHandler<S>>,
}

impl<S> SecretType<S> {
    pub fn new(name: &'static str) -> Self {
        Self { name, fields: Arc::new(HashMap::new()), renew: None, revoke: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field(mut self, name: &str, schema: FieldSchema) -> Self {
        Arc::make_mut(&mut self.fields).insert(name.to_string(), schema);
        self
    }

    pub fn renew<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a S, &'a Request, &'a FieldData) -> OperationFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.renew = Some(Arc::new(handler));
        self
    }

    pub fn revoke<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a S, &'a Request, &'a FieldData) -> OperationFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.revoke = Some(Arc::new(handler));
        self
    }
}

impl<S> fmt::Debug for SecretType<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretType")
            .field("name", &self.name)
            .field("renew", &self.renew.is_some())
            .field("revoke", &self.revoke.is_some())
            .finish()
    }
}

/// Object-safe view of a backend, as the host sees it.
#[async_trait]
pub trait LogicalBackend: Send + Sync {
    async fn handle_request(&self, request: &Request) -> Result<Option<Response>>;

    /// Whether the target of a write exists; `None` when the path has no check
    async fn existence_check(&self, request: &Request) -> Result<Option<bool>>;

    /// A storage key was changed outside this process
    async fn invalidate(&self, key: &str);

    fn help(&self) -> &str;
}

/// A backend with plugin state `S`.
pub struct Backend<S> {
    state: S,
    help: &'static str,
    paths: Vec<Path<S>>,
    secrets: HashMap<&'static str, SecretType<S>>,
    seal_wrap_storage: HashSet<String>,
    invalidate: Option<InvalidateHandler<S>>,
    system: BackendConfig,
}

impl<S> Backend<S> {
    pub fn new(state: S, help: &'static str) -> Self {
        Self {
            state,
            help,
            paths: Vec::new(),
            secrets: HashMap::new(),
            seal_wrap_storage: HashSet::new(),
            invalidate: None,
            system: BackendConfig::default(),
        }
    }

    pub fn path(mut self, path: Path<S>) -> Self {
        self.paths.push(path);
        self
    }

    pub fn paths(mut self, paths: impl IntoIterator<Item = Path<S>>) -> Self {
        self.paths.extend(paths);
        self
    }

    pub fn secret(mut self, secret: SecretType<S>) -> Self {
        self.secrets.insert(secret.name, secret);
        self
    }

    /// Storage keys the host must encrypt again with its seal
    pub fn seal_wrap_storage(mut self, keys: &[&str]) -> Self {
        self.seal_wrap_storage.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    /// Register the hook run when the host invalidates a storage key
    pub fn invalidate_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a S, &'a str) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.invalidate = Some(Arc::new(handler));
        self
    }

    /// Apply the host's mount configuration
    pub fn setup(&mut self, config: BackendConfig) {
        self.system = config;
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn seal_wrapped_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.seal_wrap_storage.iter().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn secret_type(&self, name: &str) -> Option<&SecretType<S>> {
        self.secrets.get(name)
    }

    fn route(&self, path: &str) -> Option<(&Path<S>, Map<String, serde_json::Value>)> {
        self.paths.iter().find_map(|p| p.matches(path).map(|captures| (p, captures)))
    }

    async fn handle_secret_request(&self, request: &Request) -> Result<Option<Response>> {
        let secret = request.secret.as_ref().ok_or_else(|| {
            Error::validation(format!("{} request is missing the secret", request.operation))
        })?;

        let secret_type = self.secrets.get(secret.secret_type.as_str()).ok_or_else(|| {
            Error::validation(format!("unknown secret type: {}", secret.secret_type))
        })?;

        let handler = match request.operation {
            Operation::Renew => secret_type.renew.as_ref(),
            _ => secret_type.revoke.as_ref(),
        }
        .ok_or_else(|| Error::UnsupportedOperation {
            operation: request.operation,
            path: secret.secret_type.clone(),
        })?;

        debug!(
            operation = %request.operation,
            secret_type = %secret.secret_type,
            "Dispatching lease callback"
        );

        let data = FieldData::new(secret.internal_data.clone(), Arc::clone(&secret_type.fields));
        handler(&self.state, request, &data).await
    }

    fn handle_help(&self, request: &Request) -> Result<Option<Response>> {
        let mut data = json!({ "help": self.help.trim() });
        if let Some((path, _)) = self.route(&request.path) {
            data["synopsis"] = json!(path.help_synopsis().trim());
            data["description"] = json!(path.help_description().trim());

            let mut fields: Vec<_> = path.fields().iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let fields: serde_json::Map<String, serde_json::Value> = fields
                .into_iter()
                .map(|(name, schema)| {
                    (
                        name.clone(),
                        json!({
                            "type": schema.field_type.as_str(),
                            "description": schema.description,
                            "required": schema.required,
                        }),
                    )
                })
                .collect();
            data["fields"] = serde_json::Value::Object(fields);
        }
        Ok(Some(Response::with_data(data)))
    }

    fn fill_lease_defaults(&self, response: &mut Option<Response>) {
        let Some(secret) = response.as_mut().and_then(|r| r.secret.as_mut()) else {
            return;
        };
        if secret.ttl.is_zero() {
            secret.ttl = self.system.default_lease_ttl;
        }
        if secret.max_ttl.is_zero() {
            secret.max_ttl = self.system.max_lease_ttl;
        }
    }
}

#[async_trait]
impl<S> LogicalBackend for Backend<S>
where
    S: Send + Sync + 'static,
{
    async fn handle_request(&self, request: &Request) -> Result<Option<Response>> {
        match request.operation {
            Operation::Renew | Operation::Revoke => return self.handle_secret_request(request).await,
            Operation::Help => return self.handle_help(request),
            _ => {}
        }

        let (path, captures) = self
            .route(&request.path)
            .ok_or_else(|| Error::UnsupportedPath(request.path.clone()))?;

        let handler = path.handler(request.operation).ok_or_else(|| Error::UnsupportedOperation {
            operation: request.operation,
            path: request.path.clone(),
        })?;

        let data = path.field_data(request, captures);
        data.validate()?;

        debug!(
            operation = %request.operation,
            path = %request.path,
            pattern = %path.pattern(),
            "Routing request"
        );

        let mut response = handler(&self.state, request, &data).await?;
        self.fill_lease_defaults(&mut response);
        Ok(response)
    }

    async fn existence_check(&self, request: &Request) -> Result<Option<bool>> {
        let (path, captures) = self
            .route(&request.path)
            .ok_or_else(|| Error::UnsupportedPath(request.path.clone()))?;

        let Some(check) = path.existence_handler() else {
            return Ok(None);
        };

        let data = path.field_data(request, captures);
        check(&self.state, request, &data).await.map(Some)
    }

    async fn invalidate(&self, key: &str) {
        if let Some(handler) = &self.invalidate {
            handler(&self.state, key).await;
        }
    }

    fn help(&self) -> &str {
        self.help
    }
}

impl<S> fmt::Debug for Backend<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("paths", &self.paths)
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .field("system", &self.system)
            .finish()
    }
}
