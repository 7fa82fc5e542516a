//! reqwest client for the Datadog v2 key-management API.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use super::error::{DatadogError, Result};
use super::models::{
    ApiKeyCreateAttributes, AppKeyCreateAttributes, DatadogApiKey, DatadogAppKey, Document,
    KeyAttributes, KeySummary, NewResource, Resource, API_KEYS_TYPE, APPLICATION_KEYS_TYPE,
};
use super::DEFAULT_API_URL;
use crate::secrets::SecretString;

// Header names must be lowercase for `HeaderName::from_static`
const API_KEY_HEADER: &str = "dd-api-key";
const APP_KEY_HEADER: &str = "dd-application-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client for one Datadog organization.
#[derive(Debug, Clone)]
pub struct DatadogClient {
    client: Client,
    base_url: Url,
}

impl DatadogClient {
    /// Build a client authenticating with the given root keys.
    ///
    /// `api_url` defaults to [`DEFAULT_API_URL`].
    pub fn new(
        api_key: &SecretString,
        app_key: &SecretString,
        api_url: Option<&str>,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(DatadogError::config("datadog API key was not provided"));
        }
        if app_key.is_empty() {
            return Err(DatadogError::config("datadog application key was not provided"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, sensitive_header(api_key, "API key")?);
        headers.insert(APP_KEY_HEADER, sensitive_header(app_key, "application key")?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client =
            Client::builder().default_headers(headers).timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, base_url: parse_base_url(api_url.unwrap_or(DEFAULT_API_URL))? })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create an API key named `name`
    pub async fn create_api_key(&self, name: &str) -> Result<DatadogApiKey> {
        let body = Document {
            data: NewResource {
                resource_type: API_KEYS_TYPE,
                attributes: ApiKeyCreateAttributes { name: name.to_string() },
            },
        };

        let doc: Document<Resource<KeyAttributes>> =
            self.send_json(Method::POST, &["api_keys"], Some(&body)).await?;
        let key = doc
            .data
            .attributes
            .key
            .ok_or_else(|| DatadogError::invalid_response("created API key has no key value"))?;

        Ok(DatadogApiKey { api_key_id: doc.data.id, api_key: key })
    }

    /// List the organization's API keys
    pub async fn list_api_keys(&self) -> Result<Vec<KeySummary>> {
        let doc: Document<Vec<Resource<KeyAttributes>>> =
            self.send_json::<(), _>(Method::GET, &["api_keys"], None).await?;
        Ok(doc.data.into_iter().map(KeySummary::from).collect())
    }

    /// Delete the API key with id `api_key_id`
    pub async fn delete_api_key(&self, api_key_id: &str) -> Result<()> {
        require_id(api_key_id, "API key")?;
        self.send_no_content(Method::DELETE, &["api_keys", api_key_id]).await
    }

    /// Create an application key owned by the current user.
    ///
    /// `None` scopes create an unscoped key.
    pub async fn create_app_key(
        &self,
        name: &str,
        scopes: Option<&[String]>,
    ) -> Result<DatadogAppKey> {
        let body = Document {
            data: NewResource {
                resource_type: APPLICATION_KEYS_TYPE,
                attributes: AppKeyCreateAttributes {
                    name: name.to_string(),
                    scopes: scopes.map(<[String]>::to_vec),
                },
            },
        };

        let doc: Document<Resource<KeyAttributes>> = self
            .send_json(Method::POST, &["current_user", "application_keys"], Some(&body))
            .await?;
        let key = doc.data.attributes.key.ok_or_else(|| {
            DatadogError::invalid_response("created application key has no key value")
        })?;

        Ok(DatadogAppKey { app_key_id: doc.data.id, app_key: key })
    }

    /// List the current user's application keys
    pub async fn list_app_keys(&self) -> Result<Vec<KeySummary>> {
        let doc: Document<Vec<Resource<KeyAttributes>>> = self
            .send_json::<(), _>(Method::GET, &["current_user", "application_keys"], None)
            .await?;
        Ok(doc.data.into_iter().map(KeySummary::from).collect())
    }

    /// Delete the application key with id `app_key_id`
    pub async fn delete_app_key(&self, app_key_id: &str) -> Result<()> {
        require_id(app_key_id, "application key")?;
        self.send_no_content(Method::DELETE, &["application_keys", app_key_id]).await
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DatadogError::config("datadog API URL cannot be a base URL"))?
            .pop_if_empty()
            .extend(["api", "v2"])
            .extend(segments);

        debug!(method = %method, path = %url.path(), "Calling Datadog API");
        Ok(self.client.request(method, url))
    }

    async fn send_json<T: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&T>,
    ) -> Result<R> {
        let mut request = self.request(method, segments)?;
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn send_no_content(&self, method: Method, segments: &[&str]) -> Result<()> {
        let response = self.request(method, segments)?.send().await?;
        check_status(response).await.map(|_| ())
    }

    /// Check the status and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = check_status(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            DatadogError::invalid_response(format!("failed to parse Datadog response: {}", e))
        })
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    debug!(status = status.as_u16(), "Datadog API response");

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|_| "<unable to read error>".to_string());
    trace!(status = status.as_u16(), body = %body, "Datadog API error body");

    Err(DatadogError::Api { status: status.as_u16(), body })
}

fn sensitive_header(secret: &SecretString, what: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(secret.expose_secret())
        .map_err(|_| DatadogError::config(format!("datadog {} contains invalid characters", what)))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Parse an http(s) base URL for the Datadog API
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| DatadogError::config(format!("invalid datadog API URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(url),
        _ => Err(DatadogError::config(format!("invalid datadog API URL '{}'", raw))),
    }
}

fn require_id(id: &str, what: &str) -> Result<()> {
    if id.is_empty() {
        return Err(DatadogError::invalid_request(format!("{} id cannot be empty", what)));
    }
    Ok(())
}
