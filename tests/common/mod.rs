//! Common test utilities for all integration tests.
//!
//! Provides a backend mounted over in-memory storage and a wiremock
//! stand-in for the Datadog key-management API.

#![allow(dead_code)]

use std::sync::Arc;

use datadog_secrets_engine::backend::{factory, DatadogBackend};
use datadog_secrets_engine::logical::{
    Backend, BackendConfig, InmemStorage, LogicalBackend, Operation, Request, Response, Secret,
    Storage,
};
use datadog_secrets_engine::Result;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ROOT_API_KEY: &str = "root0api0key0000000000000000000a";
pub const ROOT_APP_KEY: &str = "root0app0key000000000000000000000000000b";

/// A mounted backend with its storage view
pub struct TestEngine {
    pub backend: Arc<Backend<DatadogBackend>>,
    pub storage: Arc<dyn Storage>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    pub fn with_config(config: BackendConfig) -> Self {
        let backend = factory(config).expect("backend should build");
        Self { backend, storage: Arc::new(InmemStorage::new()) }
    }

    pub fn request(&self, operation: Operation, path: &str) -> Request {
        Request::new(operation, path, Arc::clone(&self.storage))
    }

    pub async fn call(&self, operation: Operation, path: &str, data: Value) -> Result<Option<Response>> {
        self.backend.handle_request(&self.request(operation, path).with_data(data)).await
    }

    pub async fn lease(&self, operation: Operation, secret: Secret) -> Result<Option<Response>> {
        self.backend.handle_request(&self.request(operation, "").with_secret(secret)).await
    }

    /// Write root credentials pointing the client at `api_url`
    pub async fn configure(&self, api_url: &str) {
        self.configure_with_ids(api_url, None).await;
    }

    pub async fn configure_with_ids(&self, api_url: &str, ids: Option<(&str, &str)>) {
        let mut data = json!({
            "api_key": ROOT_API_KEY,
            "app_key": ROOT_APP_KEY,
            "api_url": api_url,
        });
        if let Some((api_key_id, app_key_id)) = ids {
            data["api_key_id"] = json!(api_key_id);
            data["app_key_id"] = json!(app_key_id);
        }

        let resp = self.call(Operation::Create, "config", data).await.expect("config write");
        assert!(resp.is_none());
    }

    pub async fn write_role(&self, name: &str, data: Value) {
        let path = format!("roles/{}", name);
        let resp = self.call(Operation::Create, &path, data).await.expect("role write");
        assert!(resp.is_none(), "unexpected role write response: {:?}", resp);
    }
}

/// Datadog API double
pub struct DatadogMock {
    pub server: MockServer,
}

impl DatadogMock {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// `POST /api/v2/api_keys` returning a key with the given id
    pub async fn expect_create_api_key(&self, id: &str, key: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/api/v2/api_keys"))
            .and(header("DD-API-KEY", ROOT_API_KEY))
            .and(header("DD-APPLICATION-KEY", ROOT_APP_KEY))
            .and(body_partial_json(json!({ "data": { "type": "api_keys" } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(key_document("api_keys", id, key)))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// `POST /api/v2/current_user/application_keys` matching `scopes`
    pub async fn expect_create_app_key(&self, id: &str, key: &str, scopes: Value, times: u64) {
        Mock::given(method("POST"))
            .and(path("/api/v2/current_user/application_keys"))
            .and(header("DD-API-KEY", ROOT_API_KEY))
            .and(body_partial_json(json!({
                "data": { "type": "application_keys", "attributes": { "scopes": scopes } }
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(key_document("application_keys", id, key)),
            )
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn expect_delete_api_key(&self, id: &str, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(format!("/api/v2/api_keys/{}", id)))
            .respond_with(ResponseTemplate::new(204))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn expect_delete_app_key(&self, id: &str, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(format!("/api/v2/application_keys/{}", id)))
            .respond_with(ResponseTemplate::new(204))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Every request under `/api/v2/` fails with `status`
    pub async fn fail_all(&self, status: u16) {
        Mock::given(path_regex(r"^/api/v2/.*"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "errors": ["Forbidden"] })),
            )
            .mount(&self.server)
            .await;
    }
}

pub fn key_document(resource_type: &str, id: &str, key: &str) -> Value {
    json!({
        "data": {
            "type": resource_type,
            "id": id,
            "attributes": {
                "name": "generated",
                "key": key,
                "last4": &key[key.len() - 4..],
                "created_at": "2024-05-01T12:00:00.000000+00:00"
            }
        }
    })
}
