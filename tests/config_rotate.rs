//! Root credential rotation through `config/rotate`.

mod common;

use common::{DatadogMock, TestEngine};
use datadog_secrets_engine::backend::get_config;
use datadog_secrets_engine::logical::Operation;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

const NEW_API_KEY: &str = "9999888877776666555544443333222a";
const NEW_APP_KEY: &str = "ffffeeeeddddccccbbbbaaaa9999888877776666";

async fn expect_rotation(mock: &DatadogMock) {
    mock.expect_create_api_key("new-api-key-id", NEW_API_KEY, 1).await;
    // Root application key is created without scope restrictions
    mock.expect_create_app_key("new-app-key-id", NEW_APP_KEY, serde_json::Value::Null, 1).await;
}

#[tokio::test]
async fn test_rotate_replaces_and_deletes_root_keys() {
    let mock = DatadogMock::start().await;
    expect_rotation(&mock).await;

    // Old keys are deleted with the freshly minted credentials
    Mock::given(method("DELETE"))
        .and(path("/api/v2/api_keys/old-api-key-id"))
        .and(header("DD-API-KEY", NEW_API_KEY))
        .and(header("DD-APPLICATION-KEY", NEW_APP_KEY))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/application_keys/old-app-key-id"))
        .and(header("DD-API-KEY", NEW_API_KEY))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;

    let engine = TestEngine::new();
    engine.configure_with_ids(&mock.uri(), Some(("old-api-key-id", "old-app-key-id"))).await;

    let resp = engine.call(Operation::Read, "config/rotate", json!({})).await.unwrap().unwrap();
    assert_eq!(resp.data["api_key_id"], "new-api-key-id");
    assert_eq!(resp.data["app_key_id"], "new-app-key-id");
    assert!(resp.warnings.is_empty());
    assert!(!serde_json::to_string(&resp).unwrap().contains(NEW_API_KEY));

    let config = get_config(engine.storage.as_ref()).await.unwrap().unwrap();
    assert_eq!(config.api_key.expose_secret(), NEW_API_KEY);
    assert_eq!(config.app_key.expose_secret(), NEW_APP_KEY);
    assert_eq!(config.api_key_id, "new-api-key-id");
    assert_eq!(config.api_url.as_deref(), Some(mock.uri().as_str()));

    assert!(engine.backend.state().has_client().await);
}

#[tokio::test]
async fn test_rotate_skips_unknown_old_ids() {
    let mock = DatadogMock::start().await;
    expect_rotation(&mock).await;

    let engine = TestEngine::new();
    engine.configure(&mock.uri()).await;

    let resp = engine.call(Operation::Read, "config/rotate", json!({})).await.unwrap().unwrap();
    assert_eq!(resp.data["api_key_id"], "new-api-key-id");

    assert_eq!(resp.warnings.len(), 2);
    assert!(resp.warnings[0].contains("api_key_id unknown"));

    let requests = mock.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method.as_str() == "POST"));
}

#[tokio::test]
async fn test_rotate_without_config() {
    let engine = TestEngine::new();

    let resp = engine.call(Operation::Read, "config/rotate", json!({})).await.unwrap().unwrap();
    assert_eq!(resp.error_message(), Some("configuration not set"));
}

#[tokio::test]
async fn test_rotate_failure_keeps_stored_config() {
    let mock = DatadogMock::start().await;
    mock.fail_all(403).await;

    let engine = TestEngine::new();
    engine.configure_with_ids(&mock.uri(), Some(("old-api-key-id", "old-app-key-id"))).await;

    let err = engine.call(Operation::Read, "config/rotate", json!({})).await.unwrap_err();
    assert!(err.to_string().starts_with("error rotating API key"));

    let config = get_config(engine.storage.as_ref()).await.unwrap().unwrap();
    assert_eq!(config.api_key.expose_secret(), common::ROOT_API_KEY);
    assert_eq!(config.api_key_id, "old-api-key-id");
}

#[tokio::test]
async fn test_rotate_app_key_failure_keeps_stored_config() {
    let mock = DatadogMock::start().await;
    mock.expect_create_api_key("orphaned-api-key-id", NEW_API_KEY, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/current_user/application_keys"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock.server)
        .await;

    let engine = TestEngine::new();
    engine.configure_with_ids(&mock.uri(), Some(("old-api-key-id", "old-app-key-id"))).await;

    let err = engine.call(Operation::Read, "config/rotate", json!({})).await.unwrap_err();
    assert!(err.to_string().starts_with("error rotating App key"));

    let config = get_config(engine.storage.as_ref()).await.unwrap().unwrap();
    assert_eq!(config.api_key_id, "old-api-key-id");
    assert_eq!(config.app_key.expose_secret(), common::ROOT_APP_KEY);
}
