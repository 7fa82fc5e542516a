//! Dev HTTP surface driven through `tower::ServiceExt::oneshot`.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{DatadogMock, TestEngine, ROOT_API_KEY, ROOT_APP_KEY};
use datadog_secrets_engine::api::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router(engine: &TestEngine) -> Router {
    build_router(AppState::new(engine.backend.clone(), Arc::clone(&engine.storage)))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let engine = TestEngine::new();
    let (status, body) = send(&router(&engine), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_config_over_http() {
    let engine = TestEngine::new();
    let app = router(&engine);

    let (status, _) = send(&app, Method::GET, "/v1/datadog/config", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // First write resolves to create, which requires both keys
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datadog/config",
        Some(json!({ "api_key": ROOT_API_KEY })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("missing Application Key"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datadog/config",
        Some(json!({ "api_key": ROOT_API_KEY, "app_key": ROOT_APP_KEY, "api_key_id": "root-id" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    // Second write is an update; keys may be omitted
    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/datadog/config",
        Some(json!({ "app_key_id": "root-app-id" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/v1/datadog/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "api_key_id": "root-id", "app_key_id": "root-app-id" }));

    let (status, _) = send(&app, Method::DELETE, "/v1/datadog/config", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_roles_over_http() {
    let engine = TestEngine::new();
    let app = router(&engine);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/datadog/roles/ci",
        Some(json!({ "app_key_scopes": ["incident_read"], "ttl": "1m" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/v1/datadog/roles?list=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["keys"], json!(["ci"]));

    let (status, body) = send(&app, Method::GET, "/v1/datadog/roles/ci", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ttl"], 60);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datadog/roles/ci",
        Some(json!({ "app_key_scopes": ["not_a_scope"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_routing_errors() {
    let engine = TestEngine::new();
    let app = router(&engine);

    let (status, _) = send(&app, Method::GET, "/v1/datadog/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/v1/datadog/config/rotate", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "unsupported_operation");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/datadog/roles/ci")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_help_over_http() {
    let engine = TestEngine::new();
    let (status, body) =
        send(&router(&engine), Method::GET, "/v1/datadog/config/rotate?help=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["synopsis"], "Rotate the datadog API and App keys.");
}

#[tokio::test]
async fn test_issue_and_revoke_over_http() {
    let mock = DatadogMock::start().await;
    mock.expect_create_api_key("http-key-id", "0123456789abcdef0123456789abcdef", 1).await;
    mock.expect_delete_api_key("http-key-id", 1).await;

    let engine = TestEngine::new();
    engine.configure(&mock.uri()).await;
    engine.write_role("ci", json!({})).await;
    let app = router(&engine);

    let (status, body) = send(&app, Method::GET, "/v1/datadog/apikey/ci", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["api_key"], "0123456789abcdef0123456789abcdef");
    assert_eq!(body["secret"]["internal_data"]["api_key_id"], "http-key-id");

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/datadog/_lease/revoke",
        Some(json!({ "secret": body["secret"].clone() })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datadog/_lease/renew",
        Some(json!({ "lease": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("invalid lease request"));
}

#[tokio::test]
async fn test_datadog_failure_maps_to_bad_gateway() {
    let mock = DatadogMock::start().await;
    mock.fail_all(500).await;

    let engine = TestEngine::new();
    engine.configure(&mock.uri()).await;
    engine.write_role("ci", json!({})).await;

    let (status, body) = send(&router(&engine), Method::GET, "/v1/datadog/appkey/ci", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "datadog_error");
}
