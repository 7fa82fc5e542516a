use axum::{
    body::Bytes,
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response as HttpResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use crate::logical::{LogicalBackend, Operation, Request, Response, Secret, Storage};
use crate::observability::trace_http_requests;

/// Mount point of the engine on the dev server
pub const MOUNT_PREFIX: &str = "/v1/datadog";

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn LogicalBackend>,
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(backend: Arc<dyn LogicalBackend>, storage: Arc<dyn Storage>) -> Self {
        Self { backend, storage }
    }

    fn request(&self, operation: Operation, path: &str) -> Request {
        Request::new(operation, path, Arc::clone(&self.storage))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub help: bool,
}

#[derive(Debug, Deserialize)]
struct LeaseRequest {
    secret: Secret,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(&format!("{}/_lease/renew", MOUNT_PREFIX), post(renew_lease))
        .route(&format!("{}/_lease/revoke", MOUNT_PREFIX), post(revoke_lease))
        .route(
            &format!("{}/{{*path}}", MOUNT_PREFIX),
            get(read_path).post(write_path).put(write_path).delete(delete_path),
        )
        .layer(middleware::from_fn(trace_http_requests))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

async fn read_path(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    Query(query): Query<ReadQuery>,
) -> Result<HttpResponse, ApiError> {
    let operation = match (query.help, query.list) {
        (true, _) => Operation::Help,
        (false, true) => Operation::List,
        (false, false) => Operation::Read,
    };

    let request = state.request(operation, &path);
    match state.backend.handle_request(&request).await? {
        Some(response) => Ok(render(response)),
        None => Err(ApiError::not_found(format!("no data at path: {}", request.path))),
    }
}

/// Create when the target is absent, Update otherwise or when the path
/// has no existence check
async fn write_path(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    body: Bytes,
) -> Result<HttpResponse, ApiError> {
    let mut request = state.request(Operation::Update, &path).with_data(parse_body(&body)?);

    if let Some(false) = state.backend.existence_check(&request).await? {
        request.operation = Operation::Create;
    }
    debug!(operation = %request.operation, path = %request.path, "Resolved write operation");

    Ok(render_optional(state.backend.handle_request(&request).await?))
}

async fn delete_path(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<HttpResponse, ApiError> {
    let request = state.request(Operation::Delete, &path);
    Ok(render_optional(state.backend.handle_request(&request).await?))
}

async fn renew_lease(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<HttpResponse, ApiError> {
    lease_operation(state, Operation::Renew, &body).await
}

async fn revoke_lease(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<HttpResponse, ApiError> {
    lease_operation(state, Operation::Revoke, &body).await
}

async fn lease_operation(
    state: AppState,
    operation: Operation,
    body: &[u8],
) -> Result<HttpResponse, ApiError> {
    let lease: LeaseRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("invalid lease request: {}", e)))?;

    let request = state.request(operation, "").with_secret(lease.secret);
    Ok(render_optional(state.backend.handle_request(&request).await?))
}

fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("invalid JSON body: {}", e))),
    }
}

fn render(response: Response) -> HttpResponse {
    if let Some(message) = response.error_message() {
        return ApiError::bad_request(message).into_response();
    }
    (StatusCode::OK, Json(response)).into_response()
}

fn render_optional(response: Option<Response>) -> HttpResponse {
    match response {
        Some(response) => render(response),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
