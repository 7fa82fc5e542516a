//! # HTTP Request Tracing Middleware
//!
//! Axum middleware that runs each dev-server request inside a
//! [`request_span!`](crate::request_span) and logs its outcome.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;

/// Wrap a request in an `engine_request` span and log status and latency.
///
/// Only the method and path are recorded; query strings and bodies may
/// carry credentials.
pub async fn trace_http_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let span = crate::request_span!(method, path);
    let response = next.run(request).instrument(span.clone()).await;

    let status_code = response.status().as_u16();
    let elapsed = start.elapsed();

    span.in_scope(|| {
        if status_code >= 500 {
            tracing::warn!(status_code, elapsed_ms = elapsed.as_millis() as u64, "Request failed");
        } else {
            tracing::debug!(status_code, elapsed_ms = elapsed.as_millis() as u64, "Request completed");
        }
    });

    response
}
