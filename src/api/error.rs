use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::datadog::DatadogError;
use crate::errors::Error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        ApiError::NotFound(msg.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_kind = match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::MethodNotAllowed(_) => "unsupported_operation",
            ApiError::BadGateway(_) => "datadog_error",
            ApiError::Internal(_) => "internal_error",
        };

        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg,
        };

        (status, Json(ErrorBody { error: error_kind, message })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        // Display keeps any context prefixes; the root decides the status
        let message = err.to_string();

        match err.root() {
            Error::Datadog(DatadogError::Config { .. } | DatadogError::InvalidRequest { .. }) => {
                ApiError::BadRequest(message)
            }
            Error::Datadog(_) => ApiError::BadGateway(message),
            Error::Validation(_) => ApiError::BadRequest(message),
            Error::NotFound(_) | Error::UnsupportedPath(_) => ApiError::NotFound(message),
            Error::UnsupportedOperation { .. } => ApiError::MethodNotAllowed(message),
            _ => ApiError::Internal(message),
        }
    }
}
