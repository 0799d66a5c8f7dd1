//! HTTP-facing error type. Wraps the store-level taxonomy so every handler
//! can just `?`-propagate and get the right status code for free.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use risk_db::StoreError;
use risk_schemas::ErrorKind;

use crate::api_types::ErrorResponse;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, kind: "INVALID_INPUT", message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, kind: "NOT_FOUND", message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message, kind: self.kind })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let (status, kind) = match e.kind() {
            ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::Transient => (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT"),
            ErrorKind::PricerError | ErrorKind::Fatal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };
        Self { status, kind, message: e.to_string() }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, kind: "INTERNAL", message: e.to_string() }
    }
}
