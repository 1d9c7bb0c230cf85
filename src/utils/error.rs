//! Error types and handling
//!
//! Every handler error is converted to a consistent JSON response body.
//! Client errors carry the offending input in their message; server errors
//! are logged in full and answered with an opaque message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use super::timestamp::TimestampError;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input (400)
    #[error("{0}")]
    BadRequest(String),

    /// Field bounds violated on ingestion (400)
    #[error("{0}")]
    Validation(String),

    /// Malformed timestamp in a query (400)
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// Missing or invalid API key (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Record store failure (500). `route` names the failing endpoint.
    #[error("Fatal error {route}")]
    Store {
        route: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Wrap a store failure for the named route
    pub fn store(route: &'static str, source: impl Into<anyhow::Error>) -> Self {
        AppError::Store {
            route,
            source: source.into(),
        }
    }
}

/// Error response body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code: None,
        }
    }

    /// Add an error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Timestamp(_) => (StatusCode::BAD_REQUEST, "invalid_timestamp"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Store { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        };

        let body = match &self {
            AppError::Store { route, source } => {
                error!(route = *route, error = ?source, "Record store failure");
                ErrorResponse::new(error_type, self.to_string())
            }
            AppError::Timestamp(err) => {
                ErrorResponse::new(error_type, err.to_string()).with_code(err.code())
            }
            _ => ErrorResponse::new(error_type, self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
