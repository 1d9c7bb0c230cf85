//! API key authentication middleware
//!
//! Every `/api/v1` audit route requires the configured key in `x-api-key`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{utils::error::AppError, AppState};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

const ACCESS_DENIED: &str = "Access denied. No API Key provided.";

/// API key rejection reasons
#[derive(Debug, PartialEq, Eq)]
pub enum ApiKeyError {
    Missing,
    Invalid,
}

impl From<ApiKeyError> for AppError {
    fn from(_: ApiKeyError) -> Self {
        // Callers get the same answer whether the key is absent or wrong
        AppError::Unauthorized(ACCESS_DENIED.to_string())
    }
}

impl IntoResponse for ApiKeyError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Check a presented key against the configured one
pub fn verify_api_key(presented: Option<&str>, expected: &str) -> Result<(), ApiKeyError> {
    match presented {
        None | Some("") => Err(ApiKeyError::Missing),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(ApiKeyError::Invalid),
    }
}

/// Reject requests without the configured API key
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiKeyError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if let Err(err) = verify_api_key(presented, &state.config.auth.api_key) {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            reason = ?err,
            "Rejected request without a valid API key"
        );
        return Err(err);
    }

    Ok(next.run(request).await)
}
