use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// ApiError
///
/// The complete error taxonomy of the HTTP surface. Every handler failure is
/// expressed as one of these variants, and every variant maps to exactly one
/// status code. Clients always receive a JSON body of the shape
/// `{"detail": "<message>"}` — there are no structured error codes beyond
/// the HTTP status itself.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-range request payload (422). The message names
    /// the offending field and constraint.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid bearer token (401). Every failure mode of the
    /// identity service — malformed token, revoked token, network failure —
    /// collapses into this single outcome.
    #[error("Authentication failed")]
    Authentication,

    /// Valid token, insufficient role (403).
    #[error("Admin access required")]
    Forbidden,

    /// Target id/page absent where absence is an error (404).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Backing-store or identity-service failure (500). The underlying
    /// message is passed through verbatim; no retries are attempted.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Authentication => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
