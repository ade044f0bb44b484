//! API error types (§7).
//!
//! Most of the outcomes §4.E's request coordinator produces aren't errors
//! at all - "not ready" and "overloaded" are ordinary, expected responses
//! (204 and 503) carried by [`crate::coordinator::GetOutcome`], not this
//! type. `ApiError` is reserved for the things that really are exceptional:
//! malformed input, an unauthenticated privileged request, and anything
//! downstream that fails in a way the caller can't be expected to parse.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed video id or offset (§3, §7 Input-invalid). Rejected before
    /// any I/O.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// `/status` without (or with the wrong) shared bearer token.
    #[error("unauthorized")]
    Unauthorized,

    #[error("coordinator store error: {0}")]
    Coordinator(#[from] thumbcache_coordinator::CoordinatorError),

    #[error("artifact store error: {0}")]
    Storage(#[from] thumbcache_storage::StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Coordinator(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            ApiError::Coordinator(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "internal error serving request");
                "an internal error occurred".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
