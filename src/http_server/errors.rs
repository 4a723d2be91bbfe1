//! # API Errors
//!
//! Every handler failure is mapped here to a status code and an
//! `{"error": "..."}` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::model::{UniqueField, ValidationError};
use crate::store::StoreError;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Id does not resolve to a record
    #[error("not found")]
    NotFound,

    /// Unique field already held by another record
    #[error("{} already registered", .0.label())]
    DuplicateField(UniqueField),

    /// Malformed payload or store-level constraint violation
    #[error("{0}")]
    Validation(String),

    /// Store closed or failing
    #[error("{0}")]
    StoreUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::DuplicateField(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::Validation(msg),
            other => ApiError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
