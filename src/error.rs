//! Error taxonomy: service-level errors and their HTTP mapping.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::StoreError;

/// Errors surfaced by the tally operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input, rejected before any mutation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested record or backup does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Persistence failed.
    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BackupNotFound(name) => {
                ServiceError::NotFound(format!("backup `{name}` not found"))
            }
            other => ServiceError::Storage(other),
        }
    }
}

/// Application-level errors converted into HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Route exists but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed,
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Storage(source) => AppError::Internal(source.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            ok: false,
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}
