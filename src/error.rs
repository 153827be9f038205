//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing required field or query parameter
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity absent, or present but not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-field collision. Reported as 400, not 409.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected store/runtime failure. The message is sent to the client as-is.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => msg,
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                msg
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                "A configuration error occurred".to_string()
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

/// Helper function to create a conflict error
pub fn conflict_error(msg: impl Into<String>) -> AppError {
    AppError::Conflict(msg.into())
}

/// Report a request body that could not be read as JSON (bad syntax, wrong
/// field types, missing content type) as a 400
pub fn invalid_json(rejection: &JsonRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}

/// Wrap an unexpected failure as a 500, prefixed with the action that failed
pub fn internal_error(action: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Error in {}: {}", action, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_bad_request() {
        assert_eq!(conflict_error("Email already exists").status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_found_error("User not found").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_keeps_raw_message() {
        let err = internal_error("creating user", "connection reset");
        assert_eq!(err.to_string(), "Internal error: Error in creating user: connection reset");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
