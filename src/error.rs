//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::services::validation::FieldErrors;

/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and a stable error code
/// that clients can switch on.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error not recognized as a constraint violation
/// - **Authentication Errors**: Missing, expired or invalid tokens and credentials
/// - **Authorization Errors**: Authenticated but not allowed
/// - **Resource Errors**: Requested resources not found or already existing
/// - **Validation Errors**: Invalid request data, with per-field details
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// One or more request fields failed validation.
    ///
    /// Returns HTTP 400 with every failing field in `details`.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Request body or parameters are malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// Bearer token is missing.
    #[error("Authentication required")]
    Unauthorized,

    /// Email or password did not match.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Access or refresh token is invalid, expired or revoked.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Authenticated user lacks the required role or ownership.
    #[error("{0}")]
    Forbidden(String),

    /// Account has been deactivated by an administrator.
    #[error("Account is disabled")]
    AccountDisabled,

    /// Requested resource does not exist (or is not visible to the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Resource already exists or is in use.
    #[error("{0}")]
    Conflict(String),

    /// A state machine move that is not allowed from the current state.
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Uploaded file exceeds the configured limit.
    #[error("File exceeds the maximum allowed size")]
    PayloadTooLarge,

    /// Uploaded file has a content type we do not store.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// OAuth provider exists but is not configured on this deployment.
    #[error("Provider {0} is not available")]
    ProviderUnavailable(String),

    /// Unexpected failure outside the database (hashing, filesystem, token encoding).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a forbidden error with the default message.
    pub fn forbidden() -> Self {
        AppError::Forbidden("You do not have permission to perform this action".to_string())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::AccountDisabled => (StatusCode::FORBIDDEN, "ACCOUNT_DISABLED"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            AppError::ProviderUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
            }
        }
    }
}

/// Constraint violations become client errors; everything else stays a database error.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::Conflict("Resource already exists".to_string());
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::InvalidRequest(
                        "Referenced resource does not exist".to_string(),
                    );
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Body limit hits while streaming a field surface as `PAYLOAD_TOO_LARGE`.
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidRequest(err.body_text())
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a FieldErrors>,
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "success": false,
///   "error": {
///     "code": "VALIDATION_ERROR",
///     "message": "Validation failed",
///     "details": { "email": "Invalid email address" }
///   }
/// }
/// ```
///
/// Internal failures are logged here and reported without details.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                "An internal error occurred".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let details = match &self {
            AppError::Validation(fields) => Some(fields),
            _ => None,
        };

        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_carries_field_details() {
        let mut fields = FieldErrors::default();
        fields.add("email", "Invalid email address");
        let (status, body) = body_json(AppError::Validation(fields)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["email"], "Invalid email address");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_json(AppError::Internal("disk on fire".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn transition_error_maps_to_conflict() {
        let err = AppError::InvalidTransition {
            from: "ACCEPTED".into(),
            to: "CANCELLED".into(),
        };
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
        assert_eq!(body["error"]["message"], "Cannot move from ACCEPTED to CANCELLED");
    }

    #[tokio::test]
    async fn not_found_names_the_resource() {
        let (status, body) = body_json(AppError::NotFound("Service")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Service not found");
    }
}
