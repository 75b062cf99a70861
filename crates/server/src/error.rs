//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response carries the same JSON body:
//!
//! ```json
//! {"kind": "validation_failed", "error": "customerName is required"}
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use waymark_core::{ErrorBody, ErrorKind};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Persistence operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request input missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify the error into the wire taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Repository(_) => ErrorKind::StoreUnavailable,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => ErrorKind::Unauthorized,
                AuthError::InvalidEmail(_)
                | AuthError::MissingUsername
                | AuthError::WeakPassword(_)
                | AuthError::UserAlreadyExists => ErrorKind::ValidationFailed,
                AuthError::Repository(_) => ErrorKind::StoreUnavailable,
                AuthError::PasswordHash | AuthError::Token(_) => ErrorKind::Internal,
            },
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Validation(_) => ErrorKind::ValidationFailed,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::GeocodingFailed => StatusCode::BAD_GATEWAY,
            ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details stay in the logs.
    fn message(&self) -> String {
        match self {
            Self::Repository(_) | Self::Auth(AuthError::Repository(_)) => {
                "Service temporarily unavailable".to_string()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::MissingUsername => "Username is required".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Unauthorized(msg) | Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            kind: self.kind(),
            error: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
