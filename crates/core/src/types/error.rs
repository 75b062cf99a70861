//! The failure taxonomy shared by server and client.
//!
//! Every failure is classified once, where it originates, into an
//! [`ApiFailure`]: a stable [`ErrorKind`] plus a human-readable message.
//! Consumers match on the kind and display the message verbatim.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stable failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, invalid, or expired token, or the subject no longer exists.
    Unauthorized,
    /// Required input missing or malformed.
    ValidationFailed,
    /// An address could not be resolved to coordinates.
    GeocodingFailed,
    /// The persistence layer failed or timed out.
    StoreUnavailable,
    /// Reserved for single-record lookups.
    NotFound,
    /// An unexpected server-side failure outside the categories above.
    Internal,
}

impl ErrorKind {
    /// The `snake_case` name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::ValidationFailed => "validation_failed",
            Self::GeocodingFailed => "geocoding_failed",
            Self::StoreUnavailable => "store_unavailable",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiFailure {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    #[must_use]
    pub fn geocoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeocodingFailed, message)
    }

    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    /// Whether the caller must re-authenticate.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

/// JSON error body returned by every failing endpoint.
///
/// ```json
/// {"kind": "unauthorized", "error": "Authorization token required"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub error: String,
}

impl From<ErrorBody> for ApiFailure {
    fn from(body: ErrorBody) -> Self {
        Self::new(body.kind, body.error)
    }
}

impl From<ApiFailure> for ErrorBody {
    fn from(failure: ApiFailure) -> Self {
        Self {
            kind: failure.kind,
            error: failure.message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        for kind in [
            ErrorKind::Unauthorized,
            ErrorKind::ValidationFailed,
            ErrorKind::GeocodingFailed,
            ErrorKind::StoreUnavailable,
            ErrorKind::NotFound,
            ErrorKind::Internal,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_error_body_converts_to_failure() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"kind":"unauthorized","error":"Request is not authorized"}"#)
                .unwrap();
        let failure = ApiFailure::from(body);
        assert!(failure.is_unauthorized());
        assert_eq!(failure.to_string(), "Request is not authorized");
    }
}
