//! Authentication extractor.
//!
//! Resolves `Authorization: Bearer <token>` to the user it was issued for.
//! Handlers that take [`RequireAuth`] never run for an unauthenticated
//! request.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use waymark_core::{ErrorBody, ErrorKind, PublicUser};

use crate::error::set_sentry_user;
use crate::state::AppState;

/// Message for a request with no usable bearer credential.
pub const TOKEN_REQUIRED: &str = "Authorization token required";

/// Message for a credential that does not resolve to a live user.
pub const NOT_AUTHORIZED: &str = "Request is not authorized";

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub PublicUser);

/// Error returned when a request is not authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// Header absent, not `Bearer`, or empty token.
    MissingToken,
    /// Token invalid or expired, its subject no longer exists, or the
    /// subject could not be looked up.
    NotAuthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => TOKEN_REQUIRED,
            Self::NotAuthorized => NOT_AUTHORIZED,
        };

        let body = ErrorBody {
            kind: ErrorKind::Unauthorized,
            error: message.to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        let user_id = state.tokens().verify(token).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            AuthRejection::NotAuthorized
        })?;

        let user = state
            .store()
            .find_user(user_id)
            .await
            .map_err(|e| {
                warn!(error = %e, %user_id, "User lookup failed during authorization");
                AuthRejection::NotAuthorized
            })?
            .ok_or_else(|| {
                debug!(%user_id, "Token subject no longer exists");
                AuthRejection::NotAuthorized
            })?;

        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

/// Extract the token from a `Bearer` authorization header.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/deliveries");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(None)), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&parts_with(Some("abc"))), None);
    }
}
