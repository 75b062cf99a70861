//! Registration, login, and identity route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use waymark_core::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Turn a body extraction failure into a validation error.
pub(super) fn body_error(rejection: &JsonRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}

/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = body.map_err(|e| body_error(&e))?;

    let auth = AuthService::new(state.store(), state.tokens());
    let response = auth.register(request).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = body.map_err(|e| body_error(&e))?;

    let auth = AuthService::new(state.store(), state.tokens());
    let response = auth.login(request).await?;

    Ok(Json(response))
}

/// GET /api/auth/me
pub async fn me(RequireAuth(user): RequireAuth) -> Json<PublicUser> {
    Json(user)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::TestApp;

    #[tokio::test]
    async fn test_register_returns_created_identity_and_token() {
        let app = TestApp::new();
        let (status, body) = app
            .post_json(
                "/api/auth/register",
                None,
                json!({"username": "alice", "email": "alice@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert!(body["id"].is_i64());
        assert!(body["token"].as_str().unwrap().split('.').count() == 3);
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_bad_request() {
        let app = TestApp::new();
        app.register("alice").await;

        let (status, body) = app
            .post_json(
                "/api/auth/register",
                None,
                json!({"username": "other", "email": "alice@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation_failed");
        assert_eq!(body["error"], "An account with this email already exists");
    }

    #[tokio::test]
    async fn test_register_missing_field_is_bad_request() {
        let app = TestApp::new();
        let (status, body) = app
            .post_json(
                "/api/auth/register",
                None,
                json!({"username": "alice", "password": "password123"}),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation_failed");
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let app = TestApp::new();
        app.register("alice").await;

        let (status, body) = app
            .post_json(
                "/api/auth/login",
                None,
                json!({"email": "alice@example.com", "password": "not-the-password"}),
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_login_returns_fresh_token() {
        let app = TestApp::new();
        app.register("alice").await;

        let (status, body) = app
            .post_json(
                "/api/auth/login",
                None,
                json!({"email": "alice@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();

        let (status, me) = app.get("/api/auth/me", Some(token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "alice@example.com");
        assert!(me.get("token").is_none());
    }
}
