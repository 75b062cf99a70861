//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store ping)
//!
//! # Auth
//! POST /api/auth/register      - Create account, returns identity + token
//! POST /api/auth/login         - Exchange credentials for a token
//! GET  /api/auth/me            - Current identity (requires auth)
//!
//! # Deliveries (requires auth)
//! POST /api/deliveries         - Create a delivery owned by the caller
//! GET  /api/deliveries         - List the caller's deliveries
//! ```

pub mod auth;
pub mod deliveries;
pub mod health;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Build the full application router.
///
/// Sentry layers are added by the binary around this router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config());

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/deliveries",
            get(deliveries::list).post(deliveries::create),
        )
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        );

    let app = match cors {
        Some(cors) => app.layer(cors),
        None => app,
    };

    app.with_state(state)
}

/// CORS for the configured browser origin, if any.
fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    let origin = config.cors_origin.as_deref()?;
    let Ok(origin) = origin.parse::<HeaderValue>() else {
        tracing::warn!(origin, "Ignoring invalid WAYMARK_CORS_ORIGIN");
        return None;
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}
