//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS (only when an origin is configured)
//! 3. `TraceLayer` (request span with an empty `request_id` field)
//! 4. Request ID (fills the span field, tags Sentry, echoes the header)
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, so
//! it runs per handler after routing.

pub mod auth;
pub mod request_id;

pub use auth::{AuthRejection, RequireAuth};
pub use request_id::request_id_middleware;
