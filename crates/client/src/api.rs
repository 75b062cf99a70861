//! HTTP client for the Waymark API.
//!
//! Every failure is turned into an [`ApiFailure`] here, at the boundary,
//! so callers match on a kind instead of inspecting error shapes. The
//! message is taken from the first source present, in order:
//!
//! 1. the transport error itself (connection refused, timeout, ...)
//! 2. a plain-string response body
//! 3. a structured `{"kind", "error"}` response body
//!
//! falling back to the HTTP reason phrase.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use waymark_core::{
    ApiFailure, AuthResponse, Delivery, ErrorBody, ErrorKind, LoginRequest, NewDelivery,
    PublicUser, RegisterRequest,
};

use crate::config::ClientConfig;
use crate::session::Session;

/// The server operations the client state machine drives.
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    /// `POST /api/auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiFailure>;

    /// `POST /api/auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiFailure>;

    /// `GET /api/auth/me`
    async fn me(&self, session: &Session) -> Result<PublicUser, ApiFailure>;

    /// `POST /api/deliveries`
    async fn create_delivery(
        &self,
        session: &Session,
        delivery: &NewDelivery,
    ) -> Result<Delivery, ApiFailure>;

    /// `GET /api/deliveries`
    async fn get_deliveries(&self, session: &Session) -> Result<Vec<Delivery>, ApiFailure>;
}

/// [`DeliveryApi`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client for the API at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` failure if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiFailure> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ApiFailure::new(ErrorKind::Internal, e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiFailure> {
        self.base_url
            .join(path)
            .map_err(|e| ApiFailure::new(ErrorKind::Internal, format!("bad API URL: {e}")))
    }

    /// Send a request and decode a successful JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiFailure> {
        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(%status, error = %e, "Failed to read error response body");
                    String::new()
                }
            };
            debug!(%status, "API request rejected");
            return Err(failure_from_response(status, &body));
        }

        response.json::<T>().await.map_err(|e| {
            ApiFailure::new(ErrorKind::Internal, format!("unexpected API response: {e}"))
        })
    }
}

#[async_trait]
impl DeliveryApi for HttpApi {
    #[instrument(skip_all, fields(email = %request.email))]
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiFailure> {
        let url = self.url("api/auth/register")?;
        self.send(self.client.post(url).json(request)).await
    }

    #[instrument(skip_all, fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiFailure> {
        let url = self.url("api/auth/login")?;
        self.send(self.client.post(url).json(request)).await
    }

    #[instrument(skip_all, fields(user_id = %session.user.id))]
    async fn me(&self, session: &Session) -> Result<PublicUser, ApiFailure> {
        let url = self.url("api/auth/me")?;
        self.send(self.client.get(url).bearer_auth(&session.token))
            .await
    }

    #[instrument(skip_all, fields(user_id = %session.user.id))]
    async fn create_delivery(
        &self,
        session: &Session,
        delivery: &NewDelivery,
    ) -> Result<Delivery, ApiFailure> {
        let url = self.url("api/deliveries")?;
        self.send(
            self.client
                .post(url)
                .bearer_auth(&session.token)
                .json(delivery),
        )
        .await
    }

    #[instrument(skip_all, fields(user_id = %session.user.id))]
    async fn get_deliveries(&self, session: &Session) -> Result<Vec<Delivery>, ApiFailure> {
        let url = self.url("api/deliveries")?;
        self.send(self.client.get(url).bearer_auth(&session.token))
            .await
    }
}

/// Classify a transport-level failure. The server was never heard from.
fn transport_failure(err: reqwest::Error) -> ApiFailure {
    ApiFailure::store_unavailable(err.to_string())
}

/// Best-effort kind for a status when the body does not say.
const fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status.as_u16() {
        401 | 403 => ErrorKind::Unauthorized,
        400 | 422 => ErrorKind::ValidationFailed,
        404 => ErrorKind::NotFound,
        502 => ErrorKind::GeocodingFailed,
        503 | 504 => ErrorKind::StoreUnavailable,
        _ => ErrorKind::Internal,
    }
}

/// Build a failure from a non-success response.
pub(crate) fn failure_from_response(status: StatusCode, body: &str) -> ApiFailure {
    let kind = kind_for_status(status);
    let trimmed = body.trim();

    // A JSON string body is a plain-string payload.
    if let Ok(text) = serde_json::from_str::<String>(trimmed) {
        return ApiFailure::new(kind, text);
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        // Not JSON at all: the text is the message.
        Err(_) if !trimmed.is_empty() => ApiFailure::new(kind, trimmed),
        Ok(value) => serde_json::from_value::<ErrorBody>(value).map_or_else(
            |_| ApiFailure::new(kind, reason(status)),
            ApiFailure::from,
        ),
        Err(_) => ApiFailure::new(kind, reason(status)),
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
}
