//! Address to coordinate resolution.
//!
//! One free-text address, one provider call, first match wins. Results are
//! not cached.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use waymark_core::{ApiFailure, CoordinateError, Coordinates};

use crate::config::ClientConfig;

/// Sent with every lookup; Nominatim's usage policy requires one.
const USER_AGENT: &str = concat!("waymark/", env!("CARGO_PKG_VERSION"));

/// Result of a lookup that reached the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodeOutcome {
    /// The first match.
    Found(Coordinates),
    /// The provider returned an empty result set.
    NoMatch,
}

/// The provider could not be asked, or its answer was unusable.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Address was empty.
    #[error("address is empty")]
    EmptyAddress,

    /// Network failure or timeout.
    #[error("geocoding service unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("geocoding service returned HTTP {0}")]
    Status(u16),

    /// Provider returned coordinates that are not valid decimal degrees.
    #[error("geocoding service returned invalid coordinates: {0}")]
    InvalidCoordinates(#[from] CoordinateError),
}

impl From<GeocodeError> for ApiFailure {
    fn from(err: GeocodeError) -> Self {
        Self::geocoding(err.to_string())
    }
}

/// Resolves one address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up `address`.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError` if the provider cannot be reached or answers
    /// with something unusable. An empty result set is `Ok(NoMatch)`.
    async fn resolve(&self, address: &str) -> Result<GeocodeOutcome, GeocodeError>;
}

/// One entry of a Nominatim `format=json` search response.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// [`Geocoder`] backed by a Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: Url,
}

impl NominatimGeocoder {
    /// Create a geocoder for `config.geocoder_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, GeocodeError> {
        Self::with_endpoint(config.geocoder_url.clone(), config.geocode_timeout)
    }

    /// Create a geocoder for an explicit endpoint and timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_endpoint(endpoint: Url, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, address: &str) -> Result<GeocodeOutcome, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("format", "json"), ("q", address)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let places: Vec<Place> = response.json().await?;
        let Some(first) = places.into_iter().next() else {
            debug!("No geocoding match");
            return Ok(GeocodeOutcome::NoMatch);
        };

        let coordinates = Coordinates::parse(&first.lat, &first.lon)?;
        debug!(%coordinates, "Address resolved");
        Ok(GeocodeOutcome::Found(coordinates))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_place_parses_nominatim_shape() {
        let body = r#"[
            {"place_id": 1, "lat": "51.5237629", "lon": "-0.1584743", "display_name": "221B"},
            {"place_id": 2, "lat": "0", "lon": "0", "display_name": "elsewhere"}
        ]"#;
        let places: Vec<Place> = serde_json::from_str(body).unwrap();
        let first = places.into_iter().next().unwrap();
        let coords = Coordinates::parse(&first.lat, &first.lon).unwrap();
        assert_eq!(coords.lat.to_string(), "51.5237629");
    }

    #[test]
    fn test_errors_classify_as_geocoding_failed() {
        let failure = ApiFailure::from(GeocodeError::Status(503));
        assert_eq!(failure.kind, waymark_core::ErrorKind::GeocodingFailed);
        assert!(failure.message.contains("503"));
    }

    #[tokio::test]
    async fn test_empty_address_never_calls_out() {
        let geocoder = NominatimGeocoder::with_endpoint(
            Url::parse("http://127.0.0.1:9/search").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(
            geocoder.resolve("   ").await,
            Err(GeocodeError::EmptyAddress)
        ));
    }
}
