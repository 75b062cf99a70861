//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `WAYMARK_API_URL` - Server base URL (default: `http://127.0.0.1:5000`)
//! - `WAYMARK_GEOCODER_URL` - Nominatim-compatible search endpoint
//!   (default: `https://nominatim.openstreetmap.org/search`)
//! - `WAYMARK_GEOCODE_TIMEOUT_SECS` - Bound on each geocoding lookup (default: 5)
//! - `WAYMARK_HTTP_TIMEOUT_SECS` - Bound on each API call (default: 10)
//! - `WAYMARK_SESSION_FILE` - Where the signed-in session is kept
//!   (default: `.waymark/session.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_SESSION_FILE: &str = ".waymark/session.json";
const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Waymark API
    pub api_url: Url,
    /// Geocoder search endpoint
    pub geocoder_url: Url,
    /// Upper bound on one geocoding lookup
    pub geocode_timeout: Duration,
    /// Upper bound on one API call
    pub http_timeout: Duration,
    /// Persisted session location
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Build a configuration with default timeouts and session location.
    #[must_use]
    pub fn new(api_url: Url, geocoder_url: Url) -> Self {
        Self {
            api_url,
            geocoder_url,
            geocode_timeout: Duration::from_secs(DEFAULT_GEOCODE_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            api_url: parse_url("WAYMARK_API_URL", DEFAULT_API_URL)?,
            geocoder_url: parse_url("WAYMARK_GEOCODER_URL", DEFAULT_GEOCODER_URL)?,
            geocode_timeout: parse_secs(
                "WAYMARK_GEOCODE_TIMEOUT_SECS",
                DEFAULT_GEOCODE_TIMEOUT_SECS,
            )?,
            http_timeout: parse_secs("WAYMARK_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            session_file: PathBuf::from(
                get_optional_env("WAYMARK_SESSION_FILE")
                    .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string()),
            ),
        })
    }
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = get_optional_env(key).unwrap_or_else(|| default.to_string());
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new(
            Url::parse(DEFAULT_API_URL).unwrap(),
            Url::parse(DEFAULT_GEOCODER_URL).unwrap(),
        );
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(
            config.geocoder_url.host_str(),
            Some("nominatim.openstreetmap.org")
        );
        assert_eq!(config.geocode_timeout, Duration::from_secs(5));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.session_file, PathBuf::from(".waymark/session.json"));
    }

    #[test]
    fn test_parse_url_falls_back_to_default() {
        let url = parse_url("WAYMARK_TEST_UNSET_URL", DEFAULT_API_URL).unwrap();
        assert_eq!(url.port(), Some(5000));
    }

    #[test]
    fn test_parse_secs_falls_back_to_default() {
        let secs = parse_secs("WAYMARK_TEST_UNSET_SECS", 7).unwrap();
        assert_eq!(secs, Duration::from_secs(7));
    }
}
