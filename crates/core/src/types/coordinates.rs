//! Geographic coordinates in decimal degrees.
//!
//! Latitude and longitude are carried as exact decimals so the string a
//! geocoder returns (`"51.5237629"`) survives storage and the wire unchanged.
//! On the wire both serialize as JSON strings.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a coordinate.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    /// The text is not a decimal number.
    #[error("'{0}' is not a decimal number")]
    NotDecimal(String),
    /// Latitude outside [-90, 90].
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(Decimal),
    /// Longitude outside [-180, 180].
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(Decimal),
}

/// Latitude in decimal degrees, within `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Latitude(Decimal);

/// Longitude in decimal degrees, within `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Longitude(Decimal);

impl Latitude {
    /// Returns the exact decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns the value as a float, for map rendering.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl Longitude {
    /// Returns the exact decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns the value as a float, for map rendering.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl TryFrom<Decimal> for Latitude {
    type Error = CoordinateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value < Decimal::from(-90) || value > Decimal::from(90) {
            return Err(CoordinateError::LatitudeOutOfRange(value));
        }
        Ok(Self(value))
    }
}

impl TryFrom<Decimal> for Longitude {
    type Error = CoordinateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value < Decimal::from(-180) || value > Decimal::from(180) {
            return Err(CoordinateError::LongitudeOutOfRange(value));
        }
        Ok(Self(value))
    }
}

impl From<Latitude> for Decimal {
    fn from(lat: Latitude) -> Self {
        lat.0
    }
}

impl From<Longitude> for Decimal {
    fn from(lng: Longitude) -> Self {
        lng.0
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, CoordinateError> {
    Decimal::from_str(s.trim()).map_err(|_| CoordinateError::NotDecimal(s.to_owned()))
}

impl FromStr for Latitude {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(parse_decimal(s)?)
    }
}

impl FromStr for Longitude {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(parse_decimal(s)?)
    }
}

impl fmt::Display for Latitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Longitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved `(lat, lng)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: Latitude,
    pub lng: Longitude,
}

impl Coordinates {
    /// Build a pair from already-validated parts.
    #[must_use]
    pub const fn new(lat: Latitude, lng: Longitude) -> Self {
        Self { lat, lng }
    }

    /// Parse a pair from the decimal-degree strings a geocoder returns.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinateError`] if either string is not a decimal or is
    /// out of range.
    pub fn parse(lat: &str, lng: &str) -> Result<Self, CoordinateError> {
        Ok(Self {
            lat: lat.parse()?,
            lng: lng.parse()?,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_geocoder_precision() {
        let coords = Coordinates::parse("51.5237629", "-0.1584743").unwrap();
        assert_eq!(coords.lat.to_string(), "51.5237629");
        assert_eq!(coords.lng.to_string(), "-0.1584743");
    }

    #[test]
    fn test_range_limits_are_inclusive() {
        assert!("90".parse::<Latitude>().is_ok());
        assert!("-90".parse::<Latitude>().is_ok());
        assert!("180".parse::<Longitude>().is_ok());
        assert!(matches!(
            "90.0001".parse::<Latitude>(),
            Err(CoordinateError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            "-180.5".parse::<Longitude>(),
            Err(CoordinateError::LongitudeOutOfRange(_))
        ));
    }

    #[test]
    fn test_rejects_non_decimal_text() {
        assert!(matches!(
            "north".parse::<Latitude>(),
            Err(CoordinateError::NotDecimal(_))
        ));
        assert!("".parse::<Longitude>().is_err());
    }

    #[test]
    fn test_serializes_as_string_and_accepts_numbers() {
        let lat: Latitude = "48.8584".parse().unwrap();
        assert_eq!(serde_json::to_string(&lat).unwrap(), "\"48.8584\"");

        let from_number: Latitude = serde_json::from_str("48.8584").unwrap();
        assert_eq!(from_number, lat);

        assert!(serde_json::from_str::<Latitude>("\"123.0\"").is_err());
    }

    #[test]
    fn test_as_f64() {
        let lng: Longitude = "2.2945".parse().unwrap();
        assert!((lng.as_f64() - 2.2945).abs() < 1e-9);
    }
}
