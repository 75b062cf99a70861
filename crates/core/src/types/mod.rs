//! Core types for Waymark.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod auth;
pub mod coordinates;
pub mod delivery;
pub mod email;
pub mod error;
pub mod id;

pub use auth::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
pub use coordinates::{CoordinateError, Coordinates, Latitude, Longitude};
pub use delivery::{Delivery, NewDelivery};
pub use email::{Email, EmailError};
pub use error::{ApiFailure, ErrorBody, ErrorKind};
pub use id::*;
