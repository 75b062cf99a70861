//! Business logic services.
//!
//! # Services
//!
//! - `token` - Bearer token issuing and verification
//! - `auth` - Password registration and login

pub mod auth;
pub mod token;
