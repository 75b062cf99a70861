//! Waymark Core - Shared types library.
//!
//! This crate provides common types used across all Waymark components:
//! - `server` - REST service for authentication and delivery records
//! - `client` - Session handling, geocoding, and the client state machine
//! - `cli` - Command-line front end and database migrations
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. Both sides of the wire share these definitions, so the JSON
//! the server writes is exactly the JSON the client reads.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, coordinates, delivery and auth payloads,
//!   and the error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
