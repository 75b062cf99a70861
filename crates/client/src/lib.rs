//! Waymark client.
//!
//! Everything a front end needs to talk to the Waymark service:
//!
//! - [`api`] - `reqwest` client for the REST API, failures normalized to
//!   [`waymark_core::ApiFailure`]
//! - [`geocode`] - address resolution against a Nominatim endpoint
//! - [`session`] - the signed-in session and its on-disk persistence
//! - [`state`] - per-operation status flags and the held delivery list
//! - [`workflow`] - one delivery creation, form to stored record
//! - [`controller`] - the state machine tying the above together
//! - [`map`] - warehouse and destination markers for a delivery

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod controller;
pub mod geocode;
pub mod map;
pub mod session;
pub mod state;
pub mod workflow;

pub use api::{DeliveryApi, HttpApi};
pub use config::ClientConfig;
pub use controller::DeliveryController;
pub use geocode::{GeocodeOutcome, Geocoder, NominatimGeocoder};
pub use session::{Session, SessionStore};
pub use workflow::{DeliveryForm, WorkflowPhase};
