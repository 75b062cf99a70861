//! Waymark delivery tracking service.
//!
//! This crate provides the REST service as a library, allowing it to be
//! tested and embedded (the integration tests boot [`routes::router`] on an
//! ephemeral port).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
