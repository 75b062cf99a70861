//! Domain models for the server.
//!
//! Wire types shared with the client live in `waymark-core`; these are the
//! server-only shapes that carry secrets or pre-persistence state.

pub mod user;

pub use user::{NewUser, StoredCredentials};
