//! Persistence for users and deliveries.
//!
//! # Tables
//!
//! - `users` - Accounts (unique email, Argon2 password hash)
//! - `deliveries` - Delivery records, each owned by exactly one user
//!
//! # Backends
//!
//! - [`postgres::PgStore`] - `PostgreSQL` via `sqlx`
//! - [`memory::MemoryStore`] - in-process store for development and tests
//!
//! Every backend sits behind [`TimedStore`] at runtime, so a hung database
//! surfaces as [`RepositoryError::Timeout`] instead of a wedged request.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p waymark-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use waymark_core::{Delivery, Email, NewDelivery, PublicUser, UserId};

use crate::models::{NewUser, StoredCredentials};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store did not answer within the configured bound.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

/// User-scoped document store.
///
/// Delivery reads are always keyed by owner; there is no way to list
/// deliveries across users through this trait.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<PublicUser, RepositoryError>;

    /// Look up a user by ID, without the password hash.
    async fn find_user(&self, id: UserId) -> Result<Option<PublicUser>, RepositoryError>;

    /// Look up a user and their password hash by email, for login.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError>;

    /// Persist a delivery owned by `owner`.
    async fn create_delivery(
        &self,
        owner: UserId,
        delivery: &NewDelivery,
    ) -> Result<Delivery, RepositoryError>;

    /// All deliveries owned by `owner`, oldest first.
    async fn deliveries_for(&self, owner: UserId) -> Result<Vec<Delivery>, RepositoryError>;

    /// Cheap liveness probe used by the readiness endpoint.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Decorator that bounds every call on the wrapped store.
pub struct TimedStore {
    inner: Arc<dyn Store>,
    limit: Duration,
}

impl TimedStore {
    #[must_use]
    pub fn new(inner: Arc<dyn Store>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, RepositoryError>> + Send,
    ) -> Result<T, RepositoryError> {
        tokio::time::timeout(self.limit, fut)
            .await
            .map_err(|_| RepositoryError::Timeout(self.limit))?
    }
}

#[async_trait]
impl Store for TimedStore {
    async fn create_user(&self, user: NewUser) -> Result<PublicUser, RepositoryError> {
        self.bounded(self.inner.create_user(user)).await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<PublicUser>, RepositoryError> {
        self.bounded(self.inner.find_user(id)).await
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        self.bounded(self.inner.find_credentials(email)).await
    }

    async fn create_delivery(
        &self,
        owner: UserId,
        delivery: &NewDelivery,
    ) -> Result<Delivery, RepositoryError> {
        self.bounded(self.inner.create_delivery(owner, delivery))
            .await
    }

    async fn deliveries_for(&self, owner: UserId) -> Result<Vec<Delivery>, RepositoryError> {
        self.bounded(self.inner.deliveries_for(owner)).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.bounded(self.inner.ping()).await
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
