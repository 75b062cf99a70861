//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! wm migrate
//! ```
//!
//! # Environment Variables
//!
//! - `WAYMARK_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: WAYMARK_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

fn database_url() -> Result<SecretString, MigrationError> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    ["WAYMARK_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .map(SecretString::from)
        .ok_or(MigrationError::MissingDatabaseUrl)
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns error if the URL is missing, the database is unreachable, or a
/// migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
