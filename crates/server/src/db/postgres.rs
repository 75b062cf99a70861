//! `PostgreSQL` store.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate
//! builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use waymark_core::{Delivery, DeliveryId, Email, Latitude, Longitude, NewDelivery, PublicUser, UserId};

use super::{RepositoryError, Store};
use crate::models::{NewUser, StoredCredentials};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    email: Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: DeliveryId,
    user_id: UserId,
    customer_name: String,
    warehouse_lat: Decimal,
    warehouse_lng: Decimal,
    delivery_date: NaiveDate,
    delivery_lat: Decimal,
    delivery_lng: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = RepositoryError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        let corrupt = |e: waymark_core::CoordinateError| {
            RepositoryError::DataCorruption(format!("delivery {}: {e}", row.id))
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            customer_name: row.customer_name.clone(),
            warehouse_address_lat: Latitude::try_from(row.warehouse_lat).map_err(corrupt)?,
            warehouse_address_lng: Longitude::try_from(row.warehouse_lng).map_err(corrupt)?,
            delivery_date: row.delivery_date,
            delivery_address_lat: Latitude::try_from(row.delivery_lat).map_err(corrupt)?,
            delivery_address_lng: Longitude::try_from(row.delivery_lng).map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const DELIVERY_COLUMNS: &str = "id, user_id, customer_name, warehouse_lat, warehouse_lng, \
     delivery_date, delivery_lat, delivery_lng, created_at, updated_at";

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for migrations and health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> Result<PublicUser, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, created_at, updated_at
            ",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_user(&self, id: UserId) -> Result<Option<PublicUser>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r"
            SELECT id, username, email, created_at, updated_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| StoredCredentials {
            user: r.user.into(),
            password_hash: r.password_hash,
        }))
    }

    #[instrument(skip(self, delivery))]
    async fn create_delivery(
        &self,
        owner: UserId,
        delivery: &NewDelivery,
    ) -> Result<Delivery, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO deliveries
                (user_id, customer_name, warehouse_lat, warehouse_lng,
                 delivery_date, delivery_lat, delivery_lng)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {DELIVERY_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(owner)
            .bind(&delivery.customer_name)
            .bind(delivery.warehouse_address_lat.value())
            .bind(delivery.warehouse_address_lng.value())
            .bind(delivery.delivery_date)
            .bind(delivery.delivery_address_lat.value())
            .bind(delivery.delivery_address_lng.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::Database(e)
            })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn deliveries_for(&self, owner: UserId) -> Result<Vec<Delivery>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {DELIVERY_COLUMNS}
            FROM deliveries
            WHERE user_id = $1
            ORDER BY created_at, id
            "
        );

        let rows = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
