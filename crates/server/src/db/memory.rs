//! In-memory store.
//!
//! Used when no database URL is configured, and by the test suites. Records
//! live in insertion order, which is also creation order.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use waymark_core::{Delivery, DeliveryId, Email, NewDelivery, PublicUser, UserId};

use super::{RepositoryError, Store};
use crate::models::{NewUser, StoredCredentials};

#[derive(Default)]
struct Tables {
    users: Vec<StoredCredentials>,
    deliveries: Vec<Delivery>,
    next_user_id: i32,
    next_delivery_id: i32,
}

/// Process-local store guarded by a single `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a user and everything they own.
    ///
    /// Account deletion has no API surface; this exists so callers can
    /// exercise the "token outlives its subject" path.
    pub async fn delete_user(&self, id: UserId) -> bool {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|c| c.user.id != id);
        tables.deliveries.retain(|d| d.user_id != id);
        tables.users.len() != before
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<PublicUser, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|c| c.user.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let public = PublicUser {
            id: UserId::new(tables.next_user_id),
            username: user.username,
            email: user.email,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(StoredCredentials {
            user: public.clone(),
            password_hash: user.password_hash,
        });
        Ok(public)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<PublicUser>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|c| &c.user.email == email).cloned())
    }

    async fn create_delivery(
        &self,
        owner: UserId,
        delivery: &NewDelivery,
    ) -> Result<Delivery, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|c| c.user.id == owner) {
            return Err(RepositoryError::NotFound);
        }

        tables.next_delivery_id += 1;
        let now = Utc::now();
        let record = Delivery {
            id: DeliveryId::new(tables.next_delivery_id),
            user_id: owner,
            customer_name: delivery.customer_name.clone(),
            warehouse_address_lat: delivery.warehouse_address_lat,
            warehouse_address_lng: delivery.warehouse_address_lng,
            delivery_date: delivery.delivery_date,
            delivery_address_lat: delivery.delivery_address_lat,
            delivery_address_lng: delivery.delivery_address_lng,
            created_at: now,
            updated_at: now,
        };
        tables.deliveries.push(record.clone());
        Ok(record)
    }

    async fn deliveries_for(&self, owner: UserId) -> Result<Vec<Delivery>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .deliveries
            .iter()
            .filter(|d| d.user_id == owner)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
