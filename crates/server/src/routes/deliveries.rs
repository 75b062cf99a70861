//! Delivery route handlers.
//!
//! Both endpoints are scoped to the authenticated caller. The owner of a new
//! delivery always comes from the bearer token; any `userId` in the body or
//! query string is ignored.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use waymark_core::{CoordinateError, Coordinates, Delivery, NewDelivery};

use super::auth::body_error;
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::middleware::auth::NOT_AUTHORIZED;
use crate::state::AppState;

/// Body of `POST /api/deliveries` before validation.
///
/// Every field is optional here so that missing fields are reported together
/// as one validation message instead of a decode error for the first one.
/// Coordinates may arrive as JSON strings or numbers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryBody {
    customer_name: Option<String>,
    warehouse_address_lat: Option<Value>,
    warehouse_address_lng: Option<Value>,
    delivery_date: Option<String>,
    delivery_address_lat: Option<Value>,
    delivery_address_lng: Option<Value>,
}

impl CreateDeliveryBody {
    /// Validate into a [`NewDelivery`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming every missing field, or the
    /// first malformed coordinate or date.
    pub fn validate(self) -> Result<NewDelivery> {
        let customer_name = self
            .customer_name
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        let delivery_date = self.delivery_date.filter(|s| !s.trim().is_empty());

        let fields: [(&str, bool); 6] = [
            ("customerName", customer_name.is_some()),
            ("warehouseAddressLat", present(self.warehouse_address_lat.as_ref())),
            ("warehouseAddressLng", present(self.warehouse_address_lng.as_ref())),
            ("deliveryDate", delivery_date.is_some()),
            ("deliveryAddressLat", present(self.delivery_address_lat.as_ref())),
            ("deliveryAddressLng", present(self.delivery_address_lng.as_ref())),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect();

        let (Some(customer_name), Some(delivery_date), true) =
            (customer_name, delivery_date, missing.is_empty())
        else {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let delivery_date = NaiveDate::parse_from_str(delivery_date.trim(), "%Y-%m-%d")
            .map_err(|_| {
                AppError::Validation("deliveryDate must be a YYYY-MM-DD date".to_string())
            })?;

        let warehouse = Coordinates::new(
            coordinate("warehouseAddressLat", self.warehouse_address_lat)?,
            coordinate("warehouseAddressLng", self.warehouse_address_lng)?,
        );
        let destination = Coordinates::new(
            coordinate("deliveryAddressLat", self.delivery_address_lat)?,
            coordinate("deliveryAddressLng", self.delivery_address_lng)?,
        );

        Ok(NewDelivery::new(
            customer_name,
            delivery_date,
            warehouse,
            destination,
        ))
    }
}

/// Null, blank strings, and absent fields all count as missing.
fn present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Parse one coordinate field from a JSON string or number.
fn coordinate<T>(field: &str, value: Option<Value>) -> Result<T>
where
    T: std::str::FromStr<Err = CoordinateError>,
{
    let text = match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(AppError::Validation(format!(
                "{field} must be a decimal number"
            )));
        }
    };

    text.parse::<T>()
        .map_err(|e| AppError::Validation(format!("{field}: {e}")))
}

/// POST /api/deliveries
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CreateDeliveryBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Delivery>)> {
    let Json(body) = body.map_err(|e| body_error(&e))?;
    let delivery = body.validate()?;

    let created = state
        .store()
        .create_delivery(user.id, &delivery)
        .await
        .map_err(|e| match e {
            // Owner vanished between the auth lookup and the insert.
            RepositoryError::NotFound => AppError::Unauthorized(NOT_AUTHORIZED.to_string()),
            other => AppError::Repository(other),
        })?;

    tracing::info!(delivery_id = %created.id, "Delivery created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/deliveries
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Delivery>>> {
    let deliveries = state.store().deliveries_for(user.id).await?;
    Ok(Json(deliveries))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::{TimeDelta, Utc};
    use serde_json::json;
    use tower::ServiceExt;

    use waymark_core::{Email, PublicUser, UserId};

    use super::*;
    use crate::db::Store;
    use crate::models::{NewUser, StoredCredentials};
    use crate::routes::test_support::{TestApp, test_config};

    fn alice_payload() -> Value {
        json!({
            "customerName": "Alice",
            "warehouseAddressLat": "51.5237629",
            "warehouseAddressLng": "-0.1584743",
            "deliveryDate": "2024-01-01",
            "deliveryAddressLat": "51.5033635",
            "deliveryAddressLng": "-0.1276248"
        })
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let body = CreateDeliveryBody {
            customer_name: Some("  ".to_owned()),
            warehouse_address_lat: Some(json!("51.5")),
            warehouse_address_lng: Some(Value::Null),
            ..CreateDeliveryBody::default()
        };

        let err = body.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Missing required fields: customerName, warehouseAddressLng, \
             deliveryDate, deliveryAddressLat, deliveryAddressLng"
        );
    }

    #[test]
    fn test_validate_accepts_numbers_and_rejects_bad_dates() {
        let mut payload = alice_payload();
        payload["warehouseAddressLat"] = json!(51.5237629);
        let body: CreateDeliveryBody = serde_json::from_value(payload.clone()).unwrap();
        let delivery = body.validate().unwrap();
        assert_eq!(delivery.warehouse_address_lat.to_string(), "51.5237629");

        payload["deliveryDate"] = json!("01/01/2024");
        let body: CreateDeliveryBody = serde_json::from_value(payload).unwrap();
        assert!(matches!(body.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut payload = alice_payload();
        payload["deliveryAddressLat"] = json!("123.0");
        let body: CreateDeliveryBody = serde_json::from_value(payload).unwrap();
        let err = body.validate().unwrap_err();
        assert!(err.to_string().contains("deliveryAddressLat"));
    }

    #[tokio::test]
    async fn test_create_stores_caller_as_owner() {
        let app = TestApp::new();
        let (alice_id, alice_token) = app.register("alice").await;
        let (bob_id, _) = app.register("bob").await;

        let mut payload = alice_payload();
        payload["userId"] = json!(bob_id.as_i32());
        payload["user_id"] = json!(bob_id.as_i32());

        let (status, body) = app
            .post_json("/api/deliveries", Some(&alice_token), payload)
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["userId"], alice_id.as_i32());
        assert_eq!(body["customerName"], "Alice");
        assert_eq!(body["deliveryDate"], "2024-01-01");
        for field in [
            "warehouseAddressLat",
            "warehouseAddressLng",
            "deliveryAddressLat",
            "deliveryAddressLng",
        ] {
            let value = body[field].as_str().unwrap();
            assert!(!value.is_empty());
            assert!(value.parse::<f64>().is_ok(), "{field} = {value}");
        }
        assert!(body["id"].is_i64());
        assert!(body["createdAt"].is_string());

        assert!(app.store().deliveries_for(bob_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_never_crosses_users() {
        let app = TestApp::new();
        let (_, alice_token) = app.register("alice").await;
        let (bob_id, bob_token) = app.register("bob").await;

        app.post_json("/api/deliveries", Some(&alice_token), alice_payload())
            .await;
        let mut bobs = alice_payload();
        bobs["customerName"] = json!("Bob's customer");
        app.post_json("/api/deliveries", Some(&bob_token), bobs).await;

        let query = format!("/api/deliveries?userId={}", bob_id.as_i32());
        for path in ["/api/deliveries", query.as_str()] {
            let (status, body) = app.get(path, Some(&alice_token)).await;
            assert_eq!(status, StatusCode::OK);
            let records = body.as_array().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0]["customerName"], "Alice");
        }
    }

    #[tokio::test]
    async fn test_list_is_in_creation_order() {
        let app = TestApp::new();
        let (_, token) = app.register("alice").await;

        for name in ["first", "second", "third"] {
            let mut payload = alice_payload();
            payload["customerName"] = json!(name);
            let (status, _) = app.post_json("/api/deliveries", Some(&token), payload).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = app.get("/api/deliveries", Some(&token)).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["customerName"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_missing_fields_persist_nothing() {
        let app = TestApp::new();
        let (alice_id, token) = app.register("alice").await;

        let mut payload = alice_payload();
        payload.as_object_mut().unwrap().remove("deliveryDate");

        let (status, body) = app.post_json("/api/deliveries", Some(&token), payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation_failed");
        assert!(body["error"].as_str().unwrap().contains("deliveryDate"));
        assert!(app.store().deliveries_for(alice_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized_without_data() {
        let app = TestApp::new();
        let (alice_id, token) = app.register("alice").await;
        app.post_json("/api/deliveries", Some(&token), alice_payload())
            .await;

        let expired = app
            .state()
            .tokens()
            .issue_at(alice_id, Utc::now() - TimeDelta::days(31))
            .unwrap();
        let (status, body) = app.get("/api/deliveries", Some(&expired)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");
        assert_eq!(body["error"], "Request is not authorized");
        assert!(!body.is_array());
        assert!(body.get("customerName").is_none());
    }

    #[tokio::test]
    async fn test_missing_or_non_bearer_header_is_unauthorized() {
        let app = TestApp::new();

        let (status, body) = app.get("/api/deliveries", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization token required");

        let (status, body) = app
            .request_with_header("/api/deliveries", "Basic YWxpY2U6cHc=")
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization token required");
    }

    #[tokio::test]
    async fn test_unauthorized_wins_over_bad_body() {
        let app = TestApp::new();
        let (status, body) = app
            .post_json("/api/deliveries", None, json!({"customerName": "x"}))
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_unauthorized() {
        let app = TestApp::new();
        let (alice_id, token) = app.register("alice").await;
        assert!(app.store().delete_user(alice_id).await);

        let (status, body) = app.get("/api/deliveries", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Request is not authorized");

        let (status, _) = app
            .post_json("/api/deliveries", Some(&token), alice_payload())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    type StoreResult<T> = std::result::Result<T, RepositoryError>;

    /// A store that cannot look anyone up.
    struct BrokenUserLookup;

    #[async_trait::async_trait]
    impl Store for BrokenUserLookup {
        async fn create_user(&self, _: NewUser) -> StoreResult<PublicUser> {
            Err(RepositoryError::NotFound)
        }

        async fn find_user(&self, _: UserId) -> StoreResult<Option<PublicUser>> {
            Err(RepositoryError::DataCorruption("users row unreadable".to_owned()))
        }

        async fn find_credentials(
            &self,
            _: &Email,
        ) -> StoreResult<Option<StoredCredentials>> {
            Ok(None)
        }

        async fn create_delivery(
            &self,
            _: UserId,
            _: &NewDelivery,
        ) -> StoreResult<Delivery> {
            Err(RepositoryError::NotFound)
        }

        async fn deliveries_for(&self, _: UserId) -> StoreResult<Vec<Delivery>> {
            Ok(Vec::new())
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_user_lookup_is_unauthorized() {
        let state = AppState::new(test_config(), Arc::new(BrokenUserLookup));
        let token = state.tokens().issue(UserId::new(1)).unwrap();
        let request = Request::get("/api/deliveries")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = crate::routes::router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({"kind": "unauthorized", "error": "Request is not authorized"})
        );
    }
}
