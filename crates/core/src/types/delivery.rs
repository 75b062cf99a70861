//! Delivery records and the enriched creation payload.
//!
//! Field names on the wire are camelCase to match the browser client
//! (`customerName`, `warehouseAddressLat`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::coordinates::{Coordinates, Latitude, Longitude};
use super::id::{DeliveryId, UserId};

/// A persisted delivery.
///
/// `user_id` is assigned by the server from the authenticated caller and never
/// changes afterwards. Both coordinate pairs are always resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: DeliveryId,
    pub user_id: UserId,
    pub customer_name: String,
    pub warehouse_address_lat: Latitude,
    pub warehouse_address_lng: Longitude,
    pub delivery_date: NaiveDate,
    pub delivery_address_lat: Latitude,
    pub delivery_address_lng: Longitude,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    /// Coordinates of the warehouse the delivery leaves from.
    #[must_use]
    pub const fn warehouse(&self) -> Coordinates {
        Coordinates::new(self.warehouse_address_lat, self.warehouse_address_lng)
    }

    /// Coordinates of the delivery address.
    #[must_use]
    pub const fn destination(&self) -> Coordinates {
        Coordinates::new(self.delivery_address_lat, self.delivery_address_lng)
    }
}

/// A delivery after geocoding, ready to submit.
///
/// Carries no owner: the server stamps `user_id` from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDelivery {
    pub customer_name: String,
    pub warehouse_address_lat: Latitude,
    pub warehouse_address_lng: Longitude,
    pub delivery_date: NaiveDate,
    pub delivery_address_lat: Latitude,
    pub delivery_address_lng: Longitude,
}

impl NewDelivery {
    /// Assemble the payload from the two resolved coordinate pairs.
    #[must_use]
    pub fn new(
        customer_name: impl Into<String>,
        delivery_date: NaiveDate,
        warehouse: Coordinates,
        destination: Coordinates,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            warehouse_address_lat: warehouse.lat,
            warehouse_address_lng: warehouse.lng,
            delivery_date,
            delivery_address_lat: destination.lat,
            delivery_address_lng: destination.lng,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn baker_street() -> Coordinates {
        Coordinates::parse("51.5237629", "-0.1584743").unwrap()
    }

    fn downing_street() -> Coordinates {
        Coordinates::parse("51.5033635", "-0.1276248").unwrap()
    }

    #[test]
    fn test_new_delivery_wire_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let payload = NewDelivery::new("Alice", date, baker_street(), downing_street());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["customerName"], "Alice");
        assert_eq!(json["deliveryDate"], "2024-01-01");
        assert_eq!(json["warehouseAddressLat"], "51.5237629");
        assert_eq!(json["warehouseAddressLng"], "-0.1584743");
        assert_eq!(json["deliveryAddressLat"], "51.5033635");
        assert_eq!(json["deliveryAddressLng"], "-0.1276248");
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn test_delivery_coordinate_accessors() {
        let now = Utc::now();
        let delivery = Delivery {
            id: DeliveryId::new(1),
            user_id: UserId::new(9),
            customer_name: "Alice".to_owned(),
            warehouse_address_lat: baker_street().lat,
            warehouse_address_lng: baker_street().lng,
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            delivery_address_lat: downing_street().lat,
            delivery_address_lng: downing_street().lng,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(delivery.warehouse(), baker_street());
        assert_eq!(delivery.destination(), downing_street());

        let json = serde_json::to_value(&delivery).unwrap();
        assert_eq!(json["userId"], 9);
    }
}
