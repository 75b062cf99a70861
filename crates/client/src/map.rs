//! Map markers for a delivery.
//!
//! Every delivery yields exactly two markers: the warehouse and the
//! destination. Renderers get plain `f64` degrees plus an OpenStreetMap link.

use core::fmt;

use waymark_core::{Coordinates, Delivery};

/// Zoom level used for marker links.
pub const MAP_ZOOM: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Warehouse,
    Delivery,
}

impl MarkerKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warehouse => "Warehouse location",
            Self::Delivery => "Delivery location",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMarker {
    pub kind: MarkerKind,
    pub lat: f64,
    pub lng: f64,
}

impl MapMarker {
    fn at(kind: MarkerKind, coordinates: Coordinates) -> Self {
        Self {
            kind,
            lat: coordinates.lat.as_f64(),
            lng: coordinates.lng.as_f64(),
        }
    }

    /// Link to the marker on openstreetmap.org.
    #[must_use]
    pub fn osm_url(&self) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map={MAP_ZOOM}/{lat}/{lng}",
            lat = self.lat,
            lng = self.lng,
        )
    }
}

/// Warehouse marker first, then the destination.
#[must_use]
pub fn markers(delivery: &Delivery) -> [MapMarker; 2] {
    [
        MapMarker::at(MarkerKind::Warehouse, delivery.warehouse()),
        MapMarker::at(MarkerKind::Delivery, delivery.destination()),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use waymark_core::{DeliveryId, UserId};

    use super::*;

    fn delivery() -> Delivery {
        let warehouse = Coordinates::parse("51.5237629", "-0.1584743").unwrap();
        let destination = Coordinates::parse("51.5033635", "-0.1276248").unwrap();
        let now = Utc::now();
        Delivery {
            id: DeliveryId::new(1),
            user_id: UserId::new(1),
            customer_name: "Alice".to_owned(),
            warehouse_address_lat: warehouse.lat,
            warehouse_address_lng: warehouse.lng,
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            delivery_address_lat: destination.lat,
            delivery_address_lng: destination.lng,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_two_markers_in_order() {
        let [warehouse, destination] = markers(&delivery());
        assert_eq!(warehouse.kind, MarkerKind::Warehouse);
        assert_eq!(destination.kind, MarkerKind::Delivery);
        assert!((warehouse.lat - 51.523_762_9).abs() < 1e-9);
        assert!((destination.lng + 0.127_624_8).abs() < 1e-9);
    }

    #[test]
    fn test_osm_link() {
        let [warehouse, _] = markers(&delivery());
        assert_eq!(
            warehouse.osm_url(),
            "https://www.openstreetmap.org/?mlat=51.5237629&mlon=-0.1584743#map=13/51.5237629/-0.1584743"
        );
        assert_eq!(warehouse.kind.to_string(), "Warehouse location");
    }
}
