use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::criteria::{DateRange, ReservationSlot};
use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Hotels,
    Rentals,
    Restaurants,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Hotels, Domain::Rentals, Domain::Restaurants];

    /// Root segment for cache keys of this domain.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hotels => "hotels",
            Self::Rentals => "rentals",
            Self::Restaurants => "restaurants",
        }
    }

    /// Path root on the backend proxy.
    pub fn proxy_root(self) -> &'static str {
        match self {
            Self::Hotels => "hotels",
            Self::Rentals => "car-rentals",
            Self::Restaurants => "restaurants",
        }
    }

    /// Path segment the proxy accepts booking POSTs on.
    pub fn booking_segment(self) -> &'static str {
        match self {
            Self::Hotels | Self::Rentals => "bookings",
            Self::Restaurants => "reservations",
        }
    }

    /// Value of the `kind` tag carried by items of this domain.
    pub fn item_kind(self) -> &'static str {
        match self {
            Self::Hotels => "hotel",
            Self::Rentals => "rental",
            Self::Restaurants => "restaurant",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hotel" | "hotels" => Ok(Self::Hotels),
            "rental" | "rentals" | "car-rental" | "car-rentals" => Ok(Self::Rentals),
            "restaurant" | "restaurants" => Ok(Self::Restaurants),
            other => Err(GatewayError::invalid(format!(
                "unknown domain '{other}', expected hotels, rentals or restaurants"
            ))),
        }
    }
}

/// Which path produced a piece of inventory data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Provider,
    Proxy,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Fields shared by every kind of inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Always on a 0-5 scale.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    #[serde(flatten)]
    pub summary: ItemSummary,
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    #[serde(default)]
    pub stars: Option<u8>,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub check_out_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    #[serde(flatten)]
    pub summary: ItemSummary,
    /// Renting agency or individual host.
    #[serde(default)]
    pub host: Option<String>,
    /// Seats for vehicles.
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(flatten)]
    pub summary: ItemSummary,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub opening_hours: Vec<String>,
    /// 1 (cheap) to 4 (expensive).
    #[serde(default)]
    pub price_level: Option<u8>,
}

/// Canonical, provider-independent inventory entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InventoryItem {
    Hotel(Hotel),
    Rental(Rental),
    Restaurant(Restaurant),
}

impl InventoryItem {
    pub fn summary(&self) -> &ItemSummary {
        match self {
            Self::Hotel(h) => &h.summary,
            Self::Rental(r) => &r.summary,
            Self::Restaurant(r) => &r.summary,
        }
    }

    pub fn summary_mut(&mut self) -> &mut ItemSummary {
        match self {
            Self::Hotel(h) => &mut h.summary,
            Self::Rental(r) => &mut r.summary,
            Self::Restaurant(r) => &mut r.summary,
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Self::Hotel(_) => Domain::Hotels,
            Self::Rental(_) => Domain::Rentals,
            Self::Restaurant(_) => Domain::Restaurants,
        }
    }

    pub fn id(&self) -> &str {
        &self.summary().id
    }

    #[must_use]
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.summary_mut().source = source;
        self
    }
}

impl std::fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.summary();
        write!(
            f,
            "{} - {} ({} {:.0}, {:.1}* {} reviews)",
            s.name, s.city, s.price.currency, s.price.amount, s.rating, s.review_count
        )
    }
}

/// Result of an availability check for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityInfo {
    pub item_id: String,
    pub domain: Domain,
    pub available: bool,
    #[serde(default)]
    pub dates: Option<DateRange>,
    #[serde(default)]
    pub reservation: Option<ReservationSlot>,
    /// Rooms, vehicles or tables left.
    #[serde(default)]
    pub units_left: Option<u32>,
    /// Bookable times for restaurants, `HH:MM`.
    #[serde(default)]
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub price_per_unit: Option<Price>,
    #[serde(default)]
    pub total_price: Option<Price>,
    #[serde(default)]
    pub source: DataSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ItemSummary {
        ItemSummary {
            id: "h1".into(),
            name: "Riad Atlas".into(),
            address: "12 Derb Sidi".into(),
            city: "Marrakech".into(),
            country: "Morocco".into(),
            coordinates: Some(Coordinates {
                latitude: 31.63,
                longitude: -8.0,
            }),
            rating: 4.5,
            review_count: 120,
            price: Price::new(900.0, "MAD"),
            images: vec!["https://img.example/1.jpg".into()],
            amenities: vec!["Pool".into()],
            source: DataSource::Provider,
        }
    }

    #[test]
    fn hotel_serializes_with_kind_tag_and_flattened_summary() {
        let item = InventoryItem::Hotel(Hotel {
            summary: summary(),
            room_types: vec![],
            stars: Some(4),
            check_in_time: None,
            check_out_time: None,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "hotel");
        assert_eq!(json["name"], "Riad Atlas");
        assert_eq!(json["reviewCount"], 120);
        assert_eq!(json["stars"], 4);
        assert_eq!(json["source"], "provider");
    }

    #[test]
    fn rental_deserializes_from_proxy_shape() {
        let json = serde_json::json!({
            "kind": "rental",
            "id": "r1",
            "name": "Dacia Logan",
            "city": "Rabat",
            "rating": 4.1,
            "price": { "amount": 320.0, "currency": "MAD" },
            "capacity": 5,
            "fuelType": "Diesel"
        });
        let item: InventoryItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.domain(), Domain::Rentals);
        match item {
            InventoryItem::Rental(r) => {
                assert_eq!(r.capacity, 5);
                assert_eq!(r.fuel_type.as_deref(), Some("Diesel"));
                assert!(r.summary.images.is_empty());
                assert_eq!(r.summary.source, DataSource::Provider);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn domain_parses_aliases() {
        assert_eq!("Hotels".parse::<Domain>().unwrap(), Domain::Hotels);
        assert_eq!("car-rentals".parse::<Domain>().unwrap(), Domain::Rentals);
        assert_eq!("restaurant".parse::<Domain>().unwrap(), Domain::Restaurants);
        assert!("flights".parse::<Domain>().is_err());
    }

    #[test]
    fn domain_paths() {
        assert_eq!(Domain::Rentals.proxy_root(), "car-rentals");
        assert_eq!(Domain::Restaurants.booking_segment(), "reservations");
        assert_eq!(Domain::Hotels.item_kind(), "hotel");
    }

    #[test]
    fn display_contains_key_fields() {
        let item = InventoryItem::Hotel(Hotel {
            summary: summary(),
            room_types: vec![],
            stars: None,
            check_in_time: None,
            check_out_time: None,
        });
        let s = item.to_string();
        assert!(s.contains("Riad Atlas"));
        assert!(s.contains("MAD 900"));
        assert!(s.contains("4.5*"));
    }
}
