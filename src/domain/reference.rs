use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::inventory::Domain;
use crate::error::GatewayError;

/// Static lookup lists used to populate search filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceList {
    Amenities,
    Categories,
    FuelTypes,
    Cuisines,
}

impl ReferenceList {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amenities => "amenities",
            Self::Categories => "categories",
            Self::FuelTypes => "fuel-types",
            Self::Cuisines => "cuisines",
        }
    }

    /// Lists that make sense for a domain.
    pub fn for_domain(domain: Domain) -> &'static [ReferenceList] {
        match domain {
            Domain::Hotels => &[Self::Amenities],
            Domain::Rentals => &[Self::Categories, Self::FuelTypes, Self::Amenities],
            Domain::Restaurants => &[Self::Cuisines, Self::Amenities],
        }
    }

    pub fn supported_by(self, domain: Domain) -> bool {
        Self::for_domain(domain).contains(&self)
    }
}

impl FromStr for ReferenceList {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "amenities" | "features" => Ok(Self::Amenities),
            "categories" => Ok(Self::Categories),
            "fuel-types" | "fuel" => Ok(Self::FuelTypes),
            "cuisines" => Ok(Self::Cuisines),
            other => Err(GatewayError::invalid(format!(
                "unknown reference list '{other}'"
            ))),
        }
    }
}

/// Built-in values served when no backend supplies the list.
pub fn builtin(domain: Domain, list: ReferenceList) -> Vec<String> {
    let values: &[&str] = match (domain, list) {
        (Domain::Hotels, ReferenceList::Amenities) => &[
            "Free WiFi",
            "Swimming pool",
            "Spa",
            "Fitness center",
            "Restaurant",
            "Airport shuttle",
            "Parking",
            "Air conditioning",
            "Family rooms",
            "Hammam",
        ],
        (Domain::Rentals, ReferenceList::Amenities) => &[
            "Air conditioning",
            "GPS",
            "Bluetooth",
            "Child seat",
            "Unlimited mileage",
            "Roof rack",
        ],
        (Domain::Rentals, ReferenceList::Categories) => &[
            "Economy", "Compact", "Sedan", "SUV", "Van", "Luxury",
        ],
        (Domain::Rentals, ReferenceList::FuelTypes) => {
            &["Petrol", "Diesel", "Hybrid", "Electric"]
        }
        (Domain::Restaurants, ReferenceList::Cuisines) => &[
            "Moroccan",
            "Mediterranean",
            "Seafood",
            "French",
            "Italian",
            "Lebanese",
            "Japanese",
            "Vegetarian",
        ],
        (Domain::Restaurants, ReferenceList::Amenities) => &[
            "Terrace",
            "Live music",
            "Halal",
            "Vegan options",
            "Wheelchair accessible",
            "Reservations",
        ],
        _ => &[],
    };
    values.iter().map(|v| (*v).to_string()).collect()
}
