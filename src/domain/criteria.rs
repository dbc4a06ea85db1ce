use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::inventory::{Coordinates, InventoryItem};
use crate::error::{GatewayError, Result};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Location {
    pub fn city(name: impl Into<String>) -> Self {
        Self {
            city: Some(name.into()),
            ..Self::default()
        }
    }

    /// City name if one was given and is not blank.
    pub fn city_name(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl DateRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        let range = Self {
            check_in,
            check_out,
        };
        range.validate()?;
        Ok(range)
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self> {
        let check_in = parse_date("check-in", check_in)?;
        let check_out = parse_date("check-out", check_out)?;
        Self::new(check_in, check_out)
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_out <= self.check_in {
            return Err(GatewayError::invalid(
                "check-out date must be after check-in date",
            ));
        }
        Ok(())
    }

    /// Nights (or rental days) covered, never less than one.
    pub fn nights(&self) -> u32 {
        let days = (self.check_out - self.check_in).num_days();
        u32::try_from(days).unwrap_or(1).max(1)
    }
}

fn parse_date(label: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        GatewayError::invalid(format!(
            "invalid {label} date '{value}', expected YYYY-MM-DD"
        ))
    })
}

/// Restaurant reservation date and time (`HH:MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSlot {
    pub date: NaiveDate,
    pub time: String,
}

impl ReservationSlot {
    pub fn validate(&self) -> Result<()> {
        NaiveTime::parse_from_str(self.time.trim(), "%H:%M").map_err(|_| {
            GatewayError::invalid(format!(
                "invalid reservation time '{}', expected HH:MM",
                self.time
            ))
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Property type, vehicle category or cuisine, depending on the domain.
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub dates: Option<DateRange>,
    #[serde(default)]
    pub reservation: Option<ReservationSlot>,
    #[serde(default = "default_guests")]
    pub guests: u32,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_guests() -> u32 {
    1
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            location: Location::default(),
            dates: None,
            reservation: None,
            guests: default_guests(),
            filters: SearchFilters::default(),
            limit: None,
        }
    }
}

impl SearchCriteria {
    pub fn for_city(city: impl Into<String>) -> Self {
        Self {
            location: Location::city(city),
            ..Self::default()
        }
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.location.city_name().is_none() && self.location.coordinates.is_none() {
            return Err(GatewayError::invalid(
                "location requires a city name or coordinates",
            ));
        }

        if let Some(coords) = self.location.coordinates
            && (!(-90.0..=90.0).contains(&coords.latitude)
                || !(-180.0..=180.0).contains(&coords.longitude))
        {
            return Err(GatewayError::invalid("coordinates are out of range"));
        }

        if self.guests == 0 {
            return Err(GatewayError::invalid("party size must be at least 1"));
        }

        if let Some(ref dates) = self.dates {
            dates.validate()?;
        }
        if let Some(ref slot) = self.reservation {
            slot.validate()?;
        }

        let filters = &self.filters;
        if filters.min_price.is_some_and(|p| p < 0.0) || filters.max_price.is_some_and(|p| p < 0.0)
        {
            return Err(GatewayError::invalid("price filters cannot be negative"));
        }
        if let Some(min) = filters.min_price
            && let Some(max) = filters.max_price
            && min > max
        {
            return Err(GatewayError::invalid(
                "minimum price cannot be greater than maximum price",
            ));
        }
        if let Some(rating) = filters.min_rating
            && !(0.0..=5.0).contains(&rating)
        {
            return Err(GatewayError::invalid("rating floor must be between 0 and 5"));
        }

        Ok(())
    }

    /// Canonical form used for cache digests and fallback seeding: equivalent
    /// criteria normalize to the same value.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut amenities: Vec<String> = self
            .filters
            .amenities
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        amenities.sort();
        amenities.dedup();

        Self {
            location: Location {
                city: self.location.city_name().map(str::to_lowercase),
                country: self
                    .location
                    .country
                    .as_deref()
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty()),
                coordinates: self.location.coordinates,
            },
            dates: self.dates,
            reservation: self.reservation.clone().map(|mut slot| {
                slot.time = slot.time.trim().to_string();
                slot
            }),
            guests: self.guests.max(1),
            filters: SearchFilters {
                min_price: self.filters.min_price,
                max_price: self.filters.max_price,
                min_rating: self.filters.min_rating,
                amenities,
                kind: self
                    .filters
                    .kind
                    .as_deref()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty()),
            },
            limit: Some(u32::try_from(self.effective_limit()).unwrap_or(DEFAULT_LIMIT)),
        }
    }

    /// Client-side filter for providers that cannot apply every filter upstream.
    pub fn matches(&self, item: &InventoryItem) -> bool {
        let summary = item.summary();
        let filters = &self.filters;
        if filters.min_price.is_some_and(|min| summary.price.amount < min) {
            return false;
        }
        if filters.max_price.is_some_and(|max| summary.price.amount > max) {
            return false;
        }
        if filters.min_rating.is_some_and(|min| summary.rating < min) {
            return false;
        }
        filters.amenities.iter().all(|wanted| {
            summary
                .amenities
                .iter()
                .any(|a| a.eq_ignore_ascii_case(wanted.trim()))
        })
    }

    /// Query parameters understood by the backend proxy.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(city) = self.location.city_name() {
            pairs.push(("city".into(), city.to_string()));
        }
        if let Some(ref country) = self.location.country {
            pairs.push(("country".into(), country.clone()));
        }
        if let Some(coords) = self.location.coordinates {
            pairs.push(("lat".into(), coords.latitude.to_string()));
            pairs.push(("lng".into(), coords.longitude.to_string()));
        }
        if let Some(dates) = self.dates {
            pairs.push(("checkIn".into(), dates.check_in.to_string()));
            pairs.push(("checkOut".into(), dates.check_out.to_string()));
        }
        if let Some(ref slot) = self.reservation {
            pairs.push(("date".into(), slot.date.to_string()));
            pairs.push(("time".into(), slot.time.clone()));
        }
        pairs.push(("guests".into(), self.guests.to_string()));
        if let Some(min) = self.filters.min_price {
            pairs.push(("minPrice".into(), min.to_string()));
        }
        if let Some(max) = self.filters.max_price {
            pairs.push(("maxPrice".into(), max.to_string()));
        }
        if let Some(rating) = self.filters.min_rating {
            pairs.push(("minRating".into(), rating.to_string()));
        }
        if !self.filters.amenities.is_empty() {
            pairs.push(("amenities".into(), self.filters.amenities.join(",")));
        }
        if let Some(ref kind) = self.filters.kind {
            pairs.push(("type".into(), kind.clone()));
        }
        pairs.push(("limit".into(), self.effective_limit().to_string()));

        pairs
    }
}

/// What an availability check asks about: a stay/rental period or a table slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub dates: Option<DateRange>,
    #[serde(default)]
    pub reservation: Option<ReservationSlot>,
    #[serde(default = "default_guests")]
    pub guests: u32,
}

impl AvailabilityQuery {
    pub fn for_dates(dates: DateRange) -> Self {
        Self {
            dates: Some(dates),
            reservation: None,
            guests: default_guests(),
        }
    }

    pub fn for_slot(slot: ReservationSlot, guests: u32) -> Self {
        Self {
            dates: None,
            reservation: Some(slot),
            guests,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dates.is_none() && self.reservation.is_none() {
            return Err(GatewayError::invalid(
                "availability needs a date range or a reservation slot",
            ));
        }
        if let Some(ref dates) = self.dates {
            dates.validate()?;
        }
        if let Some(ref slot) = self.reservation {
            slot.validate()?;
        }
        if self.guests == 0 {
            return Err(GatewayError::invalid("party size must be at least 1"));
        }
        Ok(())
    }
}
