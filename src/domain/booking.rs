use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::criteria::{DateRange, ReservationSlot};
use crate::domain::inventory::{DataSource, Domain};
use crate::error::{GatewayError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestComposition {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

impl Default for GuestComposition {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
        }
    }
}

impl GuestComposition {
    pub fn total(&self) -> u32 {
        self.adults + self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub item_id: String,
    #[serde(default)]
    pub dates: Option<DateRange>,
    #[serde(default)]
    pub reservation: Option<ReservationSlot>,
    #[serde(default)]
    pub guests: GuestComposition,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub special_requests: Option<String>,
    /// Rooms or vehicles requested; defaults to one.
    #[serde(default)]
    pub units: Option<u32>,
}

impl BookingRequest {
    pub fn units(&self) -> u32 {
        self.units.unwrap_or(1).max(1)
    }

    /// Multiplier applied to a unit price: nights (or days) times units for
    /// stays and vehicles, covers for restaurants.
    pub fn billable_quantity(&self, domain: Domain) -> u32 {
        match domain {
            Domain::Hotels | Domain::Rentals => {
                self.dates.map_or(1, |d| d.nights()).saturating_mul(self.units())
            }
            Domain::Restaurants => self.guests.total().max(1),
        }
    }

    /// Local checks performed before any network call.
    pub fn validate(&self, domain: Domain) -> Result<()> {
        if self.item_id.trim().is_empty() {
            return Err(GatewayError::invalid("item id is required"));
        }

        let contact = &self.contact;
        if contact.first_name.trim().is_empty() {
            return Err(GatewayError::invalid("guest first name is required"));
        }
        if contact.last_name.trim().is_empty() {
            return Err(GatewayError::invalid("guest last name is required"));
        }
        if contact.email.trim().is_empty() {
            return Err(GatewayError::invalid("contact email is required"));
        }
        if !is_plausible_email(contact.email.trim()) {
            return Err(GatewayError::invalid(format!(
                "contact email '{}' is not valid",
                contact.email
            )));
        }

        if self.guests.adults == 0 {
            return Err(GatewayError::invalid("at least one adult is required"));
        }

        match domain {
            Domain::Hotels | Domain::Rentals => {
                let dates = self.dates.as_ref().ok_or_else(|| {
                    GatewayError::invalid("check-in and check-out dates are required")
                })?;
                dates.validate()?;
            }
            Domain::Restaurants => {
                let slot = self.reservation.as_ref().ok_or_else(|| {
                    GatewayError::invalid("reservation date and time are required")
                })?;
                slot.validate()?;
            }
        }

        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !host.contains('@')
        && host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !email.contains(char::is_whitespace)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base: f64,
    #[serde(default)]
    pub taxes: f64,
    #[serde(default)]
    pub fees: f64,
    pub total: f64,
    pub currency: String,
}

impl PriceBreakdown {
    /// Build a breakdown from a base amount and a tax rate; fees are flat.
    pub fn from_base(base: f64, tax_rate: f64, fees: f64, currency: impl Into<String>) -> Self {
        let taxes = round_cents(base * tax_rate);
        let base = round_cents(base);
        Self {
            base,
            taxes,
            fees,
            total: round_cents(base + taxes + fees),
            currency: currency.into(),
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    /// Identifier assigned by whichever backend accepted the booking.
    pub booking_id: String,
    /// Customer-facing reference minted by the gateway.
    #[serde(default)]
    pub confirmation_number: String,
    pub status: BookingStatus,
    pub domain: Domain,
    pub item_id: String,
    pub price: PriceBreakdown,
    pub contact: ContactInfo,
    pub guests: GuestComposition,
    #[serde(default)]
    pub dates: Option<DateRange>,
    #[serde(default)]
    pub reservation: Option<ReservationSlot>,
    #[serde(default)]
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source: DataSource,
}
