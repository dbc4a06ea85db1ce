use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::adapters::normalizer::{self, BookingReplyShape, rental};
use crate::adapters::transport::{HttpTransport, path_segment};
use crate::config::types::BookingConfig;
use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::inventory::{AvailabilityInfo, DataSource, Domain, InventoryItem};
use crate::error::{GatewayError, Result};
use crate::ports::provider::ProviderStrategy;

const BOOKING_REPLY: BookingReplyShape<'static> = BookingReplyShape {
    id: &["/reservation_id", "/id", "/reservation/id"],
    status: &["/status", "/reservation/status"],
    total: &["/total_price", "/price/total", "/reservation/total"],
    currency: &["/currency", "/price/currency"],
};

/// Vehicle-rental API authenticated with a bearer token.
pub struct DirectRentalProvider {
    transport: HttpTransport,
    currency: String,
    booking: BookingConfig,
}

impl DirectRentalProvider {
    pub fn new(transport: HttpTransport, currency: String, booking: BookingConfig) -> Self {
        Self {
            transport,
            currency,
            booking,
        }
    }
}

fn search_params(criteria: &SearchCriteria, currency: &str) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(city) = criteria.location.city_name() {
        params.push(("city", city.to_string()));
    }
    if let Some(coords) = criteria.location.coordinates {
        params.push(("lat", coords.latitude.to_string()));
        params.push(("lng", coords.longitude.to_string()));
    }
    if let Some(dates) = criteria.dates {
        params.push(("pickup_date", dates.check_in.to_string()));
        params.push(("dropoff_date", dates.check_out.to_string()));
    }
    params.push(("passengers", criteria.guests.to_string()));
    if let Some(ref kind) = criteria.filters.kind {
        params.push(("category", kind.trim().to_lowercase()));
    }
    if let Some(min) = criteria.filters.min_price {
        params.push(("min_price", min.to_string()));
    }
    if let Some(max) = criteria.filters.max_price {
        params.push(("max_price", max.to_string()));
    }
    params.push(("currency", currency.to_string()));
    params.push(("limit", criteria.effective_limit().to_string()));
    params
}

fn booking_body(request: &BookingRequest) -> Value {
    json!({
        "vehicle_id": request.item_id,
        "pickup_date": request.dates.map(|d| d.check_in.to_string()),
        "dropoff_date": request.dates.map(|d| d.check_out.to_string()),
        "passengers": request.guests.total(),
        "quantity": request.units(),
        "driver": {
            "first_name": request.contact.first_name,
            "last_name": request.contact.last_name,
            "email": request.contact.email,
            "phone": request.contact.phone,
        },
        "notes": request.special_requests,
    })
}

#[async_trait]
impl ProviderStrategy for DirectRentalProvider {
    fn domain(&self) -> Domain {
        Domain::Rentals
    }

    fn source(&self) -> DataSource {
        DataSource::Provider
    }

    fn service(&self) -> &str {
        self.transport.service()
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<InventoryItem>> {
        criteria.validate()?;
        let payload = self
            .transport
            .get_json("/vehicles/search", &search_params(criteria, &self.currency))
            .await?;
        let items = rental::parse_search(self.service(), &payload, &self.currency)?;
        debug!(count = items.len(), "Rental provider search results");
        Ok(super::refine(items, criteria))
    }

    async fn details(&self, id: &str) -> Result<InventoryItem> {
        let path = format!("/vehicles/{}", path_segment(id));
        let payload = self.transport.get_json::<&str, &str>(&path, &[]).await?;
        let raw = normalizer::detail_object(self.service(), &payload, &["/vehicle", "/data"])?;
        let mut item = rental::normalize(raw, &self.currency);
        if item.id() == "unknown" {
            item.summary_mut().id = id.to_string();
        }
        Ok(item)
    }

    async fn availability(&self, id: &str, query: &AvailabilityQuery) -> Result<AvailabilityInfo> {
        query.validate()?;
        let dates = query
            .dates
            .ok_or_else(|| GatewayError::invalid("rental availability needs pick-up and drop-off dates"))?;
        let path = format!("/vehicles/{}/availability", path_segment(id));
        let payload = self
            .transport
            .get_json(
                &path,
                &[
                    ("pickup_date", dates.check_in.to_string()),
                    ("dropoff_date", dates.check_out.to_string()),
                ],
            )
            .await?;
        rental::parse_availability(self.service(), id, &payload, query, &self.currency)
    }

    async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        let service = self.service().to_string();
        let reply = self
            .transport
            .post_json("/reservations", &booking_body(request))
            .await
            .map_err(|e| e.into_booking_failure(&service))?;

        let estimate = super::estimate(Domain::Rentals, request, None, &self.currency, &self.booking);
        Ok(normalizer::confirmation_from_reply(
            Domain::Rentals,
            request,
            &reply,
            &BOOKING_REPLY,
            estimate,
        ))
    }
}
