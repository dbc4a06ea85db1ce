use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::adapters::normalizer::{self, BookingReplyShape, restaurant};
use crate::adapters::transport::{HttpTransport, path_segment};
use crate::config::types::BookingConfig;
use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::inventory::{AvailabilityInfo, DataSource, Domain, InventoryItem};
use crate::error::{GatewayError, Result};
use crate::ports::provider::ProviderStrategy;

const BOOKING_REPLY: BookingReplyShape<'static> = BookingReplyShape {
    id: &["/reservation_id", "/id"],
    status: &["/status"],
    total: &["/deposit/amount", "/total"],
    currency: &["/deposit/currency", "/currency"],
};

/// Yelp-Fusion-style business search plus its reservations API.
pub struct DirectRestaurantProvider {
    transport: HttpTransport,
    currency: String,
    booking: BookingConfig,
}

impl DirectRestaurantProvider {
    pub fn new(transport: HttpTransport, currency: String, booking: BookingConfig) -> Self {
        Self {
            transport,
            currency,
            booking,
        }
    }
}

fn search_params(criteria: &SearchCriteria) -> Vec<(&'static str, String)> {
    let mut params = vec![("term", "restaurants".to_string())];
    match (criteria.location.city_name(), criteria.location.coordinates) {
        (Some(city), _) => {
            let location = match criteria.location.country.as_deref().map(str::trim) {
                Some(country) if !country.is_empty() => format!("{city}, {country}"),
                _ => city.to_string(),
            };
            params.push(("location", location));
        }
        (None, Some(coords)) => {
            params.push(("latitude", coords.latitude.to_string()));
            params.push(("longitude", coords.longitude.to_string()));
        }
        (None, None) => {}
    }
    if let Some(ref kind) = criteria.filters.kind {
        params.push(("categories", kind.trim().to_lowercase()));
    }
    if let Some(ref slot) = criteria.reservation {
        params.push(("reservation_date", slot.date.to_string()));
        params.push(("reservation_time", slot.time.trim().to_string()));
        params.push(("reservation_covers", criteria.guests.to_string()));
    }
    params.push(("limit", criteria.effective_limit().to_string()));
    params
}

fn booking_body(request: &BookingRequest) -> Value {
    json!({
        "date": request.reservation.as_ref().map(|s| s.date.to_string()),
        "time": request.reservation.as_ref().map(|s| s.time.trim().to_string()),
        "covers": request.guests.total(),
        "first_name": request.contact.first_name,
        "last_name": request.contact.last_name,
        "email": request.contact.email,
        "phone": request.contact.phone,
        "notes": request.special_requests,
    })
}

#[async_trait]
impl ProviderStrategy for DirectRestaurantProvider {
    fn domain(&self) -> Domain {
        Domain::Restaurants
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
            .get_json("/businesses/search", &search_params(criteria))
            .await?;
        let items = restaurant::parse_search(self.service(), &payload, &self.currency)?;
        debug!(count = items.len(), "Restaurant provider search results");
        Ok(super::refine(items, criteria))
    }

    async fn details(&self, id: &str) -> Result<InventoryItem> {
        let path = format!("/businesses/{}", path_segment(id));
        let payload = self.transport.get_json::<&str, &str>(&path, &[]).await?;
        let raw = normalizer::detail_object(self.service(), &payload, &["/business"])?;
        let mut item = restaurant::normalize(raw, &self.currency);
        if item.id() == "unknown" {
            item.summary_mut().id = id.to_string();
        }
        Ok(item)
    }

    async fn availability(&self, id: &str, query: &AvailabilityQuery) -> Result<AvailabilityInfo> {
        query.validate()?;
        let slot = query
            .reservation
            .as_ref()
            .ok_or_else(|| GatewayError::invalid("restaurant availability needs a reservation date and time"))?;
        let path = format!("/bookings/{}/openings", path_segment(id));
        let payload = self
            .transport
            .get_json(
                &path,
                &[
                    ("date", slot.date.to_string()),
                    ("time", slot.time.trim().to_string()),
                    ("covers", query.guests.to_string()),
                ],
            )
            .await?;
        restaurant::parse_openings(self.service(), id, &payload, query)
    }

    async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        let service = self.service().to_string();
        let path = format!("/bookings/{}/reservations", path_segment(&request.item_id));
        let reply = self
            .transport
            .post_json(&path, &booking_body(request))
            .await
            .map_err(|e| e.into_booking_failure(&service))?;

        let estimate = super::estimate(
            Domain::Restaurants,
            request,
            None,
            &self.currency,
            &self.booking,
        );
        Ok(normalizer::confirmation_from_reply(
            Domain::Restaurants,
            request,
            &reply,
            &BOOKING_REPLY,
            estimate,
        ))
    }
}
