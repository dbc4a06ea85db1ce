use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::debug;

use crate::adapters::normalizer::{self, BookingReplyShape, hotel};
use crate::adapters::transport::HttpTransport;
use crate::config::types::BookingConfig;
use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::criteria::{AvailabilityQuery, DateRange, SearchCriteria};
use crate::domain::inventory::{AvailabilityInfo, DataSource, Domain, InventoryItem};
use crate::error::{GatewayError, Result};
use crate::ports::provider::ProviderStrategy;

const LOCALE: &str = "en-gb";

const BOOKING_REPLY: BookingReplyShape<'static> = BookingReplyShape {
    id: &["/booking_id", "/reservation_id", "/id"],
    status: &["/status", "/booking_status"],
    total: &["/total_price", "/price/total"],
    currency: &["/currency", "/currency_code"],
};

/// Booking.com-style hotel API reached through an API marketplace.
pub struct DirectHotelProvider {
    transport: HttpTransport,
    currency: String,
    booking: BookingConfig,
}

impl DirectHotelProvider {
    pub fn new(transport: HttpTransport, currency: String, booking: BookingConfig) -> Self {
        Self {
            transport,
            currency,
            booking,
        }
    }

    /// Resolve a city name to the provider's destination id.
    async fn destination(&self, city: &str) -> Result<(String, String)> {
        let payload = self
            .transport
            .get_json("/v1/hotels/locations", &[("name", city), ("locale", LOCALE)])
            .await?;
        let destination = hotel::parse_destination(self.service(), &payload)?;
        debug!(city, dest_id = %destination.0, dest_type = %destination.1, "Resolved hotel destination");
        Ok(destination)
    }

    fn stay_params(&self, dates: DateRange, adults: u32) -> Vec<(&'static str, String)> {
        vec![
            ("checkin_date", dates.check_in.to_string()),
            ("checkout_date", dates.check_out.to_string()),
            ("adults_number", adults.to_string()),
            ("room_number", "1".into()),
            ("units", "metric".into()),
            ("locale", LOCALE.into()),
            ("filter_by_currency", self.currency.clone()),
        ]
    }
}

/// The provider insists on a stay; search without dates asks for tomorrow night.
fn stay_or_tomorrow(dates: Option<DateRange>, today: NaiveDate) -> DateRange {
    dates.unwrap_or_else(|| {
        let check_in = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let check_out = check_in.checked_add_days(Days::new(1)).unwrap_or(check_in);
        DateRange {
            check_in,
            check_out,
        }
    })
}

fn booking_body(request: &BookingRequest) -> Value {
    json!({
        "hotel_id": request.item_id,
        "checkin_date": request.dates.map(|d| d.check_in.to_string()),
        "checkout_date": request.dates.map(|d| d.check_out.to_string()),
        "adults_number": request.guests.adults,
        "children_number": request.guests.children,
        "room_number": request.units(),
        "guest": {
            "first_name": request.contact.first_name,
            "last_name": request.contact.last_name,
            "email": request.contact.email,
            "phone": request.contact.phone,
        },
        "special_requests": request.special_requests,
    })
}

#[async_trait]
impl ProviderStrategy for DirectHotelProvider {
    fn domain(&self) -> Domain {
        Domain::Hotels
    }

    fn source(&self) -> DataSource {
        DataSource::Provider
    }

    fn service(&self) -> &str {
        self.transport.service()
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<InventoryItem>> {
        criteria.validate()?;
        let dates = stay_or_tomorrow(criteria.dates, Utc::now().date_naive());
        let mut params = self.stay_params(dates, criteria.guests);
        params.push(("order_by", "popularity".into()));
        params.push(("page_number", "0".into()));

        let path = match (criteria.location.city_name(), criteria.location.coordinates) {
            (Some(city), _) => {
                let (dest_id, dest_type) = self.destination(city).await?;
                params.push(("dest_id", dest_id));
                params.push(("dest_type", dest_type));
                "/v1/hotels/search"
            }
            (None, Some(coords)) => {
                params.push(("latitude", coords.latitude.to_string()));
                params.push(("longitude", coords.longitude.to_string()));
                "/v1/hotels/search-by-coordinates"
            }
            (None, None) => return Err(GatewayError::invalid("location is required")),
        };

        let payload = self.transport.get_json(path, &params).await?;
        let items = hotel::parse_search(self.service(), &payload, &self.currency)?;
        debug!(count = items.len(), "Hotel provider search results");
        Ok(super::refine(items, criteria))
    }

    async fn details(&self, id: &str) -> Result<InventoryItem> {
        let payload = self
            .transport
            .get_json("/v1/hotels/data", &[("hotel_id", id), ("locale", LOCALE)])
            .await?;
        let raw = normalizer::detail_object(self.service(), &payload, &["/data", "/result"])?;
        let mut item = hotel::normalize(raw, &self.currency);
        if item.id() == "unknown" {
            item.summary_mut().id = id.to_string();
        }
        Ok(item)
    }

    async fn availability(&self, id: &str, query: &AvailabilityQuery) -> Result<AvailabilityInfo> {
        query.validate()?;
        let dates = query
            .dates
            .ok_or_else(|| GatewayError::invalid("hotel availability needs check-in and check-out dates"))?;
        let mut params = self.stay_params(dates, query.guests);
        params.push(("hotel_id", id.to_string()));

        let payload = self.transport.get_json("/v1/hotels/room-list", &params).await?;
        hotel::parse_room_list(self.service(), id, &payload, query, &self.currency)
    }

    async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        let service = self.service().to_string();
        let reply = self
            .transport
            .post_json("/v1/hotels/bookings", &booking_body(request))
            .await
            .map_err(|e| e.into_booking_failure(&service))?;

        let estimate = super::estimate(Domain::Hotels, request, None, &self.currency, &self.booking);
        Ok(normalizer::confirmation_from_reply(
            Domain::Hotels,
            request,
            &reply,
            &BOOKING_REPLY,
            estimate,
        ))
    }
}
