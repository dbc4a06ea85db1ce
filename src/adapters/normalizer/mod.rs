//! Provider payload to canonical entity mapping.
//!
//! Entity mappers are total: any JSON object maps to an item, with absent
//! fields resolved to the defaults below. Only payloads with no recognizable
//! item container are rejected, as `MalformedResponse`.

pub mod hotel;
pub mod rental;
pub mod restaurant;

use serde_json::Value;

use crate::domain::booking::{BookingConfirmation, BookingRequest, BookingStatus, PriceBreakdown};
use crate::domain::inventory::{Coordinates, DataSource, Domain, InventoryItem};
use crate::error::{GatewayError, Result};

pub const MAX_AMENITIES: usize = 10;

/// Raw upstream payload, tagged by the schema it follows. Never leaves this module tree.
#[derive(Debug, Clone, Copy)]
pub enum ProviderPayload<'a> {
    BookingComHotel(&'a Value),
    VehicleRental(&'a Value),
    YelpBusiness(&'a Value),
    /// Already canonical (backend proxy), only re-validated.
    Canonical(Domain, &'a Value),
}

impl ProviderPayload<'_> {
    pub fn normalize(self, currency: &str) -> Result<InventoryItem> {
        match self {
            Self::BookingComHotel(raw) => Ok(hotel::normalize(raw, currency)),
            Self::VehicleRental(raw) => Ok(rental::normalize(raw, currency)),
            Self::YelpBusiness(raw) => Ok(restaurant::normalize(raw, currency)),
            Self::Canonical(domain, raw) => canonical(domain, raw),
        }
    }
}

/// Scale a provider rating arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingScale {
    Five,
    Ten,
    Hundred,
}

impl RatingScale {
    /// Map onto 0-5, one decimal. Non-finite input becomes 0.
    pub fn to_five(self, raw: f64) -> f64 {
        if !raw.is_finite() {
            return 0.0;
        }
        let scaled = match self {
            Self::Five => raw,
            Self::Ten => raw / 2.0,
            Self::Hundred => raw / 20.0,
        };
        round1(scaled.clamp(0.0, 5.0))
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Price used when neither the primary nor the secondary price field is usable.
pub fn placeholder_price(domain: Domain) -> f64 {
    match domain {
        Domain::Hotels => 850.0,
        Domain::Rentals => 350.0,
        Domain::Restaurants => 200.0,
    }
}

pub fn placeholder_images(domain: Domain) -> Vec<String> {
    let kind = domain.item_kind();
    (1..=3)
        .map(|n| format!("https://static.wc2030.ma/placeholders/{kind}-{n}.jpg"))
        .collect()
}

/// First price that is finite and strictly positive, else the placeholder.
pub fn price_or_placeholder(domain: Domain, candidates: &[Option<f64>]) -> f64 {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|p| p.is_finite() && *p > 0.0)
        .unwrap_or_else(|| placeholder_price(domain))
}

/// Trim, drop blanks, dedup case-insensitively, cap at [`MAX_AMENITIES`].
pub fn clean_amenities<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for amenity in raw {
        let amenity = amenity.as_ref().trim();
        if amenity.is_empty() || out.iter().any(|a| a.eq_ignore_ascii_case(amenity)) {
            continue;
        }
        out.push(amenity.to_string());
        if out.len() == MAX_AMENITIES {
            break;
        }
    }
    out
}

pub fn images_or_placeholder(domain: Domain, images: Vec<String>) -> Vec<String> {
    let images: Vec<String> = images
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    if images.is_empty() {
        placeholder_images(domain)
    } else {
        images
    }
}

/// Re-apply the canonical item rules to an item from any source.
#[must_use]
pub fn enforce_invariants(mut item: InventoryItem) -> InventoryItem {
    let domain = item.domain();
    let summary = item.summary_mut();
    summary.rating = RatingScale::Five.to_five(summary.rating);
    summary.price.amount = price_or_placeholder(domain, &[Some(summary.price.amount)]);
    if summary.price.currency.trim().is_empty() {
        summary.price.currency = "MAD".into();
    }
    summary.images = images_or_placeholder(domain, std::mem::take(&mut summary.images));
    summary.amenities = clean_amenities(std::mem::take(&mut summary.amenities));
    item
}

/// Decode an item that is already in canonical shape, injecting a missing `kind`.
pub fn canonical(domain: Domain, raw: &Value) -> Result<InventoryItem> {
    let Some(object) = raw.as_object() else {
        return Err(GatewayError::malformed(
            &format!("{domain}-proxy"),
            "item is not a JSON object",
        ));
    };
    let mut object = object.clone();
    object
        .entry("kind")
        .or_insert_with(|| Value::String(domain.item_kind().into()));

    let item: InventoryItem = serde_json::from_value(Value::Object(object)).map_err(|e| {
        GatewayError::malformed(&format!("{domain}-proxy"), format!("item does not decode: {e}"))
    })?;
    if item.domain() != domain {
        return Err(GatewayError::malformed(
            &format!("{domain}-proxy"),
            format!("expected a {} item, got {}", domain.item_kind(), item.domain().item_kind()),
        ));
    }
    Ok(enforce_invariants(item))
}

/// Locate the item array under the first pointer that holds one.
pub fn item_array<'a>(service: &str, payload: &'a Value, pointers: &[&str]) -> Result<&'a Vec<Value>> {
    if let Some(array) = payload.as_array() {
        return Ok(array);
    }
    pointers
        .iter()
        .find_map(|p| payload.pointer(p).and_then(Value::as_array))
        .ok_or_else(|| {
            GatewayError::malformed(
                service,
                format!("no result array at any of {}", pointers.join(", ")),
            )
        })
}

/// Map every object entry of a result array, skipping non-objects and
/// entries the mapper rejects.
pub fn map_items(
    service: &str,
    payload: &Value,
    pointers: &[&str],
    map: impl Fn(&Value) -> Result<InventoryItem>,
) -> Result<Vec<InventoryItem>> {
    let raw_items = item_array(service, payload, pointers)?;
    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items.iter().filter(|r| r.is_object()) {
        match map(raw) {
            Ok(item) => items.push(item),
            Err(e) => tracing::debug!(service, error = %e, "Skipping unmappable item"),
        }
    }
    Ok(items)
}

/// Details payloads: the object itself, or one nested under a wrapper key.
pub fn detail_object<'a>(service: &str, payload: &'a Value, wrappers: &[&str]) -> Result<&'a Value> {
    wrappers
        .iter()
        .find_map(|w| payload.pointer(w).filter(|v| v.is_object()))
        .or_else(|| payload.as_object().map(|_| payload))
        .ok_or_else(|| GatewayError::malformed(service, "details payload is not a JSON object"))
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// String at a pointer; numbers are stringified.
pub(crate) fn text(raw: &Value, pointer: &str) -> Option<String> {
    match raw.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn first_text(raw: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| text(raw, p))
}

/// Number at a pointer; numeric strings such as `"123.40"` are accepted.
pub(crate) fn number(raw: &Value, pointer: &str) -> Option<f64> {
    let value: Option<f64> = match raw.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    };
    value.filter(|n| n.is_finite())
}

pub(crate) fn first_number(raw: &Value, pointers: &[&str]) -> Option<f64> {
    pointers.iter().find_map(|p| number(raw, p))
}

pub(crate) fn count(raw: &Value, pointers: &[&str]) -> u32 {
    first_number(raw, pointers)
        .filter(|n| *n >= 0.0)
        .map_or(0, |n| n.min(f64::from(u32::MAX)) as u32)
}

/// Strings from an array at a pointer; object entries contribute `field`.
pub(crate) fn strings(raw: &Value, pointer: &str, field: Option<&str>) -> Vec<String> {
    raw.pointer(pointer)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| match (e, field) {
                    (Value::String(s), _) => Some(s.clone()),
                    (Value::Object(_), Some(f)) => e.get(f).and_then(Value::as_str).map(String::from),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn coordinates(raw: &Value, lat: &[&str], lng: &[&str]) -> Option<Coordinates> {
    let latitude = first_number(raw, lat)?;
    let longitude = first_number(raw, lng)?;
    ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)).then_some(
        Coordinates {
            latitude,
            longitude,
        },
    )
}

// ---------------------------------------------------------------------------
// Booking replies
// ---------------------------------------------------------------------------

pub(crate) fn booking_status(raw: Option<String>) -> BookingStatus {
    let Some(raw) = raw else {
        return BookingStatus::Confirmed;
    };
    match raw.to_ascii_lowercase().as_str() {
        "confirmed" | "booked" | "success" | "ok" | "accepted" => BookingStatus::Confirmed,
        "cancelled" | "canceled" | "rejected" => BookingStatus::Cancelled,
        _ => BookingStatus::Pending,
    }
}

/// Where a provider puts the pieces of its booking reply.
pub(crate) struct BookingReplyShape<'a> {
    pub id: &'a [&'a str],
    pub status: &'a [&'a str],
    pub total: &'a [&'a str],
    pub currency: &'a [&'a str],
}

/// Build a confirmation from a 2xx booking reply. `estimate` prices the booking
/// when the reply carries no total; the confirmation number is left for the pipeline.
pub(crate) fn confirmation_from_reply(
    domain: Domain,
    request: &BookingRequest,
    reply: &Value,
    shape: &BookingReplyShape<'_>,
    estimate: PriceBreakdown,
) -> BookingConfirmation {
    let booking_id = first_text(reply, shape.id).unwrap_or_else(|| {
        let id = format!("{}-{}", domain.item_kind(), uuid::Uuid::new_v4());
        tracing::warn!(%domain, booking_id = %id, "Booking reply carried no id, assigned one");
        id
    });
    let price = match first_number(reply, shape.total).filter(|t| *t > 0.0) {
        Some(total) => PriceBreakdown {
            base: total,
            taxes: 0.0,
            fees: 0.0,
            total,
            currency: first_text(reply, shape.currency).unwrap_or(estimate.currency),
        },
        None => estimate,
    };

    BookingConfirmation {
        booking_id,
        confirmation_number: String::new(),
        status: booking_status(first_text(reply, shape.status)),
        domain,
        item_id: request.item_id.clone(),
        price,
        contact: request.contact.clone(),
        guests: request.guests.clone(),
        dates: request.dates,
        reservation: request.reservation.clone(),
        special_requests: request.special_requests.clone(),
        created_at: chrono::Utc::now(),
        source: DataSource::Provider,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::{Hotel, ItemSummary, Price};
    use serde_json::json;

    #[test]
    fn rating_scales() {
        assert!((RatingScale::Ten.to_five(8.6) - 4.3).abs() < 1e-9);
        assert!((RatingScale::Hundred.to_five(90.0) - 4.5).abs() < 1e-9);
        assert!((RatingScale::Five.to_five(7.0) - 5.0).abs() < 1e-9);
        assert!(RatingScale::Five.to_five(-1.0).abs() < 1e-9);
        assert!(RatingScale::Ten.to_five(f64::NAN).abs() < 1e-9);
    }

    #[test]
    fn price_uses_first_positive_candidate() {
        assert!((price_or_placeholder(Domain::Hotels, &[None, Some(0.0), Some(420.0)]) - 420.0).abs() < 1e-9);
        assert!(
            (price_or_placeholder(Domain::Rentals, &[None, Some(-5.0)]) - placeholder_price(Domain::Rentals))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn amenities_deduped_and_capped() {
        let raw: Vec<String> = (0..15).map(|i| format!("amenity {i}")).collect();
        assert_eq!(clean_amenities(&raw).len(), MAX_AMENITIES);
        assert_eq!(clean_amenities(["Pool", " pool ", "", "Spa"]), vec!["Pool", "Spa"]);
    }

    #[test]
    fn empty_images_get_placeholders() {
        let images = images_or_placeholder(Domain::Restaurants, vec![" ".into()]);
        assert_eq!(images, placeholder_images(Domain::Restaurants));
        assert!(images[0].contains("restaurant"));
    }

    #[test]
    fn enforce_invariants_repairs_item() {
        let item = InventoryItem::Hotel(Hotel {
            summary: ItemSummary {
                id: "x".into(),
                name: "X".into(),
                address: String::new(),
                city: "Rabat".into(),
                country: "Morocco".into(),
                coordinates: None,
                rating: 9.0,
                review_count: 0,
                price: Price::new(f64::NAN, ""),
                images: vec![],
                amenities: vec!["Spa".into(), "spa".into()],
                source: DataSource::Proxy,
            },
            room_types: vec![],
            stars: None,
            check_in_time: None,
            check_out_time: None,
        });
        let fixed = enforce_invariants(item);
        let s = fixed.summary();
        assert!((s.rating - 5.0).abs() < 1e-9);
        assert!((s.price.amount - placeholder_price(Domain::Hotels)).abs() < 1e-9);
        assert_eq!(s.price.currency, "MAD");
        assert_eq!(s.images.len(), 3);
        assert_eq!(s.amenities, vec!["Spa"]);
    }

    #[test]
    fn canonical_injects_missing_kind() {
        let raw = json!({
            "id": "r-1",
            "name": "Clio",
            "price": { "amount": 300.0, "currency": "MAD" }
        });
        let item = canonical(Domain::Rentals, &raw).unwrap();
        assert_eq!(item.domain(), Domain::Rentals);
        assert!(!item.summary().images.is_empty());
    }

    #[test]
    fn canonical_rejects_wrong_kind_and_garbage() {
        let raw = json!({ "kind": "hotel", "id": "h", "name": "H", "price": { "amount": 1.0, "currency": "MAD" } });
        assert!(canonical(Domain::Restaurants, &raw).is_err());
        assert!(canonical(Domain::Hotels, &json!([1, 2])).is_err());
        assert!(canonical(Domain::Hotels, &json!({ "id": "h" })).is_err());
    }

    #[test]
    fn item_array_lookup() {
        let payload = json!({ "data": { "items": [1] } });
        assert_eq!(item_array("s", &payload, &["/result", "/data/items"]).unwrap().len(), 1);
        assert!(item_array("s", &json!({ "oops": true }), &["/result"]).is_err());
        assert_eq!(item_array("s", &json!([]), &["/result"]).unwrap().len(), 0);
    }

    #[test]
    fn number_accepts_numeric_strings() {
        let raw = json!({ "a": "1,234.50", "b": 3, "c": "n/a" });
        assert!((number(&raw, "/a").unwrap() - 1234.5).abs() < 1e-9);
        assert!((number(&raw, "/b").unwrap() - 3.0).abs() < 1e-9);
        assert!(number(&raw, "/c").is_none());
        assert!(number(&raw, "/missing").is_none());
    }

    #[test]
    fn booking_status_mapping() {
        assert_eq!(booking_status(None), BookingStatus::Confirmed);
        assert_eq!(booking_status(Some("BOOKED".into())), BookingStatus::Confirmed);
        assert_eq!(booking_status(Some("canceled".into())), BookingStatus::Cancelled);
        assert_eq!(booking_status(Some("on_hold".into())), BookingStatus::Pending);
    }
}
