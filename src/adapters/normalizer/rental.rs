use serde_json::Value;

use super::{
    RatingScale, clean_amenities, coordinates, count, first_number, first_text,
    images_or_placeholder, price_or_placeholder, strings,
};
use crate::domain::criteria::AvailabilityQuery;
use crate::domain::inventory::{
    AvailabilityInfo, DataSource, Domain, InventoryItem, ItemSummary, Price, Rental,
};
use crate::error::{GatewayError, Result};

fn vehicle_name(raw: &Value) -> String {
    if let Some(name) = first_text(raw, &["/name", "/title"]) {
        return name;
    }
    let make = first_text(raw, &["/make", "/vehicle/make"]);
    let model = first_text(raw, &["/model", "/vehicle/model"]);
    match (make, model) {
        (Some(make), Some(model)) => format!("{make} {model}"),
        (Some(one), None) | (None, Some(one)) => one,
        (None, None) => "Unnamed vehicle".into(),
    }
}

/// Vehicle-rental API record. Supplier ratings arrive on a 0-100 scale.
pub fn normalize(raw: &Value, default_currency: &str) -> InventoryItem {
    let amount = price_or_placeholder(
        Domain::Rentals,
        &[
            first_number(raw, &["/price/daily", "/pricing/daily"]),
            first_number(raw, &["/daily_rate", "/price/amount"]),
        ],
    );
    let currency = first_text(raw, &["/price/currency", "/currency"])
        .unwrap_or_else(|| default_currency.to_string());

    let mut images = strings(raw, "/images", Some("url"));
    if let Some(main) = first_text(raw, &["/image_url", "/image"]) {
        images.insert(0, main);
    }

    let mut amenities = strings(raw, "/features", Some("name"));
    if raw.get("air_conditioning").and_then(Value::as_bool) == Some(true) {
        amenities.push("Air conditioning".into());
    }
    if raw.get("unlimited_mileage").and_then(Value::as_bool) == Some(true) {
        amenities.push("Unlimited mileage".into());
    }

    InventoryItem::Rental(Rental {
        summary: ItemSummary {
            id: first_text(raw, &["/id", "/vehicle_id"]).unwrap_or_else(|| "unknown".into()),
            name: vehicle_name(raw),
            address: first_text(raw, &["/pickup/address", "/location/address"]).unwrap_or_default(),
            city: first_text(raw, &["/pickup/city", "/location/city"]).unwrap_or_default(),
            country: first_text(raw, &["/pickup/country", "/location/country"]).unwrap_or_default(),
            coordinates: coordinates(
                raw,
                &["/pickup/lat", "/location/lat", "/location/latitude"],
                &["/pickup/lng", "/location/lng", "/location/longitude"],
            ),
            rating: first_number(raw, &["/supplier/rating", "/rating"])
                .map_or(0.0, |r| RatingScale::Hundred.to_five(r)),
            review_count: count(raw, &["/supplier/reviews", "/reviews_count"]),
            price: Price::new(amount, currency),
            images: images_or_placeholder(Domain::Rentals, images),
            amenities: clean_amenities(amenities),
            source: DataSource::Provider,
        },
        host: first_text(raw, &["/supplier/name", "/agency"]),
        capacity: count(raw, &["/seats", "/capacity"]),
        category: first_text(raw, &["/category", "/class"]),
        fuel_type: first_text(raw, &["/fuel_type", "/fuel"]),
        transmission: first_text(raw, &["/transmission"]),
    })
}

/// `/vehicles/search` reply.
pub fn parse_search(service: &str, payload: &Value, currency: &str) -> Result<Vec<InventoryItem>> {
    super::map_items(service, payload, &["/vehicles", "/data", "/results"], |raw| {
        Ok(normalize(raw, currency))
    })
}

/// `/vehicles/{id}/availability` reply.
pub fn parse_availability(
    service: &str,
    vehicle_id: &str,
    payload: &Value,
    query: &AvailabilityQuery,
    default_currency: &str,
) -> Result<AvailabilityInfo> {
    let available = payload
        .get("available")
        .and_then(Value::as_bool)
        .ok_or_else(|| GatewayError::malformed(service, "availability reply has no 'available' flag"))?;

    let currency = first_text(payload, &["/price/currency", "/currency"])
        .unwrap_or_else(|| default_currency.to_string());
    let daily = first_number(payload, &["/price/daily", "/daily_rate"]).filter(|p| *p > 0.0);
    let days = query.dates.map_or(1, |d| d.nights());
    let total = first_number(payload, &["/price/total", "/total_price"])
        .filter(|p| *p > 0.0)
        .or_else(|| daily.map(|d| d * f64::from(days)));

    Ok(AvailabilityInfo {
        item_id: vehicle_id.to_string(),
        domain: Domain::Rentals,
        available,
        dates: query.dates,
        reservation: None,
        units_left: first_number(payload, &["/units_left", "/remaining"])
            .filter(|n| *n >= 0.0)
            .map(|n| n as u32),
        time_slots: Vec::new(),
        price_per_unit: daily.map(|d| Price::new(d, currency.clone())),
        total_price: total.map(|t| Price::new(t, currency)),
        source: DataSource::Provider,
    })
}
