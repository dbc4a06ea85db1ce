use serde_json::Value;

use super::{
    RatingScale, clean_amenities, coordinates, count, first_number, first_text,
    images_or_placeholder, item_array, price_or_placeholder, strings, text,
};
use crate::domain::criteria::AvailabilityQuery;
use crate::domain::inventory::{
    AvailabilityInfo, DataSource, Domain, InventoryItem, ItemSummary, Price, Restaurant,
};
use crate::error::Result;

/// Average spend per guest for each step of a `$`..`$$$$` tier.
const SPEND_PER_TIER: f64 = 150.0;

const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn price_level(raw: &Value) -> Option<u8> {
    let tier = text(raw, "/price")?;
    let len = tier.chars().filter(|c| matches!(c, '$' | '€' | '£')).count();
    (1..=4).contains(&len).then(|| len as u8)
}

/// `"Mon 12:00-15:00"` per opening window; Yelp gives `HHMM` strings.
fn opening_hours(raw: &Value) -> Vec<String> {
    let Some(windows) = raw.pointer("/hours/0/open").and_then(Value::as_array) else {
        return Vec::new();
    };
    windows
        .iter()
        .filter_map(|w| {
            let day = w.get("day").and_then(Value::as_u64)?;
            let day = DAYS.get(usize::try_from(day).ok()?)?;
            let start = hhmm(w.get("start")?.as_str()?)?;
            let end = hhmm(w.get("end")?.as_str()?)?;
            Some(format!("{day} {start}-{end}"))
        })
        .collect()
}

fn hhmm(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == 4).then(|| format!("{}:{}", &digits[..2], &digits[2..]))
}

/// Yelp-Fusion-style business record.
pub fn normalize(raw: &Value, default_currency: &str) -> InventoryItem {
    let level = price_level(raw);
    let amount = price_or_placeholder(
        Domain::Restaurants,
        &[
            first_number(raw, &["/average_price", "/average_cost"]),
            level.map(|l| f64::from(l) * SPEND_PER_TIER),
        ],
    );

    let mut images = strings(raw, "/photos", None);
    if let Some(main) = text(raw, "/image_url") {
        images.retain(|i| i != &main);
        images.insert(0, main);
    }

    let address = strings(raw, "/location/display_address", None).join(", ");
    let address = if address.is_empty() {
        first_text(raw, &["/location/address1", "/address"]).unwrap_or_default()
    } else {
        address
    };

    let amenities: Vec<String> = strings(raw, "/transactions", None)
        .iter()
        .map(|t| match t.as_str() {
            "restaurant_reservation" => "Reservations".to_string(),
            "delivery" => "Delivery".to_string(),
            "pickup" => "Takeaway".to_string(),
            other => other.replace('_', " "),
        })
        .collect();

    InventoryItem::Restaurant(Restaurant {
        summary: ItemSummary {
            id: first_text(raw, &["/id", "/alias"]).unwrap_or_else(|| "unknown".into()),
            name: first_text(raw, &["/name"]).unwrap_or_else(|| "Unnamed restaurant".into()),
            address,
            city: first_text(raw, &["/location/city", "/city"]).unwrap_or_default(),
            country: first_text(raw, &["/location/country", "/country"]).unwrap_or_default(),
            coordinates: coordinates(raw, &["/coordinates/latitude"], &["/coordinates/longitude"]),
            rating: first_number(raw, &["/rating"]).map_or(0.0, |r| RatingScale::Five.to_five(r)),
            review_count: count(raw, &["/review_count"]),
            price: Price::new(
                amount,
                first_text(raw, &["/currency"]).unwrap_or_else(|| default_currency.to_string()),
            ),
            images: images_or_placeholder(Domain::Restaurants, images),
            amenities: clean_amenities(amenities),
            source: DataSource::Provider,
        },
        cuisines: strings(raw, "/categories", Some("title")),
        opening_hours: opening_hours(raw),
        price_level: level,
    })
}

/// `/businesses/search` reply.
pub fn parse_search(service: &str, payload: &Value, currency: &str) -> Result<Vec<InventoryItem>> {
    super::map_items(service, payload, &["/businesses"], |raw| {
        Ok(normalize(raw, currency))
    })
}

/// `/bookings/{id}/openings` reply: `{ "reservation_times": [{ "date", "times": [..] }] }`.
pub fn parse_openings(
    service: &str,
    business_id: &str,
    payload: &Value,
    query: &AvailabilityQuery,
) -> Result<AvailabilityInfo> {
    let days = item_array(service, payload, &["/reservation_times"])?;
    let wanted_date = query.reservation.as_ref().map(|s| s.date.to_string());

    let time_slots: Vec<String> = days
        .iter()
        .filter(|d| match wanted_date {
            Some(ref wanted) => d.get("date").and_then(Value::as_str) == Some(wanted.as_str()),
            None => true,
        })
        .flat_map(|d| strings(d, "/times", Some("time")))
        .collect();

    let available = match query.reservation {
        Some(ref slot) => time_slots.iter().any(|t| t == slot.time.trim()),
        None => !time_slots.is_empty(),
    };

    Ok(AvailabilityInfo {
        item_id: business_id.to_string(),
        domain: Domain::Restaurants,
        available,
        dates: None,
        reservation: query.reservation.clone(),
        units_left: None,
        time_slots,
        price_per_unit: None,
        total_price: None,
        source: DataSource::Provider,
    })
}
