use serde_json::Value;

use super::{
    RatingScale, clean_amenities, coordinates, count, first_number, first_text,
    images_or_placeholder, item_array, price_or_placeholder, strings, text,
};
use crate::domain::criteria::AvailabilityQuery;
use crate::domain::inventory::{
    AvailabilityInfo, DataSource, Domain, Hotel, InventoryItem, ItemSummary, Price, RoomType,
};
use crate::error::{GatewayError, Result};

/// Booking.com-style hotel record (search result or `/v1/hotels/data`).
pub fn normalize(raw: &Value, default_currency: &str) -> InventoryItem {
    let currency = first_text(raw, &["/currency_code", "/currencycode", "/currency"])
        .unwrap_or_else(|| default_currency.to_string());

    let amount = price_or_placeholder(
        Domain::Hotels,
        &[
            first_number(raw, &["/min_total_price", "/composite_price_breakdown/all_inclusive_amount/value"]),
            first_number(raw, &["/price_breakdown/gross_price", "/price_breakdown/all_inclusive_price"]),
        ],
    );

    let mut images = strings(raw, "/photos", Some("url_max"));
    if let Some(main) = first_text(raw, &["/max_photo_url", "/main_photo_url", "/max_1440_photo_url"]) {
        images.insert(0, main);
    }

    let mut amenities = strings(raw, "/facilities", Some("name"));
    amenities.extend(strings(raw, "/hotel_facilities_filtered", Some("name")));
    if raw.get("is_free_cancellable").and_then(Value::as_i64) == Some(1) {
        amenities.push("Free cancellation".into());
    }
    if raw.get("hotel_include_breakfast").and_then(Value::as_i64) == Some(1) {
        amenities.push("Breakfast included".into());
    }

    let stars = first_number(raw, &["/class", "/stars"])
        .filter(|c| (1.0..=5.0).contains(c))
        .map(|c| c.round() as u8);

    InventoryItem::Hotel(Hotel {
        summary: ItemSummary {
            id: first_text(raw, &["/hotel_id", "/id"]).unwrap_or_else(|| "unknown".into()),
            name: first_text(raw, &["/hotel_name", "/name", "/hotel_name_trans"])
                .unwrap_or_else(|| "Unnamed hotel".into()),
            address: first_text(raw, &["/address", "/address_trans"]).unwrap_or_default(),
            city: first_text(raw, &["/city", "/city_trans", "/city_name_en"]).unwrap_or_default(),
            country: first_text(raw, &["/country_trans", "/country", "/cc1"]).unwrap_or_default(),
            coordinates: coordinates(
                raw,
                &["/latitude", "/location/latitude"],
                &["/longitude", "/location/longitude"],
            ),
            rating: first_number(raw, &["/review_score"])
                .map_or(0.0, |r| RatingScale::Ten.to_five(r)),
            review_count: count(raw, &["/review_nr", "/number_of_reviews"]),
            price: Price::new(amount, currency),
            images: images_or_placeholder(Domain::Hotels, images),
            amenities: clean_amenities(amenities),
            source: DataSource::Provider,
        },
        room_types: Vec::new(),
        stars,
        check_in_time: first_text(raw, &["/checkin/from", "/checkin/start"]),
        check_out_time: first_text(raw, &["/checkout/until", "/checkout/end", "/checkout/to"]),
    })
}

/// `/v1/hotels/search` reply: `{ "result": [...] }`.
pub fn parse_search(service: &str, payload: &Value, currency: &str) -> Result<Vec<InventoryItem>> {
    super::map_items(service, payload, &["/result", "/results"], |raw| {
        Ok(normalize(raw, currency))
    })
}

/// Pick the destination id from a `/v1/hotels/locations` reply: the first
/// city entry, else the first entry.
pub fn parse_destination(service: &str, payload: &Value) -> Result<(String, String)> {
    let entries = item_array(service, payload, &["/result", "/data"])?;
    let chosen = entries
        .iter()
        .find(|e| e.get("dest_type").and_then(Value::as_str) == Some("city"))
        .or_else(|| entries.first())
        .ok_or_else(|| GatewayError::malformed(service, "destination lookup returned no entries"))?;

    let dest_id = text(chosen, "/dest_id")
        .ok_or_else(|| GatewayError::malformed(service, "destination entry has no dest_id"))?;
    let dest_type = text(chosen, "/dest_type").unwrap_or_else(|| "city".into());
    Ok((dest_id, dest_type))
}

fn room_types(blocks: &[Value], default_currency: &str) -> Vec<RoomType> {
    blocks
        .iter()
        .filter_map(|block| {
            let name = first_text(block, &["/room_name", "/name_without_policy", "/name"])?;
            let amount = price_or_placeholder(
                Domain::Hotels,
                &[
                    first_number(block, &["/min_price/price", "/product_price_breakdown/gross_amount/value"]),
                    first_number(block, &["/price_breakdown/gross_price"]),
                ],
            );
            let currency = first_text(block, &["/min_price/currency", "/product_price_breakdown/gross_amount/currency"])
                .unwrap_or_else(|| default_currency.to_string());
            Some(RoomType {
                name,
                price: Price::new(amount, currency),
                capacity: count(block, &["/max_occupancy", "/nr_adults"]),
            })
        })
        .collect()
}

/// `/v1/hotels/room-list` reply: an array (or object) carrying a `block` list.
pub fn parse_room_list(
    service: &str,
    hotel_id: &str,
    payload: &Value,
    query: &AvailabilityQuery,
    currency: &str,
) -> Result<AvailabilityInfo> {
    let container = payload
        .as_array()
        .and_then(|a| a.first())
        .unwrap_or(payload);
    let blocks = container
        .get("block")
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::malformed(service, "room list has no block array"))?;

    let rooms: Vec<RoomType> = room_types(blocks, currency)
        .into_iter()
        .filter(|r| r.capacity == 0 || r.capacity >= query.guests)
        .collect();
    let cheapest = rooms
        .iter()
        .map(|r| r.price.clone())
        .min_by(|a, b| a.amount.total_cmp(&b.amount));
    let nights = query.dates.map_or(1, |d| d.nights());

    Ok(AvailabilityInfo {
        item_id: hotel_id.to_string(),
        domain: Domain::Hotels,
        available: !rooms.is_empty(),
        dates: query.dates,
        reservation: None,
        units_left: Some(u32::try_from(rooms.len()).unwrap_or(u32::MAX)),
        time_slots: Vec::new(),
        total_price: cheapest
            .as_ref()
            .map(|p| Price::new(p.amount * f64::from(nights), p.currency.clone())),
        price_per_unit: cheapest,
        source: DataSource::Provider,
    })
}
