use std::time::Duration;

use proptest::prelude::*;
use serde_json::{Value, json};

use wc2030_gateway::adapters::cache::memory_cache::MemoryCache;
use wc2030_gateway::adapters::fallback::FallbackGenerator;
use wc2030_gateway::adapters::normalizer::{self, hotel, rental, restaurant};
use wc2030_gateway::config::types::FallbackConfig;
use wc2030_gateway::domain::criteria::{DateRange, SearchCriteria};
use wc2030_gateway::domain::inventory::{Domain, InventoryItem};
use wc2030_gateway::ports::cache::InventoryCache;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        (-1000.0..100_000.0_f64).prop_map(|n| json!(n)),
        (-5..200_i64).prop_map(|n| json!(n)),
        "[0-9]{1,4}(\\.[0-9])?".prop_map(Value::String),
        "[a-z]{0,5}".prop_map(Value::String),
    ]
}

fn arb_images() -> impl Strategy<Value = Value> {
    prop::collection::vec(
        prop_oneof![
            "https://img\\.test/[a-z]{1,8}\\.jpg".prop_map(|u| json!({ "url": u, "url_max": u })),
            Just(Value::Null),
            Just(json!("")),
        ],
        0..5,
    )
    .prop_map(Value::Array)
}

fn arb_hotel_payload() -> impl Strategy<Value = Value> {
    (
        prop::option::of("[A-Za-z ]{0,30}"),
        arb_number(),
        arb_number(),
        arb_number(),
        arb_images(),
    )
        .prop_map(|(name, score, price, secondary, photos)| {
            json!({
                "hotel_id": 7,
                "hotel_name": name,
                "review_score": score,
                "min_total_price": price,
                "price_breakdown": { "gross_price": secondary },
                "photos": photos
            })
        })
}

fn arb_rental_payload() -> impl Strategy<Value = Value> {
    (arb_number(), arb_number(), arb_images(), prop::collection::vec("[A-Za-z ]{0,12}", 0..20))
        .prop_map(|(rating, daily, images, features)| {
            json!({
                "id": "veh",
                "supplier": { "rating": rating },
                "price": { "daily": daily },
                "images": images,
                "features": features
            })
        })
}

fn arb_restaurant_payload() -> impl Strategy<Value = Value> {
    (arb_number(), "[$€]{0,6}", arb_number(), prop::collection::vec("[a-z_]{0,10}", 0..8))
        .prop_map(|(rating, tier, average, transactions)| {
            json!({
                "id": "biz",
                "rating": rating,
                "price": tier,
                "average_price": average,
                "transactions": transactions
            })
        })
}

fn arb_criteria() -> impl Strategy<Value = SearchCriteria> {
    (
        prop::sample::select(vec!["Casablanca", "Rabat", "Marrakech", "Tangier", "Chefchaouen", ""]),
        1..12_u32,
        prop::option::of(1..80_u32),
        prop::option::of(0.0..5.0_f64),
        prop::option::of(0..60_u64),
    )
        .prop_map(|(city, guests, limit, min_rating, offset)| {
            let mut criteria = SearchCriteria::for_city(city);
            criteria.guests = guests;
            criteria.limit = limit;
            criteria.filters.min_rating = min_rating;
            criteria.dates = offset.map(|days| {
                let check_in = chrono::NaiveDate::from_ymd_opt(2030, 6, 1).unwrap()
                    + chrono::Days::new(days);
                DateRange::new(check_in, check_in + chrono::Days::new(2)).unwrap()
            });
            criteria
        })
}

fn assert_item_invariants(item: &InventoryItem) {
    let s = item.summary();
    assert!((0.0..=5.0).contains(&s.rating), "rating {}", s.rating);
    assert!(s.price.amount > 0.0, "price {}", s.price.amount);
    assert!(!s.price.currency.is_empty());
    assert!(!s.images.is_empty());
    assert!(s.amenities.len() <= normalizer::MAX_AMENITIES);
}

// ---------------------------------------------------------------------------
// Normalizer properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn hotel_normalizer_is_total(raw in arb_hotel_payload()) {
        let item = hotel::normalize(&raw, "MAD");
        assert_item_invariants(&item);
        prop_assert_eq!(item.domain(), Domain::Hotels);
    }

    #[test]
    fn rental_normalizer_is_total(raw in arb_rental_payload()) {
        let item = rental::normalize(&raw, "MAD");
        assert_item_invariants(&item);
        prop_assert_eq!(item.domain(), Domain::Rentals);
    }

    #[test]
    fn restaurant_normalizer_is_total(raw in arb_restaurant_payload()) {
        let item = restaurant::normalize(&raw, "MAD");
        assert_item_invariants(&item);
        prop_assert_eq!(item.domain(), Domain::Restaurants);
    }

    #[test]
    fn canonical_items_are_repaired(
        rating in -50.0..50.0_f64,
        price in -100.0..5000.0_f64,
        images in prop::collection::vec("https://img\\.test/[a-z]{1,6}\\.jpg", 0..3),
    ) {
        let raw = json!({
            "id": "x",
            "name": "Proxy item",
            "rating": rating,
            "price": { "amount": price, "currency": "MAD" },
            "images": images
        });
        let item = normalizer::canonical(Domain::Restaurants, &raw).unwrap();
        assert_item_invariants(&item);
    }

    #[test]
    fn rating_scales_stay_in_range(raw in -1000.0..1000.0_f64) {
        for scale in [normalizer::RatingScale::Five, normalizer::RatingScale::Ten, normalizer::RatingScale::Hundred] {
            let r = scale.to_five(raw);
            prop_assert!((0.0..=5.0).contains(&r));
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback generator properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn fallback_search_respects_limit_and_invariants(criteria in arb_criteria(), seed in any::<u64>()) {
        let generator = FallbackGenerator::new(&FallbackConfig { seed, ..FallbackConfig::default() });
        for domain in Domain::ALL {
            let items = generator.search(domain, &criteria);
            prop_assert!(items.len() <= criteria.effective_limit());
            for item in &items {
                assert_item_invariants(item);
                prop_assert_eq!(item.domain(), domain);
                if let Some(floor) = criteria.filters.min_rating {
                    prop_assert!(item.summary().rating >= floor);
                }
            }
        }
    }

    #[test]
    fn fallback_is_a_pure_function_of_criteria_and_seed(criteria in arb_criteria(), seed in any::<u64>()) {
        let config = FallbackConfig { seed, ..FallbackConfig::default() };
        let a = FallbackGenerator::new(&config);
        let b = FallbackGenerator::new(&config);
        prop_assert_eq!(a.search(Domain::Hotels, &criteria), b.search(Domain::Hotels, &criteria));
        prop_assert_eq!(a.search(Domain::Rentals, &criteria), a.search(Domain::Rentals, &criteria));
    }

    #[test]
    fn fallback_details_keep_requested_id(id in "[a-z0-9]{1,12}(-[a-z0-9]{1,8})?") {
        let generator = FallbackGenerator::new(&FallbackConfig::default());
        for domain in Domain::ALL {
            let item = generator.details(domain, &id);
            prop_assert_eq!(item.id(), id.as_str());
            assert_item_invariants(&item);
        }
    }
}

// ---------------------------------------------------------------------------
// Cache store properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prefix_invalidation_only_touches_its_domain(
        hotel_keys in prop::collection::hash_set("[a-f0-9]{16}", 0..20),
        rental_keys in prop::collection::hash_set("[a-f0-9]{16}", 0..20),
    ) {
        let cache = MemoryCache::new(100);
        let window = Duration::from_secs(600);
        for key in &hotel_keys {
            cache.set(&format!("hotels:search:{key}"), "[]", window, window);
        }
        for key in &rental_keys {
            cache.set(&format!("rentals:search:{key}"), "[]", window, window);
        }
        let dropped = cache.invalidate_prefix("hotels:");
        prop_assert_eq!(dropped, hotel_keys.len());
        prop_assert_eq!(cache.len(), rental_keys.len());
        for key in &rental_keys {
            let key = format!("rentals:search:{key}");
            prop_assert!(cache.get(&key).is_some());
        }
    }
}
