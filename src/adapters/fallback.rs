//! Deterministic synthetic inventory.
//!
//! Every value is drawn from a [`StdRng`] seeded with the configured seed mixed
//! with a digest of what is being generated, so identical inputs always yield
//! identical output and item details can be rebuilt from an item id alone.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::adapters::normalizer::{self, clean_amenities};
use crate::config::types::FallbackConfig;
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::inventory::{
    AvailabilityInfo, Coordinates, DataSource, Domain, Hotel, InventoryItem, ItemSummary, Price,
    Rental, Restaurant, RoomType,
};
use crate::domain::reference::{self, ReferenceList};

const ID_PREFIX: &str = "fb";

struct KnownCity {
    name: &'static str,
    country: &'static str,
    latitude: f64,
    longitude: f64,
    /// Relative cost of living, 1.0 for the default market.
    price_index: f64,
}

const CITIES: &[KnownCity] = &[
    KnownCity { name: "Casablanca", country: "Morocco", latitude: 33.5731, longitude: -7.5898, price_index: 1.0 },
    KnownCity { name: "Rabat", country: "Morocco", latitude: 34.0209, longitude: -6.8416, price_index: 0.95 },
    KnownCity { name: "Marrakech", country: "Morocco", latitude: 31.6295, longitude: -7.9811, price_index: 1.15 },
    KnownCity { name: "Tangier", country: "Morocco", latitude: 35.7595, longitude: -5.834, price_index: 0.9 },
    KnownCity { name: "Fes", country: "Morocco", latitude: 34.0181, longitude: -5.0078, price_index: 0.8 },
    KnownCity { name: "Agadir", country: "Morocco", latitude: 30.4278, longitude: -9.5981, price_index: 0.9 },
    KnownCity { name: "Madrid", country: "Spain", latitude: 40.4168, longitude: -3.7038, price_index: 1.6 },
    KnownCity { name: "Barcelona", country: "Spain", latitude: 41.3874, longitude: 2.1686, price_index: 1.7 },
    KnownCity { name: "Seville", country: "Spain", latitude: 37.3891, longitude: -5.9845, price_index: 1.3 },
    KnownCity { name: "Bilbao", country: "Spain", latitude: 43.263, longitude: -2.935, price_index: 1.4 },
    KnownCity { name: "Malaga", country: "Spain", latitude: 36.7213, longitude: -4.4214, price_index: 1.3 },
    KnownCity { name: "Lisbon", country: "Portugal", latitude: 38.7223, longitude: -9.1393, price_index: 1.4 },
    KnownCity { name: "Porto", country: "Portugal", latitude: 41.1579, longitude: -8.6291, price_index: 1.25 },
];

const HOTEL_PREFIXES: &[&str] = &["Hotel", "Riad", "Grand Hotel", "Suites", "Palace", "Residence"];
const PLACE_WORDS: &[&str] = &[
    "Atlas", "Corniche", "Medina", "Andalus", "Marina", "Zellige", "Oasis", "Kasbah", "Mirador",
    "Alcazar", "Atlantico", "Jardin",
];
const STREETS: &[&str] = &[
    "Boulevard Mohammed V",
    "Avenue Hassan II",
    "Rue de la Liberte",
    "Calle Mayor",
    "Avenida da Liberdade",
    "Paseo del Prado",
];
const AGENCIES: &[&str] = &[
    "Atlas Car Hire",
    "Medina Rent",
    "Iberia Drive",
    "Lusitania Cars",
    "Stadium Wheels",
];
const RESTAURANT_PREFIXES: &[&str] = &["Dar", "Cafe", "La Table", "Chez", "Taberna", "Casa"];

struct Vehicle {
    name: &'static str,
    category: &'static str,
    seats: u32,
    fuel: &'static str,
    transmission: &'static str,
    price_factor: f64,
}

const VEHICLES: &[Vehicle] = &[
    Vehicle { name: "Dacia Logan", category: "Economy", seats: 5, fuel: "Diesel", transmission: "Manual", price_factor: 0.8 },
    Vehicle { name: "Renault Clio", category: "Compact", seats: 5, fuel: "Petrol", transmission: "Manual", price_factor: 0.9 },
    Vehicle { name: "Toyota Corolla Hybrid", category: "Sedan", seats: 5, fuel: "Hybrid", transmission: "Automatic", price_factor: 1.2 },
    Vehicle { name: "Peugeot 3008", category: "SUV", seats: 5, fuel: "Diesel", transmission: "Automatic", price_factor: 1.4 },
    Vehicle { name: "Hyundai Tucson", category: "SUV", seats: 5, fuel: "Petrol", transmission: "Automatic", price_factor: 1.35 },
    Vehicle { name: "Dacia Jogger", category: "Van", seats: 7, fuel: "Petrol", transmission: "Manual", price_factor: 1.3 },
    Vehicle { name: "Volkswagen Transporter", category: "Van", seats: 9, fuel: "Diesel", transmission: "Manual", price_factor: 1.8 },
    Vehicle { name: "Tesla Model 3", category: "Luxury", seats: 5, fuel: "Electric", transmission: "Automatic", price_factor: 2.2 },
];

const LUNCH_SLOTS: &[&str] = &["12:00", "12:30", "13:00", "13:30", "14:00"];
const DINNER_SLOTS: &[&str] = &["19:00", "19:30", "20:00", "20:30", "21:00", "21:30", "22:00", "22:30"];

/// Where generated items are placed.
#[derive(Debug, Clone)]
struct Place {
    city: String,
    country: String,
    center: Coordinates,
    price_index: f64,
}

impl Place {
    fn slug(&self) -> String {
        slugify(&self.city)
    }
}

fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn digest64(parts: &[&str]) -> u64 {
    let digest = Sha256::digest(parts.join("\u{1f}").as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap_or_default())
}

fn round_to(value: f64, step: f64) -> f64 {
    ((value / step).round() * step).max(step)
}

/// Parsed form of a generated item id: `fb-<kind>-<city slug>-<n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackId {
    pub domain: Domain,
    pub city_slug: String,
    pub index: u32,
}

impl FallbackId {
    pub fn parse(id: &str) -> Option<Self> {
        let rest = id.strip_prefix(ID_PREFIX)?.strip_prefix('-')?;
        let (kind, rest) = rest.split_once('-')?;
        let (city_slug, index) = rest.rsplit_once('-')?;
        let domain = Domain::ALL.into_iter().find(|d| d.item_kind() == kind)?;
        let index = index.parse().ok()?;
        (!city_slug.is_empty()).then(|| Self {
            domain,
            city_slug: city_slug.to_string(),
            index,
        })
    }
}

impl std::fmt::Display for FallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{ID_PREFIX}-{}-{}-{}",
            self.domain.item_kind(),
            self.city_slug,
            self.index
        )
    }
}

pub struct FallbackGenerator {
    seed: u64,
    default_city: String,
    default_country: String,
    currency: String,
}

impl FallbackGenerator {
    pub fn new(config: &FallbackConfig) -> Self {
        Self {
            seed: config.seed,
            default_city: config.default_city.clone(),
            default_country: config.default_country.clone(),
            currency: config.currency.clone(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    fn rng(&self, parts: &[&str]) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ digest64(parts))
    }

    fn known_city(name: &str) -> Option<&'static KnownCity> {
        let slug = slugify(name);
        CITIES.iter().find(|c| slugify(c.name) == slug)
    }

    fn nearest_city(coords: Coordinates) -> Option<&'static KnownCity> {
        CITIES.iter().min_by(|a, b| {
            let da = (a.latitude - coords.latitude).powi(2) + (a.longitude - coords.longitude).powi(2);
            let db = (b.latitude - coords.latitude).powi(2) + (b.longitude - coords.longitude).powi(2);
            da.total_cmp(&db)
        })
    }

    fn place_for_city(&self, city: &str, country: Option<&str>, center: Option<Coordinates>) -> Place {
        let known = Self::known_city(city);
        let anchor = known
            .or_else(|| Self::known_city(&self.default_city))
            .unwrap_or(&CITIES[0]);
        Place {
            city: city.to_string(),
            country: country
                .map(String::from)
                .or_else(|| known.map(|k| k.country.to_string()))
                .unwrap_or_else(|| self.default_country.clone()),
            center: center.unwrap_or(Coordinates {
                latitude: anchor.latitude,
                longitude: anchor.longitude,
            }),
            price_index: known.map_or(1.0, |k| k.price_index),
        }
    }

    fn place_for_criteria(&self, criteria: &SearchCriteria) -> Place {
        let location = &criteria.location;
        let country = location
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        match (location.city_name(), location.coordinates) {
            (Some(city), coords) => self.place_for_city(city, country, coords),
            (None, Some(coords)) => {
                let city = Self::nearest_city(coords).map_or(self.default_city.as_str(), |c| c.name);
                self.place_for_city(city, country, Some(coords))
            }
            (None, None) => self.place_for_city(&self.default_city, country, None),
        }
    }

    fn place_for_slug(&self, slug: &str) -> Place {
        match CITIES.iter().find(|c| slugify(c.name) == slug) {
            Some(known) => self.place_for_city(known.name, None, None),
            None => {
                let city = slug
                    .split('-')
                    .filter(|w| !w.is_empty())
                    .map(|w| {
                        let mut chars = w.chars();
                        chars.next().map_or_else(String::new, |first| {
                            first.to_uppercase().chain(chars).collect()
                        })
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let city = if city.is_empty() { self.default_city.clone() } else { city };
                self.place_for_city(&city, None, None)
            }
        }
    }

    fn summary(&self, rng: &mut StdRng, domain: Domain, id: String, name: String, place: &Place, base: f64) -> ItemSummary {
        let kind = domain.item_kind();
        let slug = place.slug();
        let mut amenities = reference::builtin(domain, ReferenceList::Amenities);
        amenities.shuffle(rng);
        amenities.truncate(rng.gen_range(3..=6));

        ItemSummary {
            name,
            address: format!(
                "{} {}, {}",
                rng.gen_range(1..=240),
                STREETS.choose(rng).copied().unwrap_or("Main Street"),
                place.city
            ),
            city: place.city.clone(),
            country: place.country.clone(),
            coordinates: Some(Coordinates {
                latitude: place.center.latitude + rng.gen_range(-0.04..=0.04),
                longitude: place.center.longitude + rng.gen_range(-0.04..=0.04),
            }),
            rating: f64::from(rng.gen_range(32..=49_u8)) / 10.0,
            review_count: rng.gen_range(12..=2400),
            price: Price::new(round_to(base * place.price_index, 5.0), self.currency.clone()),
            images: (1..=3)
                .map(|i| format!("https://static.wc2030.ma/fallback/{kind}/{slug}-{i}.jpg"))
                .collect(),
            amenities,
            source: DataSource::Fallback,
            id,
        }
    }

    /// One item, fully determined by (domain, place, index) or by a foreign id.
    fn item(&self, domain: Domain, place: &Place, index: u32, foreign_id: Option<&str>) -> InventoryItem {
        let id = foreign_id.map_or_else(
            || {
                FallbackId {
                    domain,
                    city_slug: place.slug(),
                    index,
                }
                .to_string()
            },
            String::from,
        );
        let mut rng = self.rng(&[domain.as_str(), &id]);
        let pick = |offset: usize, len: usize| (index as usize + offset) % len;
        let offset = (digest64(&[&place.slug()]) % 97) as usize;

        match domain {
            Domain::Hotels => {
                let name = format!(
                    "{} {}",
                    HOTEL_PREFIXES.choose(&mut rng).copied().unwrap_or("Hotel"),
                    PLACE_WORDS[pick(offset, PLACE_WORDS.len())]
                );
                let base = f64::from(rng.gen_range(60..=240)) * 10.0;
                let summary = self.summary(&mut rng, domain, id, name, place, base);
                let nightly = summary.price.amount;
                let room = |name: &str, factor: f64, capacity: u32| RoomType {
                    name: name.to_string(),
                    price: Price::new(round_to(nightly * factor, 5.0), self.currency.clone()),
                    capacity,
                };
                InventoryItem::Hotel(Hotel {
                    room_types: vec![
                        room("Standard Double", 1.0, 2),
                        room("Deluxe King", 1.35, 2),
                        room("Family Suite", 1.8, 4),
                    ],
                    stars: Some(rng.gen_range(3..=5)),
                    check_in_time: Some("15:00".into()),
                    check_out_time: Some("12:00".into()),
                    summary,
                })
            }
            Domain::Rentals => {
                let vehicle = &VEHICLES[pick(offset, VEHICLES.len())];
                let base = f64::from(rng.gen_range(28..=45)) * 10.0 * vehicle.price_factor;
                let summary = self.summary(&mut rng, domain, id, vehicle.name.to_string(), place, base);
                InventoryItem::Rental(Rental {
                    host: AGENCIES.choose(&mut rng).map(|a| (*a).to_string()),
                    capacity: vehicle.seats,
                    category: Some(vehicle.category.into()),
                    fuel_type: Some(vehicle.fuel.into()),
                    transmission: Some(vehicle.transmission.into()),
                    summary,
                })
            }
            Domain::Restaurants => {
                let name = format!(
                    "{} {}",
                    RESTAURANT_PREFIXES.choose(&mut rng).copied().unwrap_or("Dar"),
                    PLACE_WORDS[pick(offset, PLACE_WORDS.len())]
                );
                let base = f64::from(rng.gen_range(12..=60)) * 10.0;
                let summary = self.summary(&mut rng, domain, id, name, place, base);
                let mut cuisines = reference::builtin(domain, ReferenceList::Cuisines);
                cuisines.shuffle(&mut rng);
                cuisines.truncate(rng.gen_range(1..=2));
                let level = (summary.price.amount / 150.0).ceil().clamp(1.0, 4.0) as u8;
                InventoryItem::Restaurant(Restaurant {
                    cuisines,
                    opening_hours: vec!["Mon-Sun 12:00-15:00".into(), "Mon-Sun 19:00-23:30".into()],
                    price_level: Some(level),
                    summary,
                })
            }
        }
    }

    /// Synthetic search results shaped by the criteria. Never fails; an
    /// unsatisfiable price ceiling yields an empty list.
    pub fn search(&self, domain: Domain, criteria: &SearchCriteria) -> Vec<InventoryItem> {
        // Place keeps the caller's spelling of the city; filters use the normalized form.
        let place = self.place_for_criteria(criteria);
        let criteria = criteria.normalized();
        if criteria.filters.max_price.is_some_and(|max| max <= 0.0) {
            return Vec::new();
        }
        let limit = u32::try_from(criteria.effective_limit()).unwrap_or(1);

        (1..=limit)
            .map(|n| self.fit_to_criteria(self.item(domain, &place, n, None), &criteria))
            .collect()
    }

    /// Adjust a generated item so it satisfies the search filters and party size.
    fn fit_to_criteria(&self, item: InventoryItem, criteria: &SearchCriteria) -> InventoryItem {
        let filters = &criteria.filters;
        let mut item = item;

        {
            let summary = item.summary_mut();
            let mut amount = summary.price.amount;
            if let Some(min) = filters.min_price {
                amount = amount.max(min);
            }
            if let Some(max) = filters.max_price {
                amount = amount.min(max);
            }
            summary.price.amount = amount;

            if let Some(floor) = filters.min_rating {
                // Ratings carry one decimal; round the floor up so it still holds.
                summary.rating = summary.rating.max((floor * 10.0).ceil() / 10.0);
            }

            if !filters.amenities.is_empty() {
                let wanted = filters.amenities.iter().map(|a| title_case(a));
                let merged: Vec<String> = wanted.chain(summary.amenities.drain(..)).collect();
                summary.amenities = clean_amenities(merged);
            }
        }

        let guests = criteria.guests;
        match item {
            InventoryItem::Hotel(ref mut hotel) => {
                if !hotel.room_types.iter().any(|r| r.capacity >= guests) {
                    let price = round_to(hotel.summary.price.amount * (f64::from(guests) / 2.0), 5.0);
                    hotel.room_types.push(RoomType {
                        name: "Group Suite".into(),
                        price: Price::new(price, self.currency.clone()),
                        capacity: guests,
                    });
                }
            }
            InventoryItem::Rental(ref mut rental) => {
                if rental.capacity < guests
                    && let Some(bigger) = VEHICLES.iter().find(|v| v.seats >= guests)
                {
                    rental.summary.name = bigger.name.to_string();
                    rental.capacity = bigger.seats;
                    rental.category = Some(bigger.category.into());
                    rental.fuel_type = Some(bigger.fuel.into());
                    rental.transmission = Some(bigger.transmission.into());
                }
                if let Some(ref kind) = filters.kind {
                    rental.category = Some(title_case(kind));
                }
            }
            InventoryItem::Restaurant(ref mut restaurant) => {
                if let Some(ref kind) = filters.kind {
                    let kind = title_case(kind);
                    restaurant.cuisines.retain(|c| !c.eq_ignore_ascii_case(&kind));
                    restaurant.cuisines.insert(0, kind);
                }
            }
        }

        normalizer::enforce_invariants(item)
    }

    /// Item details for any id. Generated ids rebuild the item they came from;
    /// foreign ids get a stable item of their own in the default city.
    pub fn details(&self, domain: Domain, id: &str) -> InventoryItem {
        let item = match FallbackId::parse(id).filter(|f| f.domain == domain) {
            Some(parsed) => {
                let place = self.place_for_slug(&parsed.city_slug);
                self.item(domain, &place, parsed.index, None)
            }
            None => {
                let place = self.place_for_city(&self.default_city, None, None);
                let index = u32::try_from(digest64(&[id]) % 1000).unwrap_or(0);
                self.item(domain, &place, index, Some(id))
            }
        };
        normalizer::enforce_invariants(item)
    }

    pub fn availability(&self, domain: Domain, id: &str, query: &AvailabilityQuery) -> AvailabilityInfo {
        let item = self.details(domain, id);
        let query_key = serde_json::to_string(query).unwrap_or_default();
        let mut rng = self.rng(&[domain.as_str(), id, &query_key]);
        let unit = item.summary().price.clone();

        match domain {
            Domain::Hotels | Domain::Rentals => {
                let nights = query.dates.map_or(1, |d| d.nights());
                let units_left = if rng.gen_bool(0.85) {
                    rng.gen_range(1..=if domain == Domain::Hotels { 8 } else { 5 })
                } else {
                    0
                };
                AvailabilityInfo {
                    item_id: id.to_string(),
                    domain,
                    available: units_left > 0,
                    dates: query.dates,
                    reservation: None,
                    units_left: Some(units_left),
                    time_slots: Vec::new(),
                    total_price: Some(Price::new(unit.amount * f64::from(nights), unit.currency.clone())),
                    price_per_unit: Some(unit),
                    source: DataSource::Fallback,
                }
            }
            Domain::Restaurants => {
                let time_slots: Vec<String> = LUNCH_SLOTS
                    .iter()
                    .chain(DINNER_SLOTS)
                    .filter(|_| rng.gen_bool(0.7))
                    .map(|s| (*s).to_string())
                    .collect();
                let available = match query.reservation {
                    Some(ref slot) => time_slots.iter().any(|t| t == slot.time.trim()),
                    None => !time_slots.is_empty(),
                };
                AvailabilityInfo {
                    item_id: id.to_string(),
                    domain,
                    available,
                    dates: None,
                    reservation: query.reservation.clone(),
                    units_left: None,
                    time_slots,
                    price_per_unit: Some(unit),
                    total_price: None,
                    source: DataSource::Fallback,
                }
            }
        }
    }
}

fn title_case(value: &str) -> String {
    let value = value.trim();
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
