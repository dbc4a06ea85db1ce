use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::booking::{BookingConfirmation, BookingRequest, BookingStatus, PriceBreakdown};
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::inventory::{
    AvailabilityInfo, DataSource, Domain, Hotel, InventoryItem, ItemSummary, Price, Rental,
    Restaurant,
};
use crate::error::{GatewayError, Result};
use crate::ports::provider::ProviderStrategy;

type SearchFn = Box<dyn Fn(&SearchCriteria) -> Result<Vec<InventoryItem>> + Send + Sync>;
type DetailsFn = Box<dyn Fn(&str) -> Result<InventoryItem> + Send + Sync>;
type AvailabilityFn = Box<dyn Fn(&str, &AvailabilityQuery) -> Result<AvailabilityInfo> + Send + Sync>;
type BookFn = Box<dyn Fn(&BookingRequest) -> Result<BookingConfirmation> + Send + Sync>;

#[derive(Default)]
struct Calls {
    search: AtomicUsize,
    details: AtomicUsize,
    availability: AtomicUsize,
    book: AtomicUsize,
}

/// Closure-driven strategy that counts every call it receives.
pub struct MockProvider {
    domain: Domain,
    source: DataSource,
    service: String,
    search_fn: Mutex<SearchFn>,
    details_fn: Mutex<DetailsFn>,
    availability_fn: Mutex<AvailabilityFn>,
    book_fn: Mutex<BookFn>,
    calls: Calls,
}

impl MockProvider {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            source: DataSource::Provider,
            service: format!("{domain}-mock"),
            search_fn: Mutex::new(Box::new(move |criteria| {
                let city = criteria.location.city_name().unwrap_or("Casablanca").to_string();
                Ok((1..=3)
                    .map(|n| make_item(domain, &format!("m-{n}"), &city))
                    .collect())
            })),
            details_fn: Mutex::new(Box::new(move |id| Ok(make_item(domain, id, "Casablanca")))),
            availability_fn: Mutex::new(Box::new(move |id, query| {
                Ok(make_availability(domain, id, query))
            })),
            book_fn: Mutex::new(Box::new(move |request| Ok(make_confirmation(domain, request)))),
            calls: Calls::default(),
        }
    }

    /// Every operation fails as if the upstream were unreachable.
    pub fn unreachable(domain: Domain) -> Self {
        let down = move || GatewayError::Network {
            service: format!("{domain}-mock"),
            reason: "connection refused".into(),
            timed_out: false,
        };
        Self::new(domain)
            .with_search(move |_| Err(down()))
            .with_details(move |_| Err(down()))
            .with_availability(move |_, _| Err(down()))
            .with_book(move |_| Err(down()))
    }

    #[must_use]
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_search(
        self,
        f: impl Fn(&SearchCriteria) -> Result<Vec<InventoryItem>> + Send + Sync + 'static,
    ) -> Self {
        *self.search_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_details(
        self,
        f: impl Fn(&str) -> Result<InventoryItem> + Send + Sync + 'static,
    ) -> Self {
        *self.details_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_availability(
        self,
        f: impl Fn(&str, &AvailabilityQuery) -> Result<AvailabilityInfo> + Send + Sync + 'static,
    ) -> Self {
        *self.availability_fn.lock().unwrap() = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_book(
        self,
        f: impl Fn(&BookingRequest) -> Result<BookingConfirmation> + Send + Sync + 'static,
    ) -> Self {
        *self.book_fn.lock().unwrap() = Box::new(f);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.calls.search.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.calls.details.load(Ordering::SeqCst)
    }

    pub fn availability_calls(&self) -> usize {
        self.calls.availability.load(Ordering::SeqCst)
    }

    pub fn book_calls(&self) -> usize {
        self.calls.book.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderStrategy for MockProvider {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn source(&self) -> DataSource {
        self.source
    }

    fn service(&self) -> &str {
        &self.service
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<InventoryItem>> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        let f = self.search_fn.lock().unwrap();
        f(criteria)
    }

    async fn details(&self, id: &str) -> Result<InventoryItem> {
        self.calls.details.fetch_add(1, Ordering::SeqCst);
        let f = self.details_fn.lock().unwrap();
        f(id)
    }

    async fn availability(&self, id: &str, query: &AvailabilityQuery) -> Result<AvailabilityInfo> {
        self.calls.availability.fetch_add(1, Ordering::SeqCst);
        let f = self.availability_fn.lock().unwrap();
        f(id, query)
    }

    async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        self.calls.book.fetch_add(1, Ordering::SeqCst);
        let f = self.book_fn.lock().unwrap();
        f(request)
    }
}

pub fn make_summary(id: &str, city: &str) -> ItemSummary {
    ItemSummary {
        id: id.into(),
        name: format!("Test {id}"),
        address: "1 Avenue Hassan II".into(),
        city: city.into(),
        country: "Morocco".into(),
        coordinates: None,
        rating: 4.2,
        review_count: 10,
        price: Price::new(500.0, "MAD"),
        images: vec![format!("https://img.test/{id}.jpg")],
        amenities: vec!["Free WiFi".into()],
        source: DataSource::Provider,
    }
}

pub fn make_item(domain: Domain, id: &str, city: &str) -> InventoryItem {
    let summary = make_summary(id, city);
    match domain {
        Domain::Hotels => InventoryItem::Hotel(Hotel {
            summary,
            room_types: vec![],
            stars: Some(4),
            check_in_time: None,
            check_out_time: None,
        }),
        Domain::Rentals => InventoryItem::Rental(Rental {
            summary,
            host: Some("Test Agency".into()),
            capacity: 5,
            category: Some("Compact".into()),
            fuel_type: None,
            transmission: None,
        }),
        Domain::Restaurants => InventoryItem::Restaurant(Restaurant {
            summary,
            cuisines: vec!["Moroccan".into()],
            opening_hours: vec![],
            price_level: Some(2),
        }),
    }
}

pub fn make_availability(domain: Domain, id: &str, query: &AvailabilityQuery) -> AvailabilityInfo {
    AvailabilityInfo {
        item_id: id.into(),
        domain,
        available: true,
        dates: query.dates,
        reservation: query.reservation.clone(),
        units_left: Some(3),
        time_slots: vec![],
        price_per_unit: Some(Price::new(500.0, "MAD")),
        total_price: None,
        source: DataSource::Provider,
    }
}

pub fn make_confirmation(domain: Domain, request: &BookingRequest) -> BookingConfirmation {
    BookingConfirmation {
        booking_id: format!("bk-{}", request.item_id),
        confirmation_number: String::new(),
        status: BookingStatus::Confirmed,
        domain,
        item_id: request.item_id.clone(),
        price: PriceBreakdown::from_base(1000.0, 0.1, 0.0, "MAD"),
        contact: request.contact.clone(),
        guests: request.guests.clone(),
        dates: request.dates,
        reservation: request.reservation.clone(),
        special_requests: request.special_requests.clone(),
        created_at: chrono::Utc::now(),
        source: DataSource::Provider,
    }
}
