//! The travel-inventory gateway: one [`DomainAdapter`] per domain over a
//! shared cache, fallback generator and booking pipeline.

pub mod adapter;
pub mod booking;
pub mod cache;

use std::sync::Arc;

use futures::future::join_all;
use tracing::info;

use crate::adapters::cache::memory_cache::MemoryCache;
use crate::adapters::fallback::FallbackGenerator;
use crate::adapters::providers::resolve_strategy;
use crate::config::types::Config;
use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::criteria::SearchCriteria;
use crate::domain::envelope::Envelope;
use crate::domain::inventory::{Domain, InventoryItem};
use crate::ports::cache::InventoryCache;
use crate::ports::provider::ProviderStrategy;

use self::adapter::DomainAdapter;
use self::booking::BookingPipeline;
use self::cache::CacheOrchestrator;

pub struct Gateway {
    hotels: DomainAdapter,
    rentals: DomainAdapter,
    restaurants: DomainAdapter,
    cache: Arc<CacheOrchestrator>,
}

impl Gateway {
    /// Resolve each domain's strategy from configuration over an in-memory LRU store.
    pub fn from_config(config: &Config) -> Self {
        let generator = Arc::new(FallbackGenerator::new(&config.fallback));
        let store: Arc<dyn InventoryCache> = Arc::new(MemoryCache::new(config.cache.max_entries));
        Self::with_strategies(config, store, generator.clone(), |domain| {
            resolve_strategy(domain, config, generator.clone())
        })
    }

    /// Build with caller-chosen strategies and store.
    pub fn with_strategies(
        config: &Config,
        store: Arc<dyn InventoryCache>,
        generator: Arc<FallbackGenerator>,
        strategy_for: impl Fn(Domain) -> Arc<dyn ProviderStrategy>,
    ) -> Self {
        let cache = Arc::new(CacheOrchestrator::new(store, config.cache.clone()));
        let bookings = Arc::new(BookingPipeline::new(config.booking.confirmation_prefix.clone()));
        let build = |domain| {
            let adapter = DomainAdapter::new(
                strategy_for(domain),
                generator.clone(),
                cache.clone(),
                bookings.clone(),
            );
            info!(%domain, service = adapter.service(), source = ?adapter.source(), "Domain adapter ready");
            adapter
        };

        Self {
            hotels: build(Domain::Hotels),
            rentals: build(Domain::Rentals),
            restaurants: build(Domain::Restaurants),
            cache,
        }
    }

    pub fn hotels(&self) -> &DomainAdapter {
        &self.hotels
    }

    pub fn rentals(&self) -> &DomainAdapter {
        &self.rentals
    }

    pub fn restaurants(&self) -> &DomainAdapter {
        &self.restaurants
    }

    pub fn adapter(&self, domain: Domain) -> &DomainAdapter {
        match domain {
            Domain::Hotels => &self.hotels,
            Domain::Rentals => &self.rentals,
            Domain::Restaurants => &self.restaurants,
        }
    }

    pub async fn book(
        &self,
        domain: Domain,
        request: &BookingRequest,
    ) -> Envelope<BookingConfirmation> {
        self.adapter(domain).create_booking(request).await
    }

    /// Search several domains concurrently. Results come back in the order
    /// the domains were given; duplicates are searched once.
    pub async fn search_many(
        &self,
        domains: &[Domain],
        criteria: &SearchCriteria,
    ) -> Vec<(Domain, Envelope<Vec<InventoryItem>>)> {
        let mut unique: Vec<Domain> = Vec::with_capacity(domains.len());
        for domain in domains {
            if !unique.contains(domain) {
                unique.push(*domain);
            }
        }

        let searches = unique.iter().map(|&domain| async move {
            (domain, self.adapter(domain).search(criteria).await)
        });
        join_all(searches).await
    }

    /// Entries currently held by the shared cache.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
