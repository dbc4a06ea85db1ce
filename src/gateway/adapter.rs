use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::adapters::fallback::FallbackGenerator;
use crate::config::types::Operation;
use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::envelope::{ApiError, Envelope};
use crate::domain::inventory::{AvailabilityInfo, DataSource, Domain, InventoryItem};
use crate::domain::reference::{self, ReferenceList};
use crate::error::Result;
use crate::gateway::booking::BookingPipeline;
use crate::gateway::cache::{CacheOrchestrator, CacheOrigin};
use crate::ports::provider::ProviderStrategy;

const NO_BACKEND: &str = "no provider or proxy configured";

/// One domain's entry point. Reads never surface upstream failures: they are
/// answered from cache, the resolved strategy, or the fallback generator.
pub struct DomainAdapter {
    domain: Domain,
    strategy: Arc<dyn ProviderStrategy>,
    fallback: Arc<FallbackGenerator>,
    cache: Arc<CacheOrchestrator>,
    bookings: Arc<BookingPipeline>,
}

impl DomainAdapter {
    pub fn new(
        strategy: Arc<dyn ProviderStrategy>,
        fallback: Arc<FallbackGenerator>,
        cache: Arc<CacheOrchestrator>,
        bookings: Arc<BookingPipeline>,
    ) -> Self {
        Self {
            domain: strategy.domain(),
            strategy,
            fallback,
            cache,
            bookings,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Which path the resolved strategy reads from.
    pub fn source(&self) -> DataSource {
        self.strategy.source()
    }

    pub fn service(&self) -> &str {
        self.strategy.service()
    }

    async fn read<T, P, F, Fut>(
        &self,
        operation: Operation,
        params: &P,
        fetch: F,
        fallback: impl FnOnce() -> T,
    ) -> Envelope<T>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let domain = self.domain;
        let outcome = if self.strategy.source() == DataSource::Fallback {
            fetch().await.map(|value| (value, Some(format!("served fallback data: {NO_BACKEND}"))))
        } else {
            self.cache
                .get_or_fetch(domain, operation, params, fetch)
                .await
                .map(|cached| match cached.origin {
                    CacheOrigin::Stale { reason } => (
                        cached.value,
                        Some(format!("served stale cache entry: {reason}")),
                    ),
                    CacheOrigin::Hit | CacheOrigin::Fetched => (cached.value, None),
                })
        };

        match outcome {
            Ok((value, None)) => Envelope::ok(value),
            Ok((value, Some(note))) => Envelope::ok(value).with_message(note),
            Err(e) if e.is_recoverable() => {
                warn!(
                    %domain,
                    operation = operation.as_str(),
                    service = self.strategy.service(),
                    error = %e,
                    "Read failed, serving fallback data"
                );
                Envelope::ok(fallback()).with_message(format!("served fallback data: {e}"))
            }
            Err(e) => Envelope::err(e.to_api_error(self.strategy.service())),
        }
    }

    pub async fn search(&self, criteria: &SearchCriteria) -> Envelope<Vec<InventoryItem>> {
        let params = criteria.normalized();
        debug!(domain = %self.domain, ?params, "Search");
        self.read(
            Operation::Search,
            &params,
            || self.strategy.search(criteria),
            || self.fallback.search(self.domain, criteria),
        )
        .await
    }

    pub async fn details(&self, id: &str) -> Envelope<InventoryItem> {
        let id = id.trim();
        self.read(
            Operation::Details,
            id,
            || self.strategy.details(id),
            || self.fallback.details(self.domain, id),
        )
        .await
    }

    pub async fn check_availability(
        &self,
        id: &str,
        query: &AvailabilityQuery,
    ) -> Envelope<AvailabilityInfo> {
        let id = id.trim();
        self.read(
            Operation::Availability,
            &(id, query),
            || self.strategy.availability(id, query),
            || self.fallback.availability(self.domain, id, query),
        )
        .await
    }

    /// Runs the full booking pipeline against this domain's strategy.
    pub async fn create_booking(&self, request: &BookingRequest) -> Envelope<BookingConfirmation> {
        self.bookings
            .run(self.strategy.as_ref(), &self.cache, request)
            .await
    }

    pub async fn reference_list(&self, list: ReferenceList) -> Envelope<Vec<String>> {
        if !list.supported_by(self.domain) {
            return Envelope::err(ApiError::new(
                self.domain.as_str(),
                format!("{} has no '{}' list", self.domain, list.as_str()),
                400,
            ));
        }
        self.read(
            Operation::Reference,
            list.as_str(),
            || self.strategy.reference_list(list),
            || reference::builtin(self.domain, list),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::memory_cache::MemoryCache;
    use crate::config::types::{CacheConfig, FallbackConfig};
    use crate::domain::criteria::DateRange;
    use crate::error::GatewayError;
    use crate::test_helpers::{MockProvider, make_item};

    fn adapter(provider: MockProvider) -> (DomainAdapter, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let adapter = DomainAdapter::new(
            provider.clone(),
            Arc::new(FallbackGenerator::new(&FallbackConfig::default())),
            Arc::new(CacheOrchestrator::new(
                Arc::new(MemoryCache::new(100)),
                CacheConfig::default(),
            )),
            Arc::new(BookingPipeline::new("WC2030")),
        );
        (adapter, provider)
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back() {
        let (adapter, _) = adapter(MockProvider::unreachable(Domain::Hotels));
        let env = adapter.search(&SearchCriteria::for_city("Casablanca")).await;
        assert!(env.success);
        assert_eq!(env.status, 200);
        let items = env.data.unwrap();
        assert!(!items.is_empty());
        assert!(items.iter().all(|i| i.summary().source == DataSource::Fallback));
        assert!(env.message.unwrap().starts_with("served fallback data:"));
    }

    #[tokio::test]
    async fn fallback_data_is_not_cached() {
        let (adapter, provider) = adapter(MockProvider::unreachable(Domain::Rentals));
        let criteria = SearchCriteria::for_city("Tangier");
        adapter.search(&criteria).await;
        adapter.search(&criteria).await;
        assert_eq!(provider.search_calls(), 2);
    }

    #[tokio::test]
    async fn repeated_search_hits_cache() {
        let (adapter, provider) = adapter(MockProvider::new(Domain::Hotels));
        let criteria = SearchCriteria::for_city("Casablanca");
        let first = adapter.search(&criteria).await;
        let second = adapter.search(&SearchCriteria::for_city(" casablanca")).await;
        assert_eq!(provider.search_calls(), 1);
        assert_eq!(first.data, second.data);
        assert!(second.message.is_none());
    }

    #[tokio::test]
    async fn malformed_details_fall_back_to_stable_item() {
        let (adapter, _) = adapter(
            MockProvider::new(Domain::Restaurants)
                .with_details(|_| Err(GatewayError::malformed("restaurants-mock", "no business"))),
        );
        let a = adapter.details("rick-s-cafe").await.data.unwrap();
        let b = adapter.details("rick-s-cafe").await.data.unwrap();
        assert_eq!(a.id(), "rick-s-cafe");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn availability_cached_per_query() {
        let (adapter, provider) = adapter(MockProvider::new(Domain::Hotels));
        let june = AvailabilityQuery::for_dates(DateRange::parse("2030-06-10", "2030-06-12").unwrap());
        let july = AvailabilityQuery::for_dates(DateRange::parse("2030-07-10", "2030-07-12").unwrap());
        adapter.check_availability("h-1", &june).await;
        adapter.check_availability("h-1", &june).await;
        adapter.check_availability("h-1", &july).await;
        assert_eq!(provider.availability_calls(), 2);
    }

    #[tokio::test]
    async fn sandbox_strategy_reads_are_flagged() {
        let (adapter, _) = adapter(MockProvider::new(Domain::Hotels).with_source(DataSource::Fallback));
        let env = adapter.details("x").await;
        assert!(env.success);
        assert_eq!(
            env.message.as_deref(),
            Some("served fallback data: no provider or proxy configured")
        );
    }

    #[tokio::test]
    async fn booking_invalidates_domain_cache() {
        let (adapter, provider) = adapter(
            MockProvider::new(Domain::Hotels)
                .with_details(|id| Ok(make_item(Domain::Hotels, id, "Rabat"))),
        );
        adapter.details("h-9").await;
        adapter.details("h-9").await;
        assert_eq!(provider.details_calls(), 1);

        let request = BookingRequest {
            item_id: "h-9".into(),
            dates: Some(DateRange::parse("2030-06-10", "2030-06-12").unwrap()),
            reservation: None,
            guests: crate::domain::booking::GuestComposition::default(),
            contact: crate::domain::booking::ContactInfo {
                first_name: "Karim".into(),
                last_name: "Fassi".into(),
                email: "karim@example.ma".into(),
                phone: None,
            },
            special_requests: None,
            units: None,
        };
        assert_eq!(adapter.create_booking(&request).await.status, 201);

        adapter.details("h-9").await;
        assert_eq!(provider.details_calls(), 2);
    }

    #[tokio::test]
    async fn unsupported_reference_list_is_rejected() {
        let (adapter, _) = adapter(MockProvider::new(Domain::Hotels));
        let env = adapter.reference_list(ReferenceList::FuelTypes).await;
        assert!(!env.success);
        assert_eq!(env.status, 400);

        let env = adapter.reference_list(ReferenceList::Amenities).await;
        assert!(env.success);
        assert!(!env.data.unwrap().is_empty());
    }
}
