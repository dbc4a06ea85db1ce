use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::types::{CacheConfig, Operation};
use crate::domain::inventory::Domain;
use crate::error::Result;
use crate::ports::cache::InventoryCache;

/// How a cached read was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOrigin {
    /// Inside the staleness window, no upstream call.
    Hit,
    /// Fetched from upstream and stored.
    Fetched,
    /// Refresh of a stale entry failed; the stale value was served.
    Stale { reason: String },
}

#[derive(Debug)]
pub struct Cached<T> {
    pub value: T,
    pub origin: CacheOrigin,
}

/// Keys, per-operation windows and invalidation over the shared store.
pub struct CacheOrchestrator {
    store: Arc<dyn InventoryCache>,
    config: CacheConfig,
    /// Invalidation count per domain. A fetch that started under an older
    /// generation must not write its result back.
    generations: Mutex<[u64; 3]>,
}

fn slot(domain: Domain) -> usize {
    match domain {
        Domain::Hotels => 0,
        Domain::Rentals => 1,
        Domain::Restaurants => 2,
    }
}

impl CacheOrchestrator {
    pub fn new(store: Arc<dyn InventoryCache>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            generations: Mutex::new([0; 3]),
        }
    }

    fn generation(&self, domain: Domain) -> u64 {
        self.generations.lock().unwrap_or_else(PoisonError::into_inner)[slot(domain)]
    }

    /// Store `json` unless the domain was invalidated after `generation` was read.
    /// The check and the write happen under the generation lock.
    fn store_if_current(
        &self,
        domain: Domain,
        operation: Operation,
        generation: u64,
        key: &str,
        json: &str,
    ) {
        let generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        if generations[slot(domain)] != generation {
            debug!(%key, "Domain invalidated during fetch, result not cached");
            return;
        }
        let policy = self.config.policy(domain, operation);
        self.store.set(key, json, policy.stale_after(), policy.evict_after());
    }

    /// `<domain root>:<operation>:<16 hex digits of SHA-256 over the params JSON>`.
    ///
    /// Callers pass normalized parameters so equivalent requests share a key.
    pub fn key<P: Serialize + ?Sized>(domain: Domain, operation: Operation, params: &P) -> String {
        let json = serde_json::to_string(params).unwrap_or_default();
        let digest = Sha256::digest(json.as_bytes());
        let hex: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
        format!("{}:{}:{hex}", domain.as_str(), operation.as_str())
    }

    /// Serve a fresh entry, otherwise call `fetch` and store its result. When a
    /// stale entry exists and the refresh fails with a recoverable error, the
    /// stale value is served instead of the error.
    pub async fn get_or_fetch<T, P, F, Fut>(
        &self,
        domain: Domain,
        operation: Operation,
        params: &P,
        fetch: F,
    ) -> Result<Cached<T>>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = Self::key(domain, operation, params);

        let mut stale = None;
        if let Some(hit) = self.store.get(&key) {
            match serde_json::from_str::<T>(&hit.value) {
                Ok(value) if hit.fresh => {
                    debug!(%key, "Cache hit");
                    return Ok(Cached {
                        value,
                        origin: CacheOrigin::Hit,
                    });
                }
                Ok(value) => {
                    debug!(%key, "Cache entry stale, refreshing");
                    stale = Some(value);
                }
                Err(e) => warn!(%key, error = %e, "Cached value does not decode, refetching"),
            }
        }

        let generation = self.generation(domain);
        match fetch().await {
            Ok(value) => {
                match serde_json::to_string(&value) {
                    Ok(json) => {
                        self.store_if_current(domain, operation, generation, &key, &json);
                    }
                    Err(e) => warn!(%key, error = %e, "Value not cacheable"),
                }
                Ok(Cached {
                    value,
                    origin: CacheOrigin::Fetched,
                })
            }
            Err(e) if e.is_recoverable() && stale.is_some() => {
                warn!(%key, error = %e, "Refresh failed, serving stale entry");
                let reason = e.to_string();
                stale.map_or(Err(e), |value| {
                    Ok(Cached {
                        value,
                        origin: CacheOrigin::Stale { reason },
                    })
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Drop every entry under the domain's root. Fetches already in flight for
    /// the domain will not repopulate it.
    pub fn invalidate_domain(&self, domain: Domain) -> usize {
        let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        generations[slot(domain)] += 1;
        let removed = self.store.invalidate_prefix(&format!("{}:", domain.as_str()));
        drop(generations);
        info!(%domain, removed, "Invalidated domain cache");
        removed
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::adapters::cache::memory_cache::MemoryCache;
    use crate::config::types::{CachePolicy, CachePolicyOverride};
    use crate::domain::criteria::SearchCriteria;
    use crate::error::GatewayError;

    fn orchestrator(config: CacheConfig) -> CacheOrchestrator {
        CacheOrchestrator::new(Arc::new(MemoryCache::new(100)), config)
    }

    fn network_down() -> GatewayError {
        GatewayError::Network {
            service: "hotels-provider".into(),
            reason: "connection refused".into(),
            timed_out: false,
        }
    }

    #[test]
    fn key_shape_and_stability() {
        let a = SearchCriteria::for_city("Casablanca").normalized();
        let b = SearchCriteria::for_city("  casablanca ").normalized();
        let key = CacheOrchestrator::key(Domain::Hotels, Operation::Search, &a);
        assert_eq!(key, CacheOrchestrator::key(Domain::Hotels, Operation::Search, &b));
        assert!(key.starts_with("hotels:search:"));
        assert_eq!(key.rsplit(':').next().unwrap().len(), 16);

        let other = SearchCriteria::for_city("Rabat").normalized();
        assert_ne!(key, CacheOrchestrator::key(Domain::Hotels, Operation::Search, &other));
        assert_ne!(key, CacheOrchestrator::key(Domain::Rentals, Operation::Search, &a));
    }

    #[tokio::test]
    async fn fresh_entry_skips_fetch() {
        let cache = orchestrator(CacheConfig::default());
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let got = cache
                .get_or_fetch(Domain::Hotels, Operation::Details, "h-1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(got.value, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = orchestrator(CacheConfig::default());
        let result: Result<Cached<u32>> = cache
            .get_or_fetch(Domain::Rentals, Operation::Search, "x", || async {
                Err(network_down())
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    fn zero_stale_config() -> CacheConfig {
        let mut config = CacheConfig::default();
        config.overrides.push(CachePolicyOverride {
            domain: Domain::Hotels,
            operation: Operation::Details,
            stale_secs: 0,
            evict_secs: 600,
        });
        config
    }

    #[tokio::test]
    async fn stale_entry_is_refetched() {
        let cache = orchestrator(zero_stale_config());
        let calls = AtomicUsize::new(0);
        for expected in 1..=2_usize {
            let got = cache
                .get_or_fetch(Domain::Hotels, Operation::Details, "h-1", || async {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
                })
                .await
                .unwrap();
            assert_eq!(got.value, expected);
            assert_eq!(got.origin, CacheOrigin::Fetched);
        }
    }

    #[tokio::test]
    async fn stale_entry_served_when_refresh_fails() {
        let cache = orchestrator(zero_stale_config());
        cache
            .get_or_fetch(Domain::Hotels, Operation::Details, "h-1", || async { Ok(7_u32) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let got = cache
            .get_or_fetch(Domain::Hotels, Operation::Details, "h-1", || async {
                Err::<u32, _>(network_down())
            })
            .await
            .unwrap();
        assert_eq!(got.value, 7);
        assert!(matches!(got.origin, CacheOrigin::Stale { ref reason } if reason.contains("refused")));
    }

    #[tokio::test]
    async fn invalidation_is_scoped_to_domain() {
        let cache = orchestrator(CacheConfig::default());
        for domain in Domain::ALL {
            cache
                .get_or_fetch(domain, Operation::Search, "q", || async { Ok(1_u8) })
                .await
                .unwrap();
        }
        assert_eq!(cache.invalidate_domain(Domain::Rentals), 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn fetch_overtaken_by_invalidation_is_not_stored() {
        let cache = orchestrator(CacheConfig::default());
        let release = tokio::sync::Notify::new();

        let search = cache.get_or_fetch(Domain::Hotels, Operation::Search, "q", || async {
            release.notified().await;
            Ok(1_u8)
        });
        let invalidate = async {
            cache.invalidate_domain(Domain::Hotels);
            release.notify_one();
        };
        let (got, ()) = tokio::join!(search, invalidate);

        assert_eq!(got.unwrap().value, 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn other_domains_still_cache_after_invalidation() {
        let cache = orchestrator(CacheConfig::default());
        cache.invalidate_domain(Domain::Hotels);
        cache
            .get_or_fetch(Domain::Hotels, Operation::Search, "q", || async { Ok(1_u8) })
            .await
            .unwrap();
        cache
            .get_or_fetch(Domain::Rentals, Operation::Search, "q", || async { Ok(1_u8) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn default_policies_keep_stale_before_evict() {
        let config = CacheConfig::default();
        for domain in Domain::ALL {
            for op in [
                Operation::Search,
                Operation::Details,
                Operation::Availability,
                Operation::Reference,
            ] {
                let policy: CachePolicy = config.policy(domain, op);
                assert!(policy.stale_after() <= policy.evict_after());
            }
        }
    }
}
