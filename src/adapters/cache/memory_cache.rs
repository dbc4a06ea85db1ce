use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::ports::cache::{CachedValue, InventoryCache};

struct CacheEntry {
    value: String,
    stale_at: Instant,
    evict_after: Duration,
    last_access: Instant,
}

impl CacheEntry {
    fn is_evicted(&self, now: Instant) -> bool {
        now.duration_since(self.last_access) > self.evict_after
    }
}

const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(100).unwrap();

pub struct MemoryCache {
    inner: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or_else(|| {
            tracing::warn!("Cache max_entries was 0, defaulting to {}", DEFAULT_CAPACITY);
            DEFAULT_CAPACITY
        });
        Self {
            inner: RwLock::new(LruCache::new(cap)),
        }
    }
}

impl InventoryCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CachedValue> {
        let mut cache = self.inner.write().map_or_else(
            |_| {
                tracing::error!("Cache lock poisoned on get('{key}'), returning miss");
                None
            },
            Some,
        )?;
        let now = Instant::now();
        let entry = cache.get_mut(key)?;
        if entry.is_evicted(now) {
            cache.pop(key);
            return None;
        }
        entry.last_access = now;
        Some(CachedValue {
            value: entry.value.clone(),
            fresh: now < entry.stale_at,
        })
    }

    fn set(&self, key: &str, value: &str, stale_after: Duration, evict_after: Duration) {
        if let Ok(mut cache) = self.inner.write() {
            let now = Instant::now();
            cache.put(
                key.to_string(),
                CacheEntry {
                    value: value.to_string(),
                    stale_at: now + stale_after,
                    evict_after: evict_after.max(stale_after),
                    last_access: now,
                },
            );
        } else {
            tracing::error!("Cache lock poisoned on set('{key}'), skipping write");
        }
    }

    fn invalidate_prefix(&self, prefix: &str) -> usize {
        // One write guard for the whole sweep: readers see all or none of it.
        let Ok(mut cache) = self.inner.write() else {
            tracing::error!("Cache lock poisoned on invalidate('{prefix}'), skipping");
            return 0;
        };
        let doomed: Vec<String> = cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            cache.pop(key);
        }
        doomed.len()
    }

    fn len(&self) -> usize {
        self.inner.read().map_or(0, |cache| cache.len())
    }
}
