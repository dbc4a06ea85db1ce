use std::time::Duration;

/// A cache hit, flagged as fresh or stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedValue {
    pub value: String,
    pub fresh: bool,
}

/// Shared store behind the cache orchestrator.
///
/// Each entry carries two clocks: it turns stale `stale_after` its write and
/// is dropped once it has gone unread for `evict_after`.
pub trait InventoryCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedValue>;
    fn set(&self, key: &str, value: &str, stale_after: Duration, evict_after: Duration);
    /// Remove every key starting with `prefix`, returning how many were dropped.
    fn invalidate_prefix(&self, prefix: &str) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
