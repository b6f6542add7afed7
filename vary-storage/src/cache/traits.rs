//! Cache trait and usage statistics.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use vary_core::VaryResult;

/// Expiring key-value cache with pattern-based bulk invalidation.
///
/// Values are serialized by the implementation and returned exactly as
/// stored; the cache itself attaches no meaning to keys beyond the glob
/// matching used for invalidation.
///
/// Implementations must be thread-safe and keep their key index consistent
/// with the value store under concurrent use.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value. Absent on a true miss and on an expired entry.
    async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str)
        -> VaryResult<Option<T>>;

    /// Store a value, overwriting any previous entry and restarting its
    /// expiration window. `None` uses the implementation's default TTL.
    async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> VaryResult<()>;

    /// Explicitly evict a key. Idempotent.
    async fn remove(&self, key: &str) -> VaryResult<()>;

    /// Remove every key matching a glob pattern (`*` is a multi-character
    /// wildcard, anchored to the full key). Returns the number of keys
    /// removed. Keys are removed individually; partial completion leaves the
    /// cache valid since removal is idempotent.
    async fn remove_by_pattern(&self, pattern: &str) -> VaryResult<u64>;

    /// Remove every currently-known key. Returns the number removed.
    async fn clear(&self) -> VaryResult<u64>;

    /// Whether a live (unexpired) entry exists for the key.
    async fn exists(&self, key: &str) -> VaryResult<bool>;

    /// Get cache statistics.
    async fn stats(&self) -> VaryResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of live entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
