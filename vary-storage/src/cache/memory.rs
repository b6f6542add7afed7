//! In-memory TTL cache with a known-keys index.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use vary_core::{CacheError, VaryError, VaryResult};

use super::pattern::KeyPattern;
use super::traits::{Cache, CacheStats};

/// Default expiration window when a caller does not supply one.
const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Entry>,
    /// Every key currently present in `entries`. Kept in lockstep so pattern
    /// invalidation can enumerate candidates without touching values.
    keys: HashSet<String>,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn remove_key(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.keys.remove(key);
        removed
    }
}

/// Process-local expiring key-value cache.
///
/// Values are stored as JSON so that a `set`/`get` pair behaves identically
/// to a network round trip through an external cache. Expired entries are
/// pruned lazily on the read that observes them, which keeps the key index
/// from accumulating dead keys without a background sweeper.
#[derive(Debug)]
pub struct InMemoryCache {
    inner: Mutex<CacheInner>,
    default_ttl: Duration,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    /// Create a cache with the default 30-minute TTL.
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom default TTL.
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            default_ttl,
        }
    }

    fn lock(&self) -> VaryResult<std::sync::MutexGuard<'_, CacheInner>> {
        self.inner
            .lock()
            .map_err(|_| VaryError::Cache(CacheError::LockPoisoned))
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get<T: DeserializeOwned + Send + 'static>(
        &self,
        key: &str,
    ) -> VaryResult<Option<T>> {
        let mut inner = self.lock()?;
        let value = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => entry.value.clone(),
            Some(_) => {
                // Expired: prune entry and index together, count as a miss.
                inner.remove_key(key);
                inner.misses += 1;
                return Ok(None);
            }
            None => {
                inner.misses += 1;
                return Ok(None);
            }
        };
        inner.hits += 1;
        drop(inner);

        let decoded = serde_json::from_value(value).map_err(|e| {
            VaryError::Cache(CacheError::Serialization {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(Some(decoded))
    }

    async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> VaryResult<()> {
        let value = serde_json::to_value(value).map_err(|e| {
            VaryError::Cache(CacheError::Serialization {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })?;
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);

        let mut inner = self.lock()?;
        inner.entries.insert(
            key.to_string(),
            Entry { value, expires_at },
        );
        inner.keys.insert(key.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> VaryResult<()> {
        let mut inner = self.lock()?;
        inner.remove_key(key);
        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> VaryResult<u64> {
        let matcher = KeyPattern::compile(pattern)?;

        let mut inner = self.lock()?;
        let matching: Vec<String> = inner
            .keys
            .iter()
            .filter(|key| matcher.matches(key))
            .cloned()
            .collect();
        let mut removed = 0u64;
        for key in &matching {
            if inner.remove_key(key) {
                removed += 1;
            }
        }
        tracing::info!(pattern, removed, "cache keys invalidated by pattern");
        Ok(removed)
    }

    async fn clear(&self) -> VaryResult<u64> {
        let mut inner = self.lock()?;
        let removed = inner.keys.len() as u64;
        inner.entries.clear();
        inner.keys.clear();
        tracing::debug!(removed, "cache cleared");
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> VaryResult<bool> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now()))
    }

    async fn stats(&self) -> VaryResult<CacheStats> {
        let inner = self.lock()?;
        Ok(CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entry_count: inner.entries.len() as u64,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
