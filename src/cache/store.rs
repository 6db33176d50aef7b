//! Cache storage backends.
//!
//! The collection cache talks to a [`CacheBackend`]; production wiring may put
//! a networked cache behind it, tests and single-process deployments use
//! [`MemoryCacheBackend`].

use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use crate::util::lock::{rw_read, rw_write};

use super::config::CacheConfig;

const SOURCE: &str = "cache::store";
const METRIC_CACHE_EVICT_TOTAL: &str = "feedline_cache_evict_total";

/// Key-value capability required by the collection cache.
///
/// Every operation is idempotent and accepts absent keys. Failures inside a
/// backend are its own concern: the cache is best-effort, so a backend that
/// cannot answer reports a miss and a lost write only costs a recompute.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// Store `value` under `key` with no expiry.
    async fn set(&self, key: &str, value: Bytes);

    async fn delete_many(&self, keys: &[String]);
}

/// In-process backend with LRU eviction.
pub struct MemoryCacheBackend {
    entries: RwLock<LruCache<String, Bytes>>,
}

impl MemoryCacheBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    /// Get the number of cached collections.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    /// Check if the backend is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        rw_read(&self.entries, SOURCE, "contains").contains(key)
    }

    /// Drop every cached collection.
    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Option<Bytes> {
        rw_write(&self.entries, SOURCE, "get").get(key).cloned()
    }

    async fn set(&self, key: &str, value: Bytes) {
        let evicted = rw_write(&self.entries, SOURCE, "set").push(key.to_string(), value);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!(METRIC_CACHE_EVICT_TOTAL).increment(1);
            tracing::debug!(key = %evicted_key, "Cache entry evicted for capacity");
        }
    }

    async fn delete_many(&self, keys: &[String]) {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_many");
        for key in keys {
            entries.pop(key.as_str());
        }
    }
}
