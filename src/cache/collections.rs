//! Read-through cache for derived collections.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use metrics::{counter, histogram};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use super::events::InvalidationEvent;
use super::planner::BustPlan;
use super::store::CacheBackend;

const METRIC_CACHE_HIT_TOTAL: &str = "feedline_cache_hit_total";
const METRIC_CACHE_MISS_TOTAL: &str = "feedline_cache_miss_total";
const METRIC_CACHE_STORE_TOTAL: &str = "feedline_cache_store_total";
const METRIC_CACHE_BUST_KEYS_TOTAL: &str = "feedline_cache_bust_keys_total";
const METRIC_CACHE_BUST_MS: &str = "feedline_cache_bust_ms";

/// Fronts a [`CacheBackend`] with read-through loading and batched busting.
///
/// Values are stored JSON-encoded so any backend that holds bytes can serve
/// them. Concurrent misses on the same key may each run their loader.
#[derive(Clone)]
pub struct CollectionCache {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
}

impl CollectionCache {
    pub fn new(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self { config, backend }
    }

    /// Return the cached value for `key`, or run `loader`, store its result
    /// with no expiry and return it.
    ///
    /// Loader errors are returned unchanged and nothing is stored.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &str, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.config.enabled {
            return loader().await;
        }

        if let Some(bytes) = self.backend.get(key).await {
            match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
                    debug!(key, "Cache hit");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(key, error = %err, "Discarding undecodable cache entry");
                }
            }
        }

        counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
        debug!(key, "Cache miss");

        let value = loader().await?;

        match serde_json::to_vec(&value) {
            Ok(encoded) => {
                self.backend.set(key, Bytes::from(encoded)).await;
                counter!(METRIC_CACHE_STORE_TOTAL).increment(1);
            }
            Err(err) => {
                warn!(key, error = %err, "Cache value could not be encoded; serving uncached");
            }
        }

        Ok(value)
    }

    /// Delete every key busted by `events` in one backend call.
    ///
    /// Absent keys are ignored. Once this returns, the next read of any busted
    /// key misses and reloads.
    pub async fn bust(&self, events: &[InvalidationEvent]) {
        if !self.config.enabled {
            debug!(event_count = events.len(), "Cache bust skipped: cache disabled");
            return;
        }

        let plan = BustPlan::from_events(events);
        if plan.is_empty() {
            return;
        }

        let started = Instant::now();
        let keys = plan.key_list();
        self.backend.delete_many(&keys).await;
        histogram!(METRIC_CACHE_BUST_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        for (kind, count) in &plan.per_kind {
            counter!(METRIC_CACHE_BUST_KEYS_TOTAL, "collection" => kind.name())
                .increment(*count as u64);
        }

        info!(
            plan = %plan,
            events = ?events
                .iter()
                .map(|event| (event.kind.name(), event.owner))
                .collect::<Vec<_>>(),
            "Cache busted"
        );
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }
}
