//! Cache configuration.
//!
//! Controls the collection cache via the `[cache]` table of `feedline.toml`.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_CAPACITY: usize = 10_000;

/// Cache configuration from `feedline.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable collection caching. When off, every read goes to the store.
    pub enabled: bool,
    /// Maximum number of cached collections held by the in-memory backend.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
