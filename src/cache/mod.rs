//! Collection cache.
//!
//! Derived collections (a user's posts, feed ids and hydrated feed, a post's
//! comment views) are cached under keys built by [`derive_key`]. Write paths
//! never update cached values; they raise [`InvalidationEvent`]s and
//! [`CollectionCache::bust`] evicts every collection the event makes stale.
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 10000
//! ```

mod collections;
mod config;
mod events;
mod keys;
mod planner;
mod store;

pub use collections::CollectionCache;
pub use config::CacheConfig;
pub use events::{EventKind, InvalidationEvent};
pub use keys::{CollectionKind, KeyError, derive_key, derive_key_for};
pub use planner::BustPlan;
pub use store::{CacheBackend, MemoryCacheBackend};
