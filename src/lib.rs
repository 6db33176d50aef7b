//! Feedline: per-user activity timelines backed by a relational store, with
//! collection-level read-through caching and event-driven invalidation.
//!
//! - [`cache`] derives keys, maps invalidation events to bust sets and fronts
//!   an injectable [`cache::CacheBackend`].
//! - [`application`] holds the collection accessors, the timeline engine and
//!   the mutation handlers that bust the cache after every committed write.
//! - [`infra`] provides the Postgres and in-memory repository adapters, media
//!   storage and telemetry bootstrap.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub(crate) mod util;
