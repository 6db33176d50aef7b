//! Bust plan generation.
//!
//! Merges a batch of invalidation events into the deduplicated set of keys to
//! delete in a single backend call.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::events::InvalidationEvent;
use super::keys::{CollectionKind, derive_key};

/// Keys to delete for one batch of events.
#[derive(Debug, Default)]
pub struct BustPlan {
    /// Cache keys to delete, sorted for stable logging.
    pub keys: BTreeSet<String>,
    /// Number of keys per busted collection kind.
    pub per_kind: BTreeMap<CollectionKind, usize>,
    /// Number of events merged into this plan, duplicates included.
    pub event_count: usize,
}

impl fmt::Display for BustPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BustPlan {{ events: {}, keys: {} }}",
            self.event_count,
            self.keys.len()
        )
    }
}

impl BustPlan {
    /// Resolve each event's bust set against its owner.
    ///
    /// Two events that bust the same collection for the same owner yield one key.
    pub fn from_events(events: &[InvalidationEvent]) -> Self {
        let mut plan = Self {
            event_count: events.len(),
            ..Self::default()
        };

        for event in events {
            for kind in event.kind.bust_set() {
                if plan.keys.insert(derive_key(*kind, event.owner)) {
                    *plan.per_kind.entry(*kind).or_default() += 1;
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in the order they will be sent to the backend.
    pub fn key_list(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }
}
