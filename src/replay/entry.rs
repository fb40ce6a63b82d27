//! Cache Entry Module
//!
//! A committed outcome together with its write timestamp.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::replay::outcome::Outcome;

// == Cache Entry ==
/// A committed outcome, owned exclusively by the store.
///
/// The outcome is shared so that replays clone it outside the store's locks.
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
    /// The memoized outcome
    pub outcome: Arc<Outcome<V>>,
    /// When the outcome was written; expiry is measured from here, reads never refresh it
    pub written_at: Instant,
    /// Write sequence number, used as the recency key for eviction
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(outcome: Arc<Outcome<V>>, seq: u64) -> Self {
        Self {
            outcome,
            written_at: Instant::now(),
            seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl` since its write.
    ///
    /// Boundary condition: an entry is expired once the elapsed time is greater
    /// than or equal to the time-to-live.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.written_at.elapsed() >= ttl
    }
}
