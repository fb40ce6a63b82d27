//! LRU Tracker Module
//!
//! Tracks write recency for capacity eviction.

use std::collections::BTreeMap;

use crate::replay::RequestId;

// == LRU Tracker ==
/// Tracks request ids by write order.
///
/// Each write gets a fresh, strictly increasing sequence number:
/// - Lowest sequence = least recently written
/// - Highest sequence = most recently written
///
/// Reads never touch the tracker, so recency is recency-of-write.
#[derive(Debug, Default)]
pub(crate) struct LruTracker {
    /// Request ids keyed by write sequence
    order: BTreeMap<u64, RequestId>,
    next_seq: u64,
}

impl LruTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Records a write for `id` and returns its sequence number.
    ///
    /// The caller must [`remove`](Self::remove) any previous sequence of the same id.
    pub fn touch(&mut self, id: RequestId) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id);
        seq
    }

    // == Remove ==
    pub fn remove(&mut self, seq: u64) -> Option<RequestId> {
        self.order.remove(&seq)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently written id with its sequence.
    pub fn evict_oldest(&mut self) -> Option<(u64, RequestId)> {
        self.order.pop_first()
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<(u64, &RequestId)> {
        self.order.first_key_value().map(|(seq, id)| (*seq, id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}
