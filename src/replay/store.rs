//! Outcome Store Module
//!
//! Bounded expiring map from request id to slot. A slot is either an
//! in-flight execution or a committed outcome. Slots live in a sharded
//! concurrent map, so lookups and claims only lock the shard of their own id.
//! Write order is kept apart from the slots and is only consulted on commit,
//! eviction and purge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::replay::entry::CacheEntry;
use crate::replay::lru::LruTracker;
use crate::replay::outcome::Outcome;
use crate::replay::RequestId;

// == Slot ==
enum Slot<V, P> {
    /// Execution claimed under `generation`; `pending` is handed to waiters.
    InFlight { generation: u64, pending: P },
    Committed(CacheEntry<V>),
}

impl<V, P> Slot<V, P> {
    fn is_claimed_by(&self, generation: u64) -> bool {
        matches!(self, Slot::InFlight { generation: owner, .. } if *owner == generation)
    }

    fn is_committed_as(&self, seq: u64) -> bool {
        matches!(self, Slot::Committed(entry) if entry.seq == seq)
    }
}

/// What a caller found for its request id.
pub(crate) enum Lookup<V, P> {
    /// A committed outcome that has not expired
    Live(Arc<Outcome<V>>),
    /// Another caller is executing; wait on its marker
    Pending(P),
    /// The caller now owns the execution under this generation
    Claimed(u64),
}

// == Outcome Store ==
pub(crate) struct OutcomeStore<V, P> {
    slots: DashMap<RequestId, Slot<V, P>>,
    /// Write order of committed slots. Lock order: recency, then a shard.
    recency: Mutex<LruTracker>,
    max_size: usize,
    ttl: Duration,
    next_generation: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<V, P: Clone> OutcomeStore<V, P> {
    // == Constructor ==
    /// Creates a store holding at most `max_size` committed outcomes, each
    /// visible for `ttl` after its write.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            recency: Mutex::new(LruTracker::new()),
            max_size,
            ttl,
            next_generation: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    // == Lookup Or Claim ==
    /// Returns the live outcome for `id`, the marker of its in-flight
    /// execution, or claims `id` for the caller with `pending` as its marker.
    ///
    /// The check and the claim happen under the shard lock of `id` alone. An
    /// expired outcome counts as absent and is replaced by the claim. Reads
    /// neither refresh the time-to-live nor the eviction order.
    pub fn lookup_or_claim(&self, id: &RequestId, pending: P) -> Lookup<V, P> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let expired_seq = match self.slots.entry(id.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::InFlight { generation, pending });
                None
            }
            Entry::Occupied(mut occupied) => {
                let seq = match occupied.get() {
                    Slot::InFlight { pending: marker, .. } => {
                        return Lookup::Pending(marker.clone());
                    }
                    Slot::Committed(entry) if !entry.is_expired(self.ttl) => {
                        return Lookup::Live(Arc::clone(&entry.outcome));
                    }
                    Slot::Committed(entry) => entry.seq,
                };
                occupied.insert(Slot::InFlight { generation, pending });
                Some(seq)
            }
        };

        if let Some(seq) = expired_seq {
            self.lock_recency().remove(seq);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            debug!(request_id = %id, "replay entry expired");
        }
        Lookup::Claimed(generation)
    }

    // == Commit ==
    /// Replaces the slot claimed under `generation` with `outcome`.
    ///
    /// When the store is full, the least recently written outcomes are dropped
    /// first. All outcomes share one time-to-live, so the oldest writes are
    /// also the first to expire. In-flight slots are never dropped.
    pub fn commit(&self, id: &RequestId, generation: u64, outcome: Arc<Outcome<V>>) {
        let mut recency = self.lock_recency();
        while recency.len() >= self.max_size {
            let Some((seq, oldest)) = recency.evict_oldest() else {
                break;
            };
            let Some(entry) = self.remove_committed(&oldest, seq) else {
                continue;
            };
            if entry.is_expired(self.ttl) {
                self.expirations.fetch_add(1, Ordering::Relaxed);
            } else {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %oldest, "evicted replay entry");
            }
        }

        let seq = recency.touch(id.clone());
        match self.slots.get_mut(id) {
            Some(mut slot) if slot.is_claimed_by(generation) => {
                *slot = Slot::Committed(CacheEntry::new(outcome, seq));
            }
            _ => {
                recency.remove(seq);
            }
        }
    }

    // == Release ==
    /// Rolls back the claim taken under `generation`, leaving `id` unclaimed.
    pub fn release(&self, id: &RequestId, generation: u64) {
        self.slots
            .remove_if(id, |_, slot| slot.is_claimed_by(generation));
    }

    // == Purge Expired ==
    /// Physically removes every expired outcome and returns how many were dropped.
    ///
    /// The scan follows write order and stops at the first live outcome.
    pub fn purge_expired(&self) -> usize {
        let mut recency = self.lock_recency();
        let mut removed = 0;
        loop {
            let Some((seq, id)) = recency.peek_oldest().map(|(seq, id)| (seq, id.clone())) else {
                break;
            };
            let live = self.slots.get(&id).is_some_and(|slot| match &*slot {
                Slot::Committed(entry) => entry.seq == seq && !entry.is_expired(self.ttl),
                Slot::InFlight { .. } => false,
            });
            if live {
                break;
            }
            recency.remove(seq);
            if self.remove_committed(&id, seq).is_some() {
                self.expirations.fetch_add(1, Ordering::Relaxed);
                removed += 1;
            }
        }
        removed
    }

    fn remove_committed(&self, id: &RequestId, seq: u64) -> Option<CacheEntry<V>> {
        match self.slots.remove_if(id, |_, slot| slot.is_committed_as(seq)) {
            Some((_, Slot::Committed(entry))) => Some(entry),
            _ => None,
        }
    }

    /// Never held across an await or while a shard lock is held.
    fn lock_recency(&self) -> MutexGuard<'_, LruTracker> {
        self.recency.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of committed outcomes held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock_recency().len()
    }

    /// Number of request ids currently claimed for execution.
    pub fn in_flight(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::InFlight { .. }))
            .count()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
impl<V, P: Clone> OutcomeStore<V, P> {
    /// Claims and commits `id` in one step; a live id is left untouched.
    pub(crate) fn put(&self, id: &str, outcome: Outcome<V>, pending: P) {
        let id = RequestId::from(id);
        if let Lookup::Claimed(generation) = self.lookup_or_claim(&id, pending) {
            self.commit(&id, generation, Arc::new(outcome));
        }
    }

    /// Returns the live committed outcome for `id` without claiming it.
    pub(crate) fn get(&self, id: &str) -> Option<Arc<Outcome<V>>> {
        let slot = self.slots.get(id)?;
        let outcome = match &*slot {
            Slot::Committed(entry) if !entry.is_expired(self.ttl) => {
                Some(Arc::clone(&entry.outcome))
            }
            _ => None,
        };
        outcome
    }
}
