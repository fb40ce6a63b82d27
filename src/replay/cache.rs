//! Replay Cache Module
//!
//! Single-flight execution keyed by request id. The first caller for an id
//! claims it with a ticket and runs the handler; concurrent callers for the
//! same id wait on that ticket; later callers replay the committed outcome.
//! Claims and lookups only lock the store shard of their own id.
//!
//! A handler that never finishes keeps every waiter on its id suspended. The
//! cache imposes no timeout on handlers.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::replay::failure::{CallError, DeclaredFailure};
use crate::replay::handler::ReplayCallable;
use crate::replay::outcome::Outcome;
use crate::replay::stats::ReplayStats;
use crate::replay::store::{Lookup, OutcomeStore};
use crate::replay::RequestId;

/// Result of [`ReplayCache::run_once`] for handler `H`.
pub type ReplayResult<V, H> =
    Result<V, ReplayError<<<H as ReplayCallable<V>>::Failure as DeclaredFailure>::Wire>>;

// == Ticket ==
/// State published to callers waiting on an in-flight execution.
#[derive(Debug, Clone)]
enum Ticket<V> {
    Pending,
    Committed(Arc<Outcome<V>>),
    /// Execution hit an undeclared failure; waiters must claim again.
    Released,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    executions: AtomicU64,
    waits: AtomicU64,
    rollbacks: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

struct Shared<V> {
    store: OutcomeStore<V, watch::Receiver<Ticket<V>>>,
    counters: Counters,
}

enum Claim<V: Clone> {
    Replay(Arc<Outcome<V>>),
    Wait(watch::Receiver<Ticket<V>>),
    Execute(ClaimGuard<V>),
}

// == Claim Guard ==
/// Exclusive right to execute the handler for one request id.
///
/// Committing stores the outcome before publishing it to waiters. Dropping the
/// guard without committing rolls the claim back so the id can run again.
struct ClaimGuard<V: Clone> {
    shared: Arc<Shared<V>>,
    id: RequestId,
    generation: u64,
    ticket: watch::Sender<Ticket<V>>,
    settled: bool,
}

impl<V: Clone> ClaimGuard<V> {
    fn commit(mut self, outcome: Outcome<V>) -> Arc<Outcome<V>> {
        let outcome = Arc::new(outcome);
        self.shared
            .store
            .commit(&self.id, self.generation, Arc::clone(&outcome));
        self.ticket
            .send_replace(Ticket::Committed(Arc::clone(&outcome)));
        self.settled = true;
        debug!(request_id = %self.id, success = outcome.is_success(), "committed replay outcome");
        outcome
    }
}

impl<V: Clone> Drop for ClaimGuard<V> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.shared.store.release(&self.id, self.generation);
        bump(&self.shared.counters.rollbacks);
        self.ticket.send_replace(Ticket::Released);
    }
}

// == Replay Cache ==
/// Executes each handler at most once per live request id and replays the
/// memoized outcome to every other caller with that id.
///
/// Cloning is cheap; clones share the same entries.
pub struct ReplayCache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for ReplayCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Default for ReplayCache<V> {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

impl<V: Clone + Send + Sync + 'static> ReplayCache<V> {
    // == Constructor ==
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: OutcomeStore::new(config.max_size, config.time_to_live),
                counters: Counters::default(),
            }),
        }
    }

    // == Run Once ==
    /// Runs `handler` unless `id` already has a live outcome or an execution
    /// in flight, and returns the outcome every caller with `id` observes.
    ///
    /// Declared failures are cached and replayed through the handler's wire
    /// vocabulary. Undeclared failures and panics reach this caller only, as
    /// [`ReplayError::Internal`], and leave `id` free for a fresh execution.
    ///
    /// The handler runs on its own task, so dropping this future does not
    /// cancel it; its outcome is still committed for later replays.
    ///
    /// Once an entry expires or is evicted, `id` executes afresh. Callers must
    /// not reuse an id for a different logical call within the time-to-live.
    pub async fn run_once<H>(&self, id: impl Into<RequestId>, handler: H) -> ReplayResult<V, H>
    where
        H: ReplayCallable<V>,
    {
        let id = id.into();
        let guard = loop {
            match self.claim(&id) {
                Claim::Replay(outcome) => {
                    debug!(request_id = %id, "replaying cached outcome");
                    return outcome.replay::<H::Failure>().map_err(ReplayError::Declared);
                }
                Claim::Wait(mut ticket) => {
                    debug!(request_id = %id, "waiting on in-flight execution");
                    let state = match ticket.wait_for(|t| !matches!(t, Ticket::Pending)).await {
                        Ok(state) => (*state).clone(),
                        Err(_) => Ticket::Released,
                    };
                    if let Ticket::Committed(outcome) = state {
                        return outcome.replay::<H::Failure>().map_err(ReplayError::Declared);
                    }
                    debug!(request_id = %id, "in-flight execution released, claiming again");
                }
                Claim::Execute(guard) => break guard,
            }
        };

        self.execute(guard, handler).await
    }

    fn claim(&self, id: &RequestId) -> Claim<V> {
        let counters = &self.shared.counters;
        let (sender, receiver) = watch::channel(Ticket::Pending);

        match self.shared.store.lookup_or_claim(id, receiver) {
            Lookup::Live(outcome) => {
                bump(&counters.hits);
                Claim::Replay(outcome)
            }
            Lookup::Pending(ticket) => {
                bump(&counters.waits);
                Claim::Wait(ticket)
            }
            Lookup::Claimed(generation) => {
                bump(&counters.misses);
                bump(&counters.executions);
                Claim::Execute(ClaimGuard {
                    shared: Arc::clone(&self.shared),
                    id: id.clone(),
                    generation,
                    ticket: sender,
                    settled: false,
                })
            }
        }
    }

    async fn execute<H>(&self, guard: ClaimGuard<V>, handler: H) -> ReplayResult<V, H>
    where
        H: ReplayCallable<V>,
    {
        debug!(request_id = %guard.id, "executing handler");
        let task = tokio::spawn(async move {
            let declared = match AssertUnwindSafe(handler.call()).catch_unwind().await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(CallError::Declared(err))) => Err(err),
                Ok(Err(CallError::Undeclared(err))) => return Err(release(guard, err)),
                Err(payload) => {
                    let err = anyhow!("handler panicked: {}", panic_message(&*payload));
                    return Err(release(guard, err));
                }
            };
            Ok(guard.commit(Outcome::capture(declared)))
        });

        match task.await {
            Ok(Ok(outcome)) => outcome.replay::<H::Failure>().map_err(ReplayError::Declared),
            Ok(Err(err)) => Err(ReplayError::Internal(err)),
            Err(join_err) => Err(ReplayError::Internal(anyhow::Error::new(join_err))),
        }
    }

    // == Purge Expired ==
    /// Physically drops expired entries. Expired entries are already invisible
    /// to lookups; this only reclaims their memory.
    pub fn purge_expired(&self) -> usize {
        self.shared.store.purge_expired()
    }

    // == Stats ==
    pub fn stats(&self) -> ReplayStats {
        let counters = &self.shared.counters;
        let store = &self.shared.store;
        ReplayStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            executions: counters.executions.load(Ordering::Relaxed),
            waits: counters.waits.load(Ordering::Relaxed),
            rollbacks: counters.rollbacks.load(Ordering::Relaxed),
            evictions: store.evictions(),
            expirations: store.expirations(),
            entries: store.len(),
            in_flight: store.in_flight(),
        }
    }

    /// Number of committed entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of request ids whose handler is currently running.
    pub fn in_flight(&self) -> usize {
        self.shared.store.in_flight()
    }
}

/// Rolls back the claim held by `guard` after an undeclared failure.
fn release<V: Clone>(guard: ClaimGuard<V>, err: anyhow::Error) -> anyhow::Error {
    warn!(request_id = %guard.id, error = %err, "undeclared failure, releasing request id");
    drop(guard);
    err
}

// == Purge Seam ==
/// Type-erased handle used by the cleanup task to maintain caches of any value type.
pub trait PurgeExpired: Send + Sync {
    fn purge_expired(&self) -> usize;
}

impl<V: Clone + Send + Sync + 'static> PurgeExpired for ReplayCache<V> {
    fn purge_expired(&self) -> usize {
        ReplayCache::purge_expired(self)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
