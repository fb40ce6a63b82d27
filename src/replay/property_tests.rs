//! Property-Based Tests for the Replay Module
//!
//! Uses proptest to check the store bounds and the single-execution guarantee.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ReplayConfig;
use crate::replay::store::OutcomeStore;
use crate::replay::{CallError, DomainError, Outcome, ReplayCache};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates request ids
fn request_id_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}"
}

/// Generates a sequence of distinct request ids
fn distinct_ids_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(request_id_strategy(), 1..max).prop_map(|ids| {
        let mut seen = HashSet::new();
        ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Capacity: the store never holds more than max_size outcomes.
    #[test]
    fn prop_capacity_enforcement(
        ids in prop::collection::vec(request_id_strategy(), 1..200),
        max_size in 1usize..20
    ) {
        let store: OutcomeStore<(), ()> = OutcomeStore::new(max_size, TEST_TTL);

        for id in ids {
            store.put(&id, Outcome::Success(()), ());
            prop_assert!(
                store.len() <= max_size,
                "Store size {} exceeds max {}",
                store.len(),
                max_size
            );
        }
    }

    // Eviction order: after overfilling, exactly the most recently written
    // max_size ids survive.
    #[test]
    fn prop_eviction_keeps_most_recent_writes(
        ids in distinct_ids_strategy(40),
        max_size in 1usize..10
    ) {
        let store: OutcomeStore<String, ()> = OutcomeStore::new(max_size, TEST_TTL);
        for id in &ids {
            store.put(id, Outcome::Success(id.clone()), ());
        }

        let survivors = ids.len().saturating_sub(max_size);
        for (index, id) in ids.iter().enumerate() {
            let live = store.get(id).is_some();
            prop_assert_eq!(live, index >= survivors, "unexpected liveness for {}", id);
        }
    }

    // Replay fidelity: whatever was committed first is what every later
    // lookup sees, success or declared failure.
    #[test]
    fn prop_first_outcome_wins(
        id in request_id_strategy(),
        fail_first in any::<bool>(),
        attempts in 2usize..6
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let cache: ReplayCache<usize> = ReplayCache::new(ReplayConfig::default());
            let mut results = Vec::new();

            for attempt in 0..attempts {
                let result = cache
                    .run_once(id.clone(), move || async move {
                        if fail_first && attempt == 0 {
                            Err(CallError::Declared(DomainError::new("Rejected", "first attempt")))
                        } else {
                            Ok::<usize, CallError<DomainError>>(attempt)
                        }
                    })
                    .await
                    .map_err(|err| err.to_string());
                results.push(result);
            }

            for result in &results {
                prop_assert_eq!(result, &results[0]);
            }
            prop_assert_eq!(results[0].is_err(), fail_first);
            Ok(())
        })?;
    }
}

// Fewer cases: each spawns a batch of concurrent callers
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Single execution: N concurrent callers with one id run the handler once.
    #[test]
    fn prop_concurrent_callers_execute_once(
        id in request_id_strategy(),
        callers in 2usize..32
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let cache: ReplayCache<usize> = ReplayCache::new(ReplayConfig::default());
            let counter = Arc::new(AtomicUsize::new(0));

            let mut handles = vec![];
            for _ in 0..callers {
                let cache = cache.clone();
                let counter = Arc::clone(&counter);
                let id = id.clone();
                handles.push(tokio::spawn(async move {
                    cache
                        .run_once(id, move || async move {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            Ok::<usize, CallError<DomainError>>(counter.fetch_add(1, Ordering::SeqCst) + 1)
                        })
                        .await
                }));
            }

            for handle in handles {
                let value = handle.await.expect("Task should not panic");
                prop_assert_eq!(value.ok(), Some(1));
            }
            prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
            prop_assert_eq!(cache.in_flight(), 0);
            Ok(())
        })?;
    }
}
