//! Expiry Purge Task
//!
//! Background task that periodically drops expired replay outcomes. Expired
//! outcomes are already invisible to callers; this only bounds memory between
//! writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::replay::PurgeExpired;

/// Spawns a background task that purges every cache in `caches` once per `interval`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(state.purgeables(), Duration::from_secs(1));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    caches: Vec<Arc<dyn PurgeExpired>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting replay purge task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed: usize = caches.iter().map(|cache| cache.purge_expired()).sum();

            if removed > 0 {
                info!("Replay purge: removed {} expired outcomes", removed);
            } else {
                debug!("Replay purge: no expired outcomes found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplayConfig;
    use crate::replay::{CallError, DomainError, ReplayCache};

    async fn fill(cache: &ReplayCache<u32>, id: &str) {
        cache
            .run_once(id, || async { Ok::<u32, CallError<DomainError>>(1) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = ReplayCache::new(ReplayConfig::new(100, 50).unwrap());
        fill(&cache, "expire_soon").await;

        let handle = spawn_cleanup_task(
            vec![Arc::new(cache.clone()) as Arc<dyn PurgeExpired>],
            Duration::from_millis(100),
        );

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(cache.is_empty(), "Expired outcome should have been purged");
        assert_eq!(cache.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_live_entries() {
        let cache = ReplayCache::new(ReplayConfig::new(100, 60_000).unwrap());
        fill(&cache, "long_lived").await;

        let handle = spawn_cleanup_task(
            vec![Arc::new(cache.clone()) as Arc<dyn PurgeExpired>],
            Duration::from_millis(50),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.len(), 1, "Live outcome should not be purged");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(Vec::new(), Duration::from_millis(50));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
