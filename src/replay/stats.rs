//! Replay Statistics Module
//!
//! Counters describing how a replay cache has been used.

use serde::Serialize;

// == Replay Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Calls answered from a committed outcome
    pub hits: u64,
    /// Calls that found neither a committed outcome nor an in-flight execution
    pub misses: u64,
    /// Handler executions started
    pub executions: u64,
    /// Calls that waited on another caller's in-flight execution
    pub waits: u64,
    /// Executions rolled back after an undeclared failure
    pub rollbacks: u64,
    /// Entries dropped to respect the size bound
    pub evictions: u64,
    /// Entries dropped because their time-to-live elapsed
    pub expirations: u64,
    /// Committed entries currently held
    pub entries: usize,
    /// Request ids currently executing
    pub in_flight: usize,
}

impl ReplayStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
