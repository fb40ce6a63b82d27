//! Replay Module
//!
//! Replay protection for non-idempotent RPC handlers: a bounded, expiring
//! outcome store, single-flight execution per request id, and translation of
//! declared failures to wire faults.

mod cache;
mod entry;
mod failure;
mod handler;
mod lru;
mod outcome;
mod request_id;
mod stats;
mod store;
mod wire;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use cache::{PurgeExpired, ReplayCache, ReplayResult};
pub use failure::{CallError, DeclaredFailure, DomainError, Failure, FailureKind, RpcFailure};
pub use handler::ReplayCallable;
pub use outcome::Outcome;
pub use request_id::RequestId;
pub use stats::ReplayStats;
pub use wire::{DomainFault, IoFault, RpcFault};

// == Public Constants ==
/// Default maximum number of committed outcomes held
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Default time-to-live of a committed outcome, in milliseconds
pub const DEFAULT_TIME_TO_LIVE_MS: u64 = 2_000;
