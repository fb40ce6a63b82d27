//! Replay Cache - replay protection for non-idempotent RPCs
//!
//! Executes a handler at most once per caller-supplied request id within a
//! bounded, expiring window and replays the memoized result (or declared
//! failure) to retries.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod namespace;
pub mod replay;
pub mod tasks;

pub use api::AppState;
pub use config::{Config, ReplayConfig};
pub use error::ReplayError;
pub use replay::{CallError, DomainError, ReplayCache, RequestId, RpcFailure};
pub use tasks::spawn_cleanup_task;
