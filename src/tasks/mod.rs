//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry purge: reclaims memory held by expired replay outcomes

mod cleanup;

pub use cleanup::spawn_cleanup_task;
