//! Request and Response models for the replay server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CreateFileRequest, RenameFileRequest};
pub use responses::{CacheStatsResponse, FileResponse, HealthResponse, StatsResponse};
