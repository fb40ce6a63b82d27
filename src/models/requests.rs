//! Request DTOs for the replay server API
//!
//! Defines the structure of incoming HTTP request bodies. The request id and
//! caller identity travel in headers, not in these bodies.

use serde::Deserialize;

/// Request body for POST /files
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFileRequest {
    /// Absolute path of the file to create
    pub path: String,
}

impl CreateFileRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.path.is_empty() {
            return Some("Path cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /files/rename
#[derive(Debug, Clone, Deserialize)]
pub struct RenameFileRequest {
    pub src: String,
    pub dst: String,
}

impl RenameFileRequest {
    pub fn validate(&self) -> Option<String> {
        if self.src.is_empty() || self.dst.is_empty() {
            return Some("Source and destination cannot be empty".to_string());
        }
        None
    }
}
