//! Response DTOs for the replay server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::namespace::FileInfo;
use crate::replay::ReplayStats;

/// Response body for file operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResponse {
    pub id: u64,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl From<FileInfo> for FileResponse {
    fn from(info: FileInfo) -> Self {
        Self {
            id: info.id,
            path: info.path,
            created_at: info.created_at,
        }
    }
}

/// Statistics of one replay cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: ReplayStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<ReplayStats> for CacheStatsResponse {
    fn from(stats: ReplayStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub create_file: CacheStatsResponse,
    pub rename_file: CacheStatsResponse,
    /// Files currently in the namespace
    pub files: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
