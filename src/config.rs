//! Configuration Module
//!
//! Replay cache sizing plus server configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::AuthType;
use crate::error::ConfigError;
use crate::replay::{DEFAULT_MAX_SIZE, DEFAULT_TIME_TO_LIVE_MS};

// == Replay Config ==
/// Size and time bounds of one replay cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Maximum number of committed outcomes held before the least recently written is evicted
    pub max_size: usize,
    /// How long an outcome stays visible after it is written
    pub time_to_live: Duration,
}

impl ReplayConfig {
    /// Builds a config, rejecting zero bounds.
    pub fn new(max_size: usize, time_to_live_ms: u64) -> Result<Self, ConfigError> {
        if max_size == 0 {
            return Err(ConfigError::NonPositive("max_size"));
        }
        if time_to_live_ms == 0 {
            return Err(ConfigError::NonPositive("time_to_live_ms"));
        }
        Ok(Self {
            max_size,
            time_to_live: Duration::from_millis(time_to_live_ms),
        })
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            time_to_live: Duration::from_millis(DEFAULT_TIME_TO_LIVE_MS),
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum committed outcomes per replay cache
    pub max_size: usize,
    /// Outcome time-to-live in milliseconds
    pub time_to_live_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background purge interval in milliseconds
    pub cleanup_interval_ms: u64,
    /// Authentication scheme applied before the replay caches
    pub auth_type: AuthType,
    /// user -> secret table for [`AuthType::Custom`]
    pub auth_users: HashMap<String, String>,
    /// Append-only journal of namespace renames
    pub journal_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REPLAY_MAX_SIZE` - Maximum cached outcomes (default: 10000)
    /// - `REPLAY_TTL_MS` - Outcome time-to-live in milliseconds (default: 2000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL_MS` - Purge frequency in milliseconds (default: 1000)
    /// - `AUTH_TYPE` - `SIMPLE` or `CUSTOM` (default: SIMPLE)
    /// - `AUTH_USERS` - `user:secret` pairs separated by commas, for CUSTOM
    /// - `JOURNAL_PATH` - Rename journal file (default: none)
    ///
    /// Malformed numbers fall back to their defaults. An unrecognized
    /// `AUTH_TYPE` is an error, since falling back would admit every caller.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_size: parse_var("REPLAY_MAX_SIZE").unwrap_or(defaults.max_size),
            time_to_live_ms: parse_var("REPLAY_TTL_MS").unwrap_or(defaults.time_to_live_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval_ms: parse_var("CLEANUP_INTERVAL_MS")
                .unwrap_or(defaults.cleanup_interval_ms),
            auth_type: parse_auth_type(env::var("AUTH_TYPE").ok().as_deref())?,
            auth_users: env::var("AUTH_USERS")
                .map(|v| parse_users(&v))
                .unwrap_or_default(),
            journal_path: env::var_os("JOURNAL_PATH").map(PathBuf::from),
        })
    }

    /// Validated replay cache bounds.
    pub fn replay(&self) -> Result<ReplayConfig, ConfigError> {
        ReplayConfig::new(self.max_size, self.time_to_live_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            time_to_live_ms: DEFAULT_TIME_TO_LIVE_MS,
            server_port: 3000,
            cleanup_interval_ms: 1000,
            auth_type: AuthType::Simple,
            auth_users: HashMap::new(),
            journal_path: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// An unset or blank `AUTH_TYPE` selects [`AuthType::Simple`].
fn parse_auth_type(raw: Option<&str>) -> Result<AuthType, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(AuthType::Simple),
        Some(value) => value.parse(),
    }
}

/// Parses `alice:secret,bob:hunter2`. Malformed pairs are skipped.
fn parse_users(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once(':'))
        .filter(|(user, _)| !user.trim().is_empty())
        .map(|(user, secret)| (user.trim().to_string(), secret.to_string()))
        .collect()
}
