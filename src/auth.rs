//! Authentication Module
//!
//! Caller identity checks performed before a request reaches a replay cache.
//! Providers are pure checks and never touch cache state.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::error::ConfigError;

// == Authentication Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Invalid credential for user: {0}")]
    InvalidCredential(String),
}

// == Provider ==
/// Validates a (user, credential) pair.
pub trait AuthenticationProvider: Send + Sync {
    fn authenticate(&self, user: &str, credential: &str) -> Result<(), AuthenticationError>;
}

/// Accepts every user and credential, empty strings included.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleAuthenticationProvider;

impl AuthenticationProvider for SimpleAuthenticationProvider {
    fn authenticate(&self, _user: &str, _credential: &str) -> Result<(), AuthenticationError> {
        Ok(())
    }
}

/// Checks credentials against a fixed user -> secret table.
#[derive(Debug, Default, Clone)]
pub struct CustomAuthenticationProvider {
    users: HashMap<String, String>,
}

impl CustomAuthenticationProvider {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }
}

impl AuthenticationProvider for CustomAuthenticationProvider {
    fn authenticate(&self, user: &str, credential: &str) -> Result<(), AuthenticationError> {
        match self.users.get(user) {
            None => Err(AuthenticationError::UnknownUser(user.to_string())),
            Some(secret) if secret == credential => Ok(()),
            Some(_) => Err(AuthenticationError::InvalidCredential(user.to_string())),
        }
    }
}

// == Auth Type ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Simple,
    Custom,
}

impl AuthType {
    /// Builds the provider for this scheme. `users` is only read by [`AuthType::Custom`].
    pub fn provider(self, users: &HashMap<String, String>) -> Arc<dyn AuthenticationProvider> {
        match self {
            AuthType::Simple => Arc::new(SimpleAuthenticationProvider),
            AuthType::Custom => Arc::new(CustomAuthenticationProvider::new(users.clone())),
        }
    }
}

impl FromStr for AuthType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(AuthType::Simple),
            "CUSTOM" => Ok(AuthType::Custom),
            other => Err(ConfigError::Invalid(format!("unknown auth type {other}"))),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::Simple => f.write_str("SIMPLE"),
            AuthType::Custom => f.write_str("CUSTOM"),
        }
    }
}
