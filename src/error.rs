//! Error types for the replay cache and its server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthenticationError;
use crate::replay::{DomainFault, IoFault, RpcFault};

// == Replay Error ==
/// What a replay-protected call returns on failure.
#[derive(Error, Debug)]
pub enum ReplayError<W> {
    /// A declared failure, live or replayed, in its wire shape
    #[error(transparent)]
    Declared(W),

    /// An undeclared failure of this caller's own execution; never cached
    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

// == Config Error ==
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// == Api Error ==
/// Unified error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller identity rejected before reaching any replay cache
    #[error(transparent)]
    Unauthenticated(#[from] AuthenticationError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Declared domain failure of an RPC
    #[error(transparent)]
    Domain(DomainFault),

    /// Declared I/O failure of an RPC
    #[error("I/O failure: {0}")]
    Io(IoFault),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ReplayError<DomainFault>> for ApiError {
    fn from(err: ReplayError<DomainFault>) -> Self {
        match err {
            ReplayError::Declared(fault) => ApiError::Domain(fault),
            ReplayError::Internal(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ReplayError<RpcFault>> for ApiError {
    fn from(err: ReplayError<RpcFault>) -> Self {
        match err {
            ReplayError::Declared(RpcFault::Domain(fault)) => ApiError::Domain(fault),
            ReplayError::Declared(RpcFault::Io(fault)) => ApiError::Io(fault),
            ReplayError::Internal(err) => ApiError::Internal(err.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Unauthenticated(err) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": err.to_string() }))
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Domain(fault) => (
                StatusCode::CONFLICT,
                json!({ "error": fault.message(), "code": fault.code(), "kind": "domain" }),
            ),
            ApiError::Io(fault) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": fault.message(), "kind": "io" }),
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
