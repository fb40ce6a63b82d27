//! Failure Vocabulary Module
//!
//! Declared failure kinds a wrapped handler may produce, and the normalizer
//! that turns them into cacheable [`Failure`] records and back into wire faults.

use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::replay::wire::{DomainFault, IoFault, RpcFault};

// == Failure Kind ==
/// Tag distinguishing the declared failure kinds in a cached record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Business-logic failure raised by the handler.
    Domain,
    /// Low-level I/O failure raised by a wide-failure handler.
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Domain => f.write_str("domain"),
            FailureKind::Io => f.write_str("io"),
        }
    }
}

// == Failure Record ==
/// Immutable record of a declared failure, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    /// Domain error code, or the I/O error kind for [`FailureKind::Io`].
    pub code: String,
    pub message: String,
    pub cause: Option<String>,
}

// == Domain Error ==
/// The single declared business failure a handler may raise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    code: String,
    message: String,
    cause: Option<String>,
}

impl DomainError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Attaches a textual cause, kept in the cached record.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// == Wide Failure ==
/// Failure vocabulary of handlers that may also fail with I/O errors.
#[derive(Debug, Error)]
pub enum RpcFailure {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

// == Call Error ==
/// What a handler returns on failure: a declared kind, or anything else.
///
/// Undeclared failures are never cached; they reach the executing caller only
/// and release the request id for a fresh attempt.
#[derive(Debug, Error)]
pub enum CallError<E> {
    #[error(transparent)]
    Declared(E),

    #[error("undeclared failure: {0}")]
    Undeclared(anyhow::Error),
}

impl<E> CallError<E> {
    pub fn undeclared(err: impl Into<anyhow::Error>) -> Self {
        CallError::Undeclared(err.into())
    }
}

impl<E> From<E> for CallError<E> {
    fn from(err: E) -> Self {
        CallError::Declared(err)
    }
}

impl From<DomainError> for CallError<RpcFailure> {
    fn from(err: DomainError) -> Self {
        CallError::Declared(RpcFailure::Domain(err))
    }
}

impl From<io::Error> for CallError<RpcFailure> {
    fn from(err: io::Error) -> Self {
        CallError::Declared(RpcFailure::Io(err))
    }
}

// == Normalizer ==
/// A declared failure set: how to record it and how to replay it on the wire.
pub trait DeclaredFailure: Send + 'static {
    /// Wire-transmissible error the caller receives, both live and on replay.
    type Wire: std::error::Error + Send + Sync + 'static;

    /// Captures the failure as a cacheable record.
    fn into_failure(self) -> Failure;

    /// Rebuilds the wire error from a cached record.
    fn to_wire(failure: &Failure) -> Self::Wire;
}

impl DeclaredFailure for DomainError {
    type Wire = DomainFault;

    fn into_failure(self) -> Failure {
        Failure {
            kind: FailureKind::Domain,
            code: self.code,
            message: self.message,
            cause: self.cause,
        }
    }

    /// Narrow handlers only know the domain fault, so every record replays as one.
    fn to_wire(failure: &Failure) -> DomainFault {
        DomainFault::new(&failure.code, &failure.message)
    }
}

impl DeclaredFailure for RpcFailure {
    type Wire = RpcFault;

    fn into_failure(self) -> Failure {
        match self {
            RpcFailure::Domain(err) => err.into_failure(),
            RpcFailure::Io(err) => Failure {
                kind: FailureKind::Io,
                code: format!("{:?}", err.kind()),
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(ToString::to_string),
            },
        }
    }

    fn to_wire(failure: &Failure) -> RpcFault {
        match failure.kind {
            FailureKind::Domain => RpcFault::Domain(DomainError::to_wire(failure)),
            FailureKind::Io => RpcFault::Io(IoFault::new(&failure.message)),
        }
    }
}
