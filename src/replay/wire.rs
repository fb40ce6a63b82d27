//! Wire Faults
//!
//! The narrower error vocabulary that crosses the RPC boundary. Cached
//! failures are translated into these shapes before reaching a caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire shape of a declared domain failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct DomainFault {
    code: String,
    message: String,
}

impl DomainFault {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Wire shape of an I/O failure. Carries only the message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct IoFault {
    message: String,
}

impl IoFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Faults a wide-failure handler may surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcFault {
    #[error(transparent)]
    Domain(DomainFault),

    #[error(transparent)]
    Io(IoFault),
}
