//! Outcome Module
//!
//! The single cacheable result of one handler execution.

use crate::replay::failure::{DeclaredFailure, Failure};

// == Outcome ==
/// Success value or declared failure for one request id. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V> {
    Success(V),
    Failure(Failure),
}

impl<V> Outcome<V> {
    /// Normalizes a handler result that already excludes undeclared failures.
    pub fn capture<E: DeclaredFailure>(result: Result<V, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err.into_failure()),
        }
    }

    /// Replays the outcome through the declared vocabulary `E`.
    pub fn replay<E: DeclaredFailure>(&self) -> Result<V, E::Wire>
    where
        V: Clone,
    {
        match self {
            Outcome::Success(value) => Ok(value.clone()),
            Outcome::Failure(failure) => Err(E::to_wire(failure)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::failure::{DomainError, FailureKind, RpcFailure};
    use crate::replay::wire::RpcFault;

    #[test]
    fn test_capture_success() {
        let outcome = Outcome::capture::<DomainError>(Ok(7u64));
        assert!(outcome.is_success());
        assert_eq!(outcome.replay::<DomainError>(), Ok(7));
    }

    #[test]
    fn test_capture_domain_failure() {
        let outcome: Outcome<u64> =
            Outcome::capture(Err(DomainError::new("FileAlreadyExists", "/a")));

        match &outcome {
            Outcome::Failure(failure) => assert_eq!(failure.kind, FailureKind::Domain),
            Outcome::Success(_) => panic!("expected failure"),
        }

        let fault = outcome.replay::<DomainError>().unwrap_err();
        assert_eq!(fault.code(), "FileAlreadyExists");
        assert_eq!(fault.message(), "/a");
    }

    #[test]
    fn test_replay_is_repeatable() {
        let outcome: Outcome<()> = Outcome::capture(Err(RpcFailure::Io(std::io::Error::other(
            "disk full",
        ))));

        let first = outcome.replay::<RpcFailure>().unwrap_err();
        let second = outcome.replay::<RpcFailure>().unwrap_err();
        assert_eq!(first, second);
        assert!(matches!(first, RpcFault::Io(_)));
    }
}
