//! Handler Module
//!
//! The opaque callable a replay cache wraps.

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::replay::failure::{CallError, DeclaredFailure};

// == Replay Callable ==
/// A non-idempotent RPC body with a declared failure vocabulary.
///
/// `Failure = DomainError` describes a narrow-failure handler and
/// `Failure = RpcFailure` a wide one that may also fail with I/O errors.
/// Anything returned as [`CallError::Undeclared`] is treated as internal.
///
/// Closures returning a `Send + 'static` future implement this trait, so
/// most callers never name it:
///
/// ```ignore
/// cache.run_once("rpc-1", || async {
///     Ok::<_, CallError<DomainError>>(create_file("/a")?)
/// }).await
/// ```
pub trait ReplayCallable<V>: Send + 'static {
    type Failure: DeclaredFailure;

    /// Runs the handler body. Consumed because it runs at most once.
    fn call(self) -> BoxFuture<'static, Result<V, CallError<Self::Failure>>>;
}

impl<F, Fut, V, E> ReplayCallable<V> for F
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<V, CallError<E>>> + Send + 'static,
    E: DeclaredFailure,
{
    type Failure = E;

    fn call(self) -> BoxFuture<'static, Result<V, CallError<E>>> {
        self().boxed()
    }
}
