//! # Cooperative cancellation signal
//!
//! Every [`TaskInstance`](crate::TaskInstance) owns exactly one [`AbortSignal`]
//! and hands a clone of it to the task body. The body decides where it is safe
//! to stop:
//!
//! ```text
//! instance.cancel() ──► signal.cancel() ──► is_canceled() == true
//!                                       └─► cancelled().await completes
//!                                       └─► guard(fut) yields Err(Canceled)
//!                                       └─► token() children are cancelled
//! ```
//!
//! ## Rules
//! - Only the owning instance can cancel the signal; bodies only observe it.
//! - Cancellation is sticky and idempotent.
//! - The runtime never aborts a body; a body that ignores the signal runs on.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Read-only view of an instance's cancellation state.
///
/// Thin wrapper over [`CancellationToken`]; clones share the same state.
///
/// # Example
/// ```rust
/// use tasklane::{AbortSignal, TaskError};
///
/// async fn fetch(signal: AbortSignal) -> Result<String, TaskError> {
///     signal.check()?;
///     let body = signal
///         .guard(async { "payload".to_string() })
///         .await?;
///     Ok(body)
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Returns `true` once the owning instance has been cancelled.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns `Err(TaskError::Canceled)` if cancellation was requested.
    ///
    /// Meant for `?` at suspension points inside a task body.
    #[inline]
    pub fn check(&self) -> Result<(), TaskError> {
        if self.is_canceled() {
            Err(TaskError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Future that completes once cancellation is requested.
    ///
    /// Owned, so it can be stored or moved into a `select!` arm freely.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        self.token.clone().cancelled_owned()
    }

    /// Races `fut` against the signal.
    ///
    /// Returns `Err(TaskError::Canceled)` if the signal fires first; `fut` is
    /// dropped at that point. An already cancelled signal wins without polling `fut`.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, TaskError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Canceled),
            out = fut => Ok(out),
        }
    }

    /// Returns a token that is cancelled exactly when this signal is.
    ///
    /// Use it to bridge into clients that accept a [`CancellationToken`].
    /// Cancelling the returned token does **not** cancel the instance.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Requests cancellation. Returns `false` if it was already requested.
    pub(crate) fn cancel(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.token.cancel();
        true
    }
}
