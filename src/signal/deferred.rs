//! # Manually settled promise (`defer`)
//!
//! [`Deferred`] decouples the construction of an awaitable [`Promise`] from the
//! code that settles it. The task engine uses it to turn "an instance reached a
//! terminal state" (a callback inside a critical section) into something
//! callers can `.await`.
//!
//! ## Rules
//! - **First settlement wins**: after `resolve`/`reject` succeeds once, every
//!   later call returns `false` and changes nothing.
//! - **Many waiters**: a [`Promise`] is cloneable; every clone observes the same
//!   outcome.
//! - **Late waiters**: awaiting an already settled promise completes immediately.
//!
//! ## Example
//! ```rust
//! use tasklane::defer;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let d = defer::<u32, String>();
//! let p = d.promise();
//!
//! assert!(d.resolve(7));
//! assert!(!d.reject("too late".into()));
//! assert_eq!(p.await, Ok(7));
//! # }
//! ```

use std::future::IntoFuture;
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;
use tokio::sync::Notify;

struct Shared<T, E> {
    slot: OnceLock<Result<T, E>>,
    notify: Notify,
}

/// Settling half: hands out [`Promise`]s and settles them exactly once.
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

/// Awaitable half of a [`Deferred`].
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

/// Creates an unsettled [`Deferred`].
pub fn defer<T, E>() -> Deferred<T, E> {
    Deferred::new()
}

impl<T, E> Deferred<T, E> {
    /// Creates an unsettled deferred.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: OnceLock::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Returns a promise observing this deferred.
    pub fn promise(&self) -> Promise<T, E> {
        Promise {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Settles with a value. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with an error. Returns `false` if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Returns `true` once either `resolve` or `reject` succeeded.
    pub fn is_settled(&self) -> bool {
        self.shared.slot.get().is_some()
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let won = self.shared.slot.set(outcome).is_ok();
        if won {
            self.shared.notify.notify_waiters();
        }
        won
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Promise<T, E> {
    /// Returns `true` once the owning deferred has been settled.
    pub fn is_settled(&self) -> bool {
        self.shared.slot.get().is_some()
    }
}

impl<T: Clone, E: Clone> Promise<T, E> {
    /// Returns the outcome without waiting, if already settled.
    pub fn peek(&self) -> Option<Result<T, E>> {
        self.shared.slot.get().cloned()
    }

    /// Waits until the owning deferred is settled and returns a clone of the outcome.
    ///
    /// The waiter is registered before the slot is checked, so a settlement
    /// racing with this call is never missed.
    pub async fn settled(&self) -> Result<T, E> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(outcome) = self.shared.slot.get() {
                return outcome.clone();
            }
            notified.await;
        }
    }
}

impl<T, E> IntoFuture for Promise<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = BoxFuture<'static, Result<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.settled().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_resolve_wins() {
        let d = defer::<&'static str, &'static str>();
        assert!(d.resolve("first"));
        assert!(!d.resolve("second"));
        assert!(!d.reject("late"));
        assert_eq!(d.promise().await, Ok("first"));
    }

    #[tokio::test]
    async fn first_reject_wins() {
        let d = defer::<u8, &'static str>();
        assert!(d.reject("nope"));
        assert!(!d.resolve(1));
        assert_eq!(d.promise().peek(), Some(Err("nope")));
    }

    #[tokio::test]
    async fn all_waiters_observe_the_settlement() {
        let d = defer::<u32, ()>();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let p = d.promise();
                tokio::spawn(async move { p.settled().await })
            })
            .collect();

        tokio::task::yield_now().await;
        assert!(!d.promise().is_settled());
        d.resolve(42);

        for w in waiters {
            assert_eq!(w.await.ok(), Some(Ok(42)));
        }
    }

    #[test]
    fn peek_before_settlement_is_none() {
        let d = defer::<u32, ()>();
        assert_eq!(d.promise().peek(), None);
        assert!(!d.is_settled());
    }
}
