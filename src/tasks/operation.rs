//! # Task body abstraction.
//!
//! [`Operation`] is the async body every instance of a task executes. It
//! receives the instance's [`AbortSignal`] and the arguments passed to
//! [`Task::perform`](crate::Task::perform), and produces a fresh future per call.
//!
//! Closures `Fn(AbortSignal, A) -> impl Future<Output = Result<T, TaskError>>`
//! implement it automatically; implement it by hand for bodies that carry
//! their own state (clients, pools).
//!
//! ## Rules
//! - Each call creates a **new** future owning its own state.
//! - Creating the future must not do work: the future is created on the
//!   runtime once the instance is admitted to `running`, never under a lock.
//!
//! ## Example
//! ```rust
//! use futures::future::BoxFuture;
//! use tasklane::{AbortSignal, Operation, TaskError};
//!
//! struct Lookup {
//!     base: String,
//! }
//!
//! impl Operation<u32, String> for Lookup {
//!     fn call(&self, signal: AbortSignal, id: u32) -> BoxFuture<'static, Result<String, TaskError>> {
//!         let url = format!("{}/{id}", self.base);
//!         Box::pin(async move {
//!             signal.check()?;
//!             Ok(url)
//!         })
//!     }
//! }
//! ```

use std::future::Future;

use futures::future::BoxFuture;

use crate::error::TaskError;
use crate::signal::AbortSignal;

/// Future returned by an [`Operation`].
pub type OperationFuture<T> = BoxFuture<'static, Result<T, TaskError>>;

/// # Asynchronous, cancelable task body.
pub trait Operation<A, T>: Send + Sync + 'static {
    /// Creates the future for one instance.
    fn call(&self, signal: AbortSignal, args: A) -> OperationFuture<T>;
}

impl<A, T, F, Fut> Operation<A, T> for F
where
    F: Fn(AbortSignal, A) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    fn call(&self, signal: AbortSignal, args: A) -> OperationFuture<T> {
        Box::pin((self)(signal, args))
    }
}
