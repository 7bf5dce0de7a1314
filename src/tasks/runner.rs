//! # Run the body of one admitted instance.
//!
//! Executes the instance's future to completion on the runtime and converts
//! whatever happened into a single `Result` for the task core.
//!
//! ## Outcome mapping
//! ```text
//! body → Ok(v)                  → Ok(v)                → Successful
//! body → Err(Canceled)          → Err(Canceled)        → Canceled
//! body → Err(e)                 → Err(e)               → Error
//! body panics                   → Err(Panicked{info})  → Error
//! ```
//!
//! ## Rules
//! - The future is created here, on the runtime, never under the core lock.
//! - The body is never aborted: cancellation is cooperative, so a body that
//!   ignores its signal runs to completion and its result is discarded by the core.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::TaskError;

use super::operation::OperationFuture;

/// Deferred body of an instance: creates the future once the instance runs.
pub(crate) type Job<T> = Box<dyn FnOnce() -> OperationFuture<T> + Send>;

/// Runs `job` to completion, catching panics.
pub(crate) async fn run_once<T>(job: Job<T>) -> Result<T, TaskError> {
    AssertUnwindSafe(async move { job().await })
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(TaskError::Panicked {
                info: panic_message(panic.as_ref()),
            })
        })
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
