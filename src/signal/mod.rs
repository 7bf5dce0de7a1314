//! Cancellation and settlement primitives.
//!
//! ## Contents
//! - [`AbortSignal`] cooperative cancellation token owned by one instance
//! - [`Deferred`], [`Promise`], [`defer`] manually settled, settle-once promise

mod abort;
mod deferred;

pub use abort::AbortSignal;
pub use deferred::{Deferred, Promise, defer};
