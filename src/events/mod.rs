//! Task events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskCore` (admission and every transition), `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: `Task::events()` receivers and the `SubscriberSet` listener
//!   spawned by `TaskBuilder::build`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
