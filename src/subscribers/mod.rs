//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver task events (see [`Bus`](crate::events::Bus)).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   TaskCore ── publish(Event) ──► Bus ──► SubscriberSet listener
//!                                              │
//!                                         ┌────┴────┬─────────┬───────┐
//!                                         ▼         ▼         ▼       ▼
//!                                     LogWriter  Metrics   Custom    ...
//! ```
//!
//! ## Subscriber wiring
//! Pass subscribers to [`TaskBuilder::with_subscribers`](crate::TaskBuilder::with_subscribers);
//! the builder spawns the workers and the bus listener. [`Task::shutdown`](crate::Task::shutdown)
//! drains and stops them.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
