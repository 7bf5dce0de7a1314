//! # Instance event subscribers.
//!
//! A [`Subscribe`] implementation receives every instance lifecycle event of a
//! task (performed, started, enqueued, finished, pruned) without ever running
//! inside the task's critical section. Subscribers are attached with
//! [`TaskBuilder::with_subscribers`](crate::TaskBuilder::with_subscribers) and
//! detached by [`Task::shutdown`](crate::Task::shutdown), which waits for their
//! queues to drain.
//!
//! Delivery goes through a `SubscriberSet`: one bounded queue and one worker per
//! subscriber. A full queue loses the event for that subscriber only and
//! publishes `SubscriberOverflow`; a panic inside `on_event` is caught and
//! published as `SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use tasklane::{Event, EventKind, Subscribe};
//!
//! struct FailureLog;
//!
//! #[async_trait]
//! impl Subscribe for FailureLog {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::InstanceFailed {
//!             eprintln!("{:?} #{:?} failed: {:?}", ev.task, ev.instance, ev.reason);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-log" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Consumer of a task's instance events.
///
/// Events arrive one at a time in publish order. `on_event` runs on the
/// subscriber's own worker, so blocking in it stalls only this subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, never while the task core holds its lock.
    async fn on_event(&self, event: &Event);

    /// Name reported as the `task` of overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Events this subscriber may have queued before new ones are lost (min 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
