//! # Events emitted by tasks and subscriber workers.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Instance events**: one per admission decision or lifecycle transition
//! - **Subscriber events**: overflow and panic reports from subscriber workers
//!
//! The [`Event`] struct carries metadata such as timestamps, task name,
//! instance id and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use tasklane::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InstanceFailed)
//!     .with_task("search")
//!     .with_instance(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::InstanceFailed);
//! assert_eq!(ev.task.as_deref(), Some("search"));
//! assert_eq!(ev.instance, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Admission events ===
    /// `perform` was called; a new instance exists in `pending`.
    ///
    /// Sets: `task`, `instance`, `reason` (policy label)
    InstancePerformed,

    /// Instance was admitted to `enqueued`.
    ///
    /// Sets: `task`, `instance`
    InstanceEnqueued,

    /// Instance was refused by the policy (`dropped`).
    ///
    /// Sets: `task`, `instance`
    InstanceDropped,

    // === Lifecycle events ===
    /// Instance entered `running` (directly or promoted from the backlog).
    ///
    /// Sets: `task`, `instance`
    InstanceStarted,

    /// Instance body returned a value.
    ///
    /// Sets: `task`, `instance`
    InstanceSucceeded,

    /// Instance body failed or panicked.
    ///
    /// Sets: `task`, `instance`, `reason` (error message)
    InstanceFailed,

    /// Instance was cancelled (explicitly, by eviction, or by its own body).
    ///
    /// Sets: `task`, `instance`
    InstanceCanceled,

    /// Finished instance was evicted from the collection by the retention bound.
    ///
    /// Sets: `task`, `instance`
    InstancePruned,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Instance id, if applicable.
    pub instance: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            instance: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an instance id.
    #[inline]
    pub fn with_instance(mut self, id: u64) -> Self {
        self.instance = Some(id);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// Returns `true` for events emitted by subscriber workers rather than tasks.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::InstancePerformed);
        let b = Event::new(EventKind::InstanceStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn subscriber_helpers() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert!(ev.is_subscriber_event());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
        assert!(!Event::new(EventKind::InstanceDropped).is_subscriber_event());
    }
}
