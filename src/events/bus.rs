//! # Instance event bus.
//!
//! Every status change of a task instance is published here by `TaskCore`
//! while it still holds its state lock, so receivers observe the events of
//! one task in the same order the transitions were applied.
//!
//! ```text
//! TaskCore::transition / admit / prune  (lock held)
//!   └─► Bus::publish ──► broadcast ring buffer
//!                           ├──► Task::events() receivers
//!                           └──► SubscriberSet listener ──► per-subscriber queues
//! SubscriberSet workers (overflow, panic) ──► Bus::publish
//! ```
//!
//! ## Rules
//! - `publish()` must stay callable under the core's lock: it never awaits,
//!   never blocks and never runs subscriber code.
//! - The ring buffer holds `TaskConfig::bus_capacity` events; receivers that
//!   fall further behind get `RecvError::Lagged` and resume at the oldest kept event.
//! - Events published while nobody is subscribed are discarded.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel shared by a task and its subscriber set.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding at most `capacity` undelivered events (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Hands `ev` to every current receiver without waiting.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn publish_without_receivers_is_discarded() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::InstancePerformed).with_instance(1));

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn receivers_see_publish_order_and_lag_past_capacity() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for id in 1..=3 {
            bus.publish(Event::new(EventKind::InstanceStarted).with_instance(id));
        }

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert_eq!(rx.try_recv().map(|ev| ev.instance).ok(), Some(Some(2)));
        assert_eq!(rx.try_recv().map(|ev| ev.instance).ok(), Some(Some(3)));
    }
}
