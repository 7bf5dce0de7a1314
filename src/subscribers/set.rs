//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes task events to multiple
//! subscribers without ever blocking the task core.
//!
//! ## Architecture
//! ```text
//! Bus ──► listener ──► emit_arc(event)
//!                          │
//!                          ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!                          │    (bounded)         └──────► panic → SubscriberPanicked
//!                          ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!                          └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit_arc()` returns immediately (uses `try_send`)
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Senders shared between the set and its bus listener.
struct Fanout {
    channels: Vec<SubscriberChannel>,
    bus: Bus,
}

impl Fanout {
    fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    fanout: Arc<Fanout>,
    workers: Vec<JoinHandle<()>>,
    listener: Option<(CancellationToken, JoinHandle<()>)>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());

                    let outcome = std::panic::AssertUnwindSafe(fut).catch_unwind().await;
                    // A panic on a subscriber event is not republished, or it would loop.
                    if let Err(panic_err) = outcome {
                        if !ev.is_subscriber_event() {
                            let info = crate::tasks::panic_message(panic_err.as_ref());
                            bus_for_worker.publish(Event::subscriber_panicked(sub.name(), info));
                        }
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            fanout: Arc::new(Fanout { channels, bus }),
            workers,
            listener: None,
        }
    }

    /// Spawns a listener forwarding every event received from `rx` to all subscribers.
    ///
    /// Replaces (and stops) a previously started listener.
    pub fn listen(&mut self, mut rx: broadcast::Receiver<Event>) {
        if let Some((token, _)) = self.listener.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        let stop = token.clone();
        let fanout = Arc::clone(&self.fanout);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => fanout.emit_arc(Arc::new(ev)),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
        });
        self.listener = Some((token, handle));
    }

    /// Gracefully shuts down the listener and all subscriber workers.
    ///
    /// 1. Stops the listener once it has forwarded everything already buffered
    /// 2. Drops all channel senders (workers see channel closed)
    /// 3. Awaits all worker tasks to finish their queues
    pub async fn shutdown(self) {
        if let Some((token, handle)) = self.listener {
            token.cancel();
            let _ = handle.await;
        }
        drop(self.fanout);

        for h in self.workers {
            let _ = h.await;
        }
    }
}
