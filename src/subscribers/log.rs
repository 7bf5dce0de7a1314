//! # LogWriter: event logger
//!
//! A minimal subscriber that writes incoming [`Event`]s through `tracing`.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output
//! ```text
//! INFO  tasklane: performed task="search" instance=7 policy="restartable"
//! DEBUG tasklane: started task="search" instance=7
//! INFO  tasklane: canceled task="search" instance=6
//! WARN  tasklane: failed task="search" instance=7 err="execution failed: timeout"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        let instance = e.instance.unwrap_or_default();

        match e.kind {
            EventKind::InstancePerformed => {
                tracing::info!(target: "tasklane", task, instance, policy = reason, "performed");
            }
            EventKind::InstanceStarted => {
                tracing::debug!(target: "tasklane", task, instance, "started");
            }
            EventKind::InstanceEnqueued => {
                tracing::debug!(target: "tasklane", task, instance, "enqueued");
            }
            EventKind::InstanceDropped => {
                tracing::info!(target: "tasklane", task, instance, "dropped");
            }
            EventKind::InstanceSucceeded => {
                tracing::debug!(target: "tasklane", task, instance, "succeeded");
            }
            EventKind::InstanceFailed => {
                tracing::warn!(target: "tasklane", task, instance, err = reason, "failed");
            }
            EventKind::InstanceCanceled => {
                tracing::info!(target: "tasklane", task, instance, "canceled");
            }
            EventKind::InstancePruned => {
                tracing::trace!(target: "tasklane", task, instance, "pruned");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "tasklane", subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "tasklane", subscriber = task, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
