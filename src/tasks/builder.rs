use std::sync::Arc;

use crate::config::TaskConfig;
use crate::policies::ConcurrencyPolicy;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::core::TaskCore;
use super::operation::Operation;
use super::task::Task;

/// Builder for a [`Task`] with a policy, retention and optional subscribers.
///
/// ```rust
/// use tasklane::{AbortSignal, ConcurrencyPolicy, Task, TaskError};
///
/// let upload = Task::builder("upload", |_s: AbortSignal, path: String| async move {
///     Ok::<_, TaskError>(path.len())
/// })
/// .enqueuing()
/// .max_concurrency(3)
/// .max_retained(100)
/// .build();
///
/// assert_eq!(upload.policy(), ConcurrencyPolicy::Enqueue { max: 3 });
/// ```
pub struct TaskBuilder<A, T> {
    name: Arc<str>,
    op: Arc<dyn Operation<A, T>>,
    cfg: TaskConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<A, T> TaskBuilder<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(name: Arc<str>, op: Arc<dyn Operation<A, T>>) -> Self {
        Self {
            name,
            op,
            cfg: TaskConfig::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: TaskConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.cfg.policy = policy;
        self
    }

    /// `drop` policy: invocations beyond the ceiling are dropped.
    pub fn dropping(self) -> Self {
        self.with_policy(ConcurrencyPolicy::dropping())
    }

    /// `enqueue` policy: invocations beyond the ceiling wait in FIFO order.
    pub fn enqueuing(self) -> Self {
        self.with_policy(ConcurrencyPolicy::enqueuing())
    }

    /// `restartable` policy: the oldest running instances are cancelled to make room.
    pub fn restartable(self) -> Self {
        self.with_policy(ConcurrencyPolicy::restartable())
    }

    /// `keepLatest` policy: only the newest waiting invocation is kept.
    pub fn keep_latest(self) -> Self {
        self.with_policy(ConcurrencyPolicy::keep_latest())
    }

    /// Sets the ceiling of the current policy (at least 1).
    ///
    /// On an unbounded task this switches to `enqueue`.
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.cfg.policy = self.cfg.policy.with_max_concurrency(max);
        self
    }

    /// Keeps at most `max` finished instances (`0` = unlimited).
    pub fn max_retained(mut self, max: usize) -> Self {
        self.cfg.max_retained = max;
        self
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue. Workers
    /// are spawned by [`build`](Self::build), which then requires a Tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the task.
    pub fn build(self) -> Task<A, T> {
        let core = TaskCore::new(self.name, self.cfg);

        if !self.subscribers.is_empty() {
            let bus = core.bus().clone();
            let mut set = SubscriberSet::new(self.subscribers, bus.clone());
            set.listen(bus.subscribe());
            core.set_subscribers(set);
        }
        Task::from_parts(core, self.op)
    }
}
