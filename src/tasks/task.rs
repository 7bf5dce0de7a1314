//! # Task: reusable async operation under a concurrency policy.
//!
//! A [`Task`] bundles an [`Operation`] with a [`ConcurrencyPolicy`] and keeps
//! the history of every instance it produced. It is cheap to clone; clones
//! share the same instances.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tasklane::{AbortSignal, Task, TaskError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let search = Task::builder("search", |signal: AbortSignal, query: String| async move {
//!     signal
//!         .guard(tokio::time::sleep(Duration::from_millis(5)))
//!         .await?;
//!     Ok::<_, TaskError>(format!("results for {query}"))
//! })
//! .restartable()
//! .build();
//!
//! let first = search.perform("ru".into());
//! let second = search.perform("rust".into());
//!
//! assert!(first.is_canceled());
//! assert_eq!(second.settled().await.as_deref(), Ok("results for rust"));
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::TaskConfig;
use crate::events::Event;
use crate::policies::ConcurrencyPolicy;
use crate::views::{InstanceSource, Snapshot};

use super::builder::TaskBuilder;
use super::core::TaskCore;
use super::instance::{InstanceFlag, TaskInstance};
use super::operation::Operation;
use super::runner::Job;

/// Handle to a task definition and its instances.
pub struct Task<A, T> {
    core: Arc<TaskCore<T>>,
    op: Arc<dyn Operation<A, T>>,
}

impl<A, T> Clone for Task<A, T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            op: Arc::clone(&self.op),
        }
    }
}

impl<A, T> Task<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an unbounded task with the default configuration.
    pub fn new<O>(name: impl Into<Arc<str>>, op: O) -> Self
    where
        O: Operation<A, T>,
    {
        Self::builder(name, op).build()
    }

    /// Starts a builder for a task.
    pub fn builder<O>(name: impl Into<Arc<str>>, op: O) -> TaskBuilder<A, T>
    where
        O: Operation<A, T>,
    {
        TaskBuilder::new(name.into(), Arc::new(op))
    }

    pub(crate) fn from_parts(core: Arc<TaskCore<T>>, op: Arc<dyn Operation<A, T>>) -> Self {
        Self { core, op }
    }

    /// Invokes the task.
    ///
    /// Returns the new instance immediately, already admitted: `running`,
    /// `enqueued` or `dropped`. Admission may cancel or drop older instances
    /// as the policy requires. Never fails; body failures are recorded on the
    /// instance.
    ///
    /// Must be called from within a Tokio runtime, like `tokio::spawn`.
    pub fn perform(&self, args: A) -> TaskInstance<T> {
        let op = Arc::clone(&self.op);
        self.core.perform(move |signal| -> Job<T> {
            Box::new(move || op.call(signal, args))
        })
    }

    /// Cancels every running and enqueued instance. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        self.core.cancel_all()
    }

    /// Tears the task down.
    ///
    /// 1. Refuses later invocations (`perform` returns dropped instances)
    /// 2. Cancels every active instance
    /// 3. Drains and stops the subscriber workers
    pub async fn shutdown(&self) {
        self.core.close();
        self.core.cancel_all();
        if let Some(set) = self.core.take_subscribers() {
            set.shutdown().await;
        }
    }

    /// Instances in the given state, in invocation order.
    pub fn select(&self, flag: InstanceFlag) -> Vec<TaskInstance<T>> {
        self.core.snapshot().select(flag)
    }

    /// Every retained instance, in invocation order.
    pub fn instances(&self) -> Vec<TaskInstance<T>> {
        self.core
            .snapshot()
            .entries
            .into_iter()
            .map(|(inst, _)| inst)
            .collect()
    }

    pub fn running_instances(&self) -> Vec<TaskInstance<T>> {
        self.select(InstanceFlag::IsRunning)
    }

    pub fn enqueued_instances(&self) -> Vec<TaskInstance<T>> {
        self.select(InstanceFlag::IsEnqueued)
    }

    /// Running and enqueued instances.
    pub fn active_instances(&self) -> Vec<TaskInstance<T>> {
        self.select(InstanceFlag::IsActive)
    }

    /// `true` when nothing is running or enqueued.
    pub fn is_idle(&self) -> bool {
        self.active_instances().is_empty()
    }

    /// `true` while at least one instance is running.
    pub fn is_running(&self) -> bool {
        !self.running_instances().is_empty()
    }

    /// Most recently performed instance.
    pub fn last(&self) -> Option<TaskInstance<T>> {
        self.instances().pop()
    }

    pub fn last_successful(&self) -> Option<TaskInstance<T>> {
        self.select(InstanceFlag::IsSuccessful).pop()
    }

    pub fn last_errored(&self) -> Option<TaskInstance<T>> {
        self.select(InstanceFlag::IsError).pop()
    }

    pub fn last_canceled(&self) -> Option<TaskInstance<T>> {
        self.select(InstanceFlag::IsCanceled).pop()
    }

    /// Total number of `perform` calls, including pruned and dropped instances.
    pub fn perform_count(&self) -> u64 {
        self.core.performed()
    }

    /// Receiver for this task's events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.core.bus().subscribe()
    }
}

impl<A, T> Task<A, T> {
    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn policy(&self) -> ConcurrencyPolicy {
        self.core.config().policy
    }

    pub fn config(&self) -> &TaskConfig {
        self.core.config()
    }

    /// Changes whenever an instance is added, pruned or changes status.
    pub fn revision(&self) -> u64 {
        self.core.revision()
    }

    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.core.snapshot()
    }
}

impl<A, T> InstanceSource<T> for Task<A, T> {
    fn revision(&self) -> u64 {
        self.core.revision()
    }

    fn snapshot(&self) -> Snapshot<T> {
        self.core.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::events::EventKind;
    use crate::signal::{AbortSignal, Deferred, defer};
    use crate::tasks::InstanceStatus;

    type Gate = Deferred<(), ()>;

    /// Task whose instances block until their gate is resolved.
    fn gated(policy: ConcurrencyPolicy) -> Task<(u32, Gate), u32> {
        Task::builder("gated", |signal: AbortSignal, (n, gate): (u32, Gate)| async move {
            signal
                .guard(gate.promise().settled())
                .await?
                .map_err(|_| TaskError::fail("gate rejected"))?;
            Ok(n)
        })
        .with_policy(policy)
        .build()
    }

    fn statuses<T>(task: &Task<(u32, Gate), T>) -> Vec<InstanceStatus> {
        task.snapshot().entries.iter().map(|(_, s)| *s).collect()
    }

    #[tokio::test]
    async fn unbounded_runs_everything() {
        let task = gated(ConcurrencyPolicy::Unbounded);
        let gates: Vec<Gate> = (0..3).map(|_| defer()).collect();
        for (i, g) in gates.iter().enumerate() {
            task.perform((i as u32, g.clone()));
        }
        assert_eq!(task.running_instances().len(), 3);

        for g in &gates {
            g.resolve(());
        }
        for inst in task.instances() {
            assert!(inst.settled().await.is_ok());
        }
        assert!(task.is_idle());
    }

    #[tokio::test]
    async fn drop_keeps_the_running_instance() {
        let task = gated(ConcurrencyPolicy::dropping());
        let (ga, gb) = (defer(), defer());

        let a = task.perform((1, ga.clone()));
        let b = task.perform((2, gb.clone()));
        assert!(a.is_running());
        assert!(b.is_dropped());
        assert_eq!(b.settled().await, Err(TaskError::Dropped));

        ga.resolve(());
        assert_eq!(a.settled().await, Ok(1));
        assert_eq!(a.value(), Some(1));
    }

    #[tokio::test]
    async fn enqueue_promotes_in_fifo_order() {
        let task = gated(ConcurrencyPolicy::Enqueue { max: 2 });
        let gates: Vec<Gate> = (0..4).map(|_| defer()).collect();
        let insts: Vec<_> = gates
            .iter()
            .enumerate()
            .map(|(i, g)| task.perform((i as u32, g.clone())))
            .collect();

        assert_eq!(
            statuses(&task),
            vec![
                InstanceStatus::Running,
                InstanceStatus::Running,
                InstanceStatus::Enqueued,
                InstanceStatus::Enqueued,
            ]
        );

        gates[1].resolve(());
        insts[1].settled().await.ok();
        assert!(insts[2].is_running());
        assert!(insts[3].is_enqueued());
        assert!(task.running_instances().len() <= 2);

        gates[0].resolve(());
        insts[0].settled().await.ok();
        assert!(insts[3].is_running());
        assert!(insts[2].started_at() <= insts[3].started_at());
    }

    #[tokio::test]
    async fn restartable_cancels_the_oldest() {
        let task = gated(ConcurrencyPolicy::Restartable { max: 2 });
        let gates: Vec<Gate> = (0..3).map(|_| defer()).collect();
        let a = task.perform((0, gates[0].clone()));
        let b = task.perform((1, gates[1].clone()));
        let c = task.perform((2, gates[2].clone()));

        assert!(a.is_canceled());
        assert!(a.signal().is_canceled());
        assert!(b.is_running());
        assert!(c.is_running());
        assert_eq!(a.settled().await, Err(TaskError::Canceled));
    }

    #[tokio::test]
    async fn keep_latest_drops_stale_backlog() {
        let task = gated(ConcurrencyPolicy::keep_latest());
        let gates: Vec<Gate> = (0..4).map(|_| defer()).collect();
        let insts: Vec<_> = gates
            .iter()
            .enumerate()
            .map(|(i, g)| task.perform((i as u32, g.clone())))
            .collect();

        assert!(insts[0].is_running());
        assert!(insts[1].is_dropped());
        assert!(insts[2].is_dropped());
        assert!(insts[3].is_enqueued());

        gates[0].resolve(());
        gates[3].resolve(());
        assert_eq!(insts[0].settled().await, Ok(0));
        assert_eq!(insts[3].settled().await, Ok(3));
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_frees_the_slot() {
        let task = gated(ConcurrencyPolicy::enqueuing());
        let (ga, gb) = (defer(), defer());
        let a = task.perform((1, ga));
        let b = task.perform((2, gb.clone()));

        assert!(a.cancel());
        assert!(!a.cancel());
        assert!(a.is_canceled());
        assert!(b.is_running());

        gb.resolve(());
        assert_eq!(b.settled().await, Ok(2));
        assert!(!a.cancel());
        assert_eq!(a.error(), None);
    }

    #[tokio::test]
    async fn cancelling_an_enqueued_instance_never_runs_it() {
        let task = gated(ConcurrencyPolicy::enqueuing());
        let (ga, gb) = (defer(), defer());
        let a = task.perform((1, ga.clone()));
        let b = task.perform((2, gb.clone()));

        assert!(b.cancel());
        gb.resolve(());
        ga.resolve(());
        a.settled().await.ok();

        assert!(b.is_canceled());
        assert_eq!(b.started_at(), None);
    }

    #[tokio::test]
    async fn errors_and_panics_are_recorded() {
        let task = Task::new("flaky", |_s: AbortSignal, n: u32| async move {
            match n {
                0 => Err(TaskError::fail("zero")),
                1 => panic!("one"),
                _ => Ok(n),
            }
        });

        let zero = task.perform(0);
        let one = task.perform(1);
        assert_eq!(zero.settled().await, Err(TaskError::fail("zero")));
        assert!(zero.is_error());
        assert_eq!(zero.error(), Some(TaskError::fail("zero")));

        assert!(matches!(one.settled().await, Err(TaskError::Panicked { .. })));
        assert!(one.is_error());
        assert_eq!(task.last_errored(), Some(one));
    }

    #[tokio::test]
    async fn body_reporting_cancellation_is_not_an_error() {
        let task = Task::new("self-cancel", |_s: AbortSignal, _: ()| async move {
            Err::<(), _>(TaskError::Canceled)
        });
        let inst = task.perform(());
        assert_eq!(inst.settled().await, Err(TaskError::Canceled));
        assert!(inst.is_canceled());
        assert!(inst.signal().is_canceled());
    }

    #[tokio::test]
    async fn late_result_of_cancelled_body_is_swallowed() {
        let task = Task::new("stubborn", |_s: AbortSignal, gate: Gate| async move {
            let _ = gate.promise().settled().await;
            Err::<u32, _>(TaskError::fail("finished anyway"))
        });
        let gate = defer();
        let inst = task.perform(gate.clone());
        inst.cancel();
        gate.resolve(());
        tokio::task::yield_now().await;

        assert!(inst.is_canceled());
        assert_eq!(inst.error(), None);
    }

    #[tokio::test]
    async fn retention_prunes_only_finished() {
        let task = Task::builder("retained", |_s: AbortSignal, n: u32| async move {
            Ok::<_, TaskError>(n)
        })
        .max_retained(2)
        .build();

        for n in 0..5 {
            task.perform(n).settled().await.ok();
        }
        let kept: Vec<_> = task.instances().iter().filter_map(|i| i.value()).collect();
        assert_eq!(kept, vec![3, 4]);
        assert_eq!(task.perform_count(), 5);
    }

    #[tokio::test]
    async fn retention_keeps_active_instances_and_reports_pruned() {
        let task = Task::builder("bounded", |signal: AbortSignal, (n, gate): (u32, Gate)| async move {
            signal
                .guard(gate.promise().settled())
                .await?
                .map_err(|_| TaskError::fail("gate rejected"))?;
            Ok(n)
        })
        .with_policy(ConcurrencyPolicy::Enqueue { max: 1 })
        .max_retained(1)
        .build();
        let mut rx = task.events();

        let running = task.perform((0, defer()));
        let waiting = task.perform((1, defer()));
        let extras: Vec<_> = (2..6)
            .map(|n| {
                let inst = task.perform((n, defer()));
                assert!(inst.cancel());
                inst
            })
            .collect();

        assert!(running.is_running());
        assert!(waiting.is_enqueued());
        assert_eq!(
            task.instances(),
            vec![running.clone(), waiting.clone(), extras[3].clone()]
        );

        let mut pruned = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::InstancePruned {
                pruned.extend(ev.instance);
            }
        }
        let expected: Vec<_> = extras[..3].iter().map(|i| i.id()).collect();
        assert_eq!(pruned, expected);
        task.cancel_all();
    }

    #[test]
    fn body_stranded_by_runtime_shutdown_fails_and_frees_its_slot() {
        let first = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (task, stranded) = first.block_on(async {
            let task = gated(ConcurrencyPolicy::enqueuing());
            let stranded = task.perform((1, defer()));
            assert!(stranded.is_running());
            (task, stranded)
        });
        drop(first);

        assert!(stranded.is_error());
        assert!(stranded
            .error()
            .map(|e| e.to_string())
            .unwrap_or_default()
            .contains("runtime shut down"));
        assert!(task.is_idle());

        let second = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        second.block_on(async {
            let gate = defer();
            let next = task.perform((2, gate.clone()));
            assert!(next.is_running());
            gate.resolve(());
            assert_eq!(next.settled().await, Ok(2));
        });
    }

    #[tokio::test]
    async fn shutdown_cancels_and_refuses() {
        let task = gated(ConcurrencyPolicy::enqueuing());
        let a = task.perform((1, defer()));
        let b = task.perform((2, defer()));

        task.shutdown().await;
        assert!(a.is_canceled());
        assert!(b.is_canceled());
        assert!(task.perform((3, defer())).is_dropped());
    }

    #[tokio::test]
    async fn last_helpers_track_history() {
        let task = gated(ConcurrencyPolicy::Unbounded);
        assert!(task.last().is_none());

        let g = defer();
        let a = task.perform((1, g.clone()));
        let b = task.perform((2, defer()));
        b.cancel();
        g.resolve(());
        a.settled().await.ok();

        assert_eq!(task.last(), Some(b.clone()));
        assert_eq!(task.last_successful(), Some(a));
        assert_eq!(task.last_canceled(), Some(b));
        assert!(task.last_errored().is_none());
    }
}
