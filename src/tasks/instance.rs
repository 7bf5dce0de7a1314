//! # Task instance: one invocation of a task.
//!
//! A [`TaskInstance`] is returned synchronously by [`Task::perform`](crate::Task::perform)
//! and stays valid after it finishes (or after it is pruned from the task).
//!
//! ## State machine
//! ```text
//!            ┌──► Running ──┬──► Successful
//!            │      ▲       ├──► Error
//! Pending ───┤      │       └──► Canceled
//!            ├──► Enqueued ─┬──► Dropped
//!            │              └──► Canceled
//!            └──► Dropped
//! ```
//!
//! ## Rules
//! - Transitions are one-way; a finished instance never changes again.
//! - `value` is set only on `Successful`, `error` only on `Error`.
//! - Transitions are applied only by the owning task core, under its lock.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::SystemTime;

use crate::error::TaskError;
use crate::signal::{AbortSignal, Deferred, Promise};

use super::core::TaskCore;

/// Lifecycle status of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceStatus {
    /// Created, admission not decided yet (never observable after `perform` returns).
    Pending,
    /// Body is executing.
    Running,
    /// Waiting for a free slot.
    Enqueued,
    /// Body returned a value.
    Successful,
    /// Body failed or panicked.
    Error,
    /// Cancelled while running or enqueued.
    Canceled,
    /// Refused by the concurrency policy; never ran.
    Dropped,
}

impl InstanceStatus {
    /// `Running` or `Enqueued`.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, InstanceStatus::Running | InstanceStatus::Enqueued)
    }

    /// Terminal state (`Successful`, `Error`, `Canceled` or `Dropped`).
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            InstanceStatus::Successful
                | InstanceStatus::Error
                | InstanceStatus::Canceled
                | InstanceStatus::Dropped
        )
    }

    /// Returns `true` if the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: InstanceStatus) -> bool {
        use InstanceStatus::*;
        matches!(
            (self, next),
            (Pending, Running | Enqueued | Dropped)
                | (Running, Successful | Error | Canceled)
                | (Enqueued, Running | Dropped | Canceled)
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/tables.
    pub fn as_label(self) -> &'static str {
        match self {
            InstanceStatus::Pending => "pending",
            InstanceStatus::Running => "running",
            InstanceStatus::Enqueued => "enqueued",
            InstanceStatus::Successful => "successful",
            InstanceStatus::Error => "error",
            InstanceStatus::Canceled => "canceled",
            InstanceStatus::Dropped => "dropped",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Boolean field of an instance, used to key derived views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceFlag {
    IsRunning,
    IsEnqueued,
    IsSuccessful,
    IsError,
    IsCanceled,
    IsDropped,
    /// Running or enqueued.
    IsActive,
    /// Any terminal state.
    IsFinished,
}

impl InstanceFlag {
    /// Evaluates the flag for a status.
    pub fn matches(self, status: InstanceStatus) -> bool {
        match self {
            InstanceFlag::IsRunning => status == InstanceStatus::Running,
            InstanceFlag::IsEnqueued => status == InstanceStatus::Enqueued,
            InstanceFlag::IsSuccessful => status == InstanceStatus::Successful,
            InstanceFlag::IsError => status == InstanceStatus::Error,
            InstanceFlag::IsCanceled => status == InstanceStatus::Canceled,
            InstanceFlag::IsDropped => status == InstanceStatus::Dropped,
            InstanceFlag::IsActive => status.is_active(),
            InstanceFlag::IsFinished => status.is_finished(),
        }
    }
}

/// Requested lifecycle change, applied by the task core.
pub(crate) enum Transition<T> {
    Start,
    Enqueue,
    Succeed(T),
    Fail(TaskError),
    Cancel,
    Drop,
}

impl<T> Transition<T> {
    fn target(&self) -> InstanceStatus {
        match self {
            Transition::Start => InstanceStatus::Running,
            Transition::Enqueue => InstanceStatus::Enqueued,
            Transition::Succeed(_) => InstanceStatus::Successful,
            Transition::Fail(_) => InstanceStatus::Error,
            Transition::Cancel => InstanceStatus::Canceled,
            Transition::Drop => InstanceStatus::Dropped,
        }
    }
}

/// Mutable part of an instance.
struct Record<T> {
    status: InstanceStatus,
    value: Option<T>,
    error: Option<TaskError>,
    started_at: Option<SystemTime>,
    finished_at: Option<SystemTime>,
}

struct Inner<T> {
    id: u64,
    task: Arc<str>,
    performed_at: SystemTime,
    signal: AbortSignal,
    record: Mutex<Record<T>>,
    done: Deferred<T, TaskError>,
    core: Weak<TaskCore<T>>,
}

/// Handle to one invocation of a task. Cheap to clone; clones share state.
pub struct TaskInstance<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for TaskInstance<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for TaskInstance<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for TaskInstance<T> {}

impl<T> fmt::Debug for TaskInstance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskInstance")
            .field("task", &self.inner.task)
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .finish()
    }
}

impl<T> TaskInstance<T> {
    pub(crate) fn new(id: u64, task: Arc<str>, core: Weak<TaskCore<T>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                task,
                performed_at: SystemTime::now(),
                signal: AbortSignal::new(),
                record: Mutex::new(Record {
                    status: InstanceStatus::Pending,
                    value: None,
                    error: None,
                    started_at: None,
                    finished_at: None,
                }),
                done: Deferred::new(),
                core,
            }),
        }
    }

    fn record(&self) -> MutexGuard<'_, Record<T>> {
        self.inner
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Process-unique id, increasing in invocation order.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Name of the task this instance belongs to.
    #[inline]
    pub fn task_name(&self) -> &str {
        &self.inner.task
    }

    /// Current lifecycle status.
    pub fn status(&self) -> InstanceStatus {
        self.record().status
    }

    /// Evaluates a boolean field of this instance.
    pub fn flag(&self, flag: InstanceFlag) -> bool {
        flag.matches(self.status())
    }

    pub fn is_running(&self) -> bool {
        self.status() == InstanceStatus::Running
    }

    pub fn is_enqueued(&self) -> bool {
        self.status() == InstanceStatus::Enqueued
    }

    pub fn is_successful(&self) -> bool {
        self.status() == InstanceStatus::Successful
    }

    pub fn is_error(&self) -> bool {
        self.status() == InstanceStatus::Error
    }

    pub fn is_canceled(&self) -> bool {
        self.status() == InstanceStatus::Canceled
    }

    pub fn is_dropped(&self) -> bool {
        self.status() == InstanceStatus::Dropped
    }

    /// Running or enqueued.
    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.status().is_finished()
    }

    /// Error recorded on transition to `Error`.
    pub fn error(&self) -> Option<TaskError> {
        self.record().error.clone()
    }

    /// The cancellation signal handed to the body.
    #[inline]
    pub fn signal(&self) -> &AbortSignal {
        &self.inner.signal
    }

    /// When `perform` created this instance.
    #[inline]
    pub fn performed_at(&self) -> SystemTime {
        self.inner.performed_at
    }

    /// When the instance entered `Running`, if it did.
    pub fn started_at(&self) -> Option<SystemTime> {
        self.record().started_at
    }

    /// When the instance reached a terminal state.
    pub fn finished_at(&self) -> Option<SystemTime> {
        self.record().finished_at
    }

    /// Applies a transition if the lifecycle allows it.
    ///
    /// Only the task core calls this, with its own lock held. Returns the new
    /// status on success.
    pub(crate) fn apply(&self, transition: Transition<T>) -> Option<InstanceStatus> {
        let next = transition.target();
        let mut rec = self.record();
        if !rec.status.can_transition_to(next) {
            return None;
        }

        let now = SystemTime::now();
        match transition {
            Transition::Start => rec.started_at = Some(now),
            Transition::Succeed(value) => rec.value = Some(value),
            Transition::Fail(error) => rec.error = Some(error),
            Transition::Cancel => {
                self.inner.signal.cancel();
            }
            Transition::Enqueue | Transition::Drop => {}
        }
        if next.is_finished() {
            rec.finished_at = Some(now);
        }
        rec.status = next;
        Some(next)
    }

    /// Cancels an instance whose task is going away, releasing its waiters.
    pub(crate) fn abandon(&self) {
        if self.apply(Transition::Cancel).is_some() {
            self.inner.done.reject(TaskError::Canceled);
        }
    }
}

impl<T> TaskInstance<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Cancels the instance if it is running or enqueued.
    ///
    /// Marks it `Canceled`, fires its [`AbortSignal`], frees its slot and lets
    /// the task promote the next enqueued instance. Returns `false` (and does
    /// nothing) when the instance is already finished.
    pub fn cancel(&self) -> bool {
        match self.inner.core.upgrade() {
            Some(core) => core.cancel(self),
            None => false,
        }
    }
}

impl<T: Clone> TaskInstance<T> {
    /// Value recorded on transition to `Successful`.
    pub fn value(&self) -> Option<T> {
        self.record().value.clone()
    }

    /// Promise settled when the instance finishes.
    ///
    /// `Successful` resolves with the value; every other terminal state rejects
    /// (`Canceled` → [`TaskError::Canceled`], `Dropped` → [`TaskError::Dropped`]).
    pub fn promise(&self) -> Promise<T, TaskError> {
        self.inner.done.promise()
    }

    /// Waits for the instance to finish. See [`TaskInstance::promise`].
    pub async fn settled(&self) -> Result<T, TaskError> {
        self.inner.done.promise().settled().await
    }

    /// Settles the completion promise from the terminal record. No-op otherwise.
    pub(crate) fn settle(&self) {
        let outcome = {
            let rec = self.record();
            match rec.status {
                InstanceStatus::Successful => match &rec.value {
                    Some(v) => Ok(v.clone()),
                    None => return,
                },
                InstanceStatus::Error => Err(rec
                    .error
                    .clone()
                    .unwrap_or_else(|| TaskError::fail("unknown error"))),
                InstanceStatus::Canceled => Err(TaskError::Canceled),
                InstanceStatus::Dropped => Err(TaskError::Dropped),
                _ => return,
            }
        };
        match outcome {
            Ok(v) => self.inner.done.resolve(v),
            Err(e) => self.inner.done.reject(e),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(id: u64) -> TaskInstance<u32> {
        TaskInstance::new(id, Arc::from("t"), Weak::new())
    }

    #[test]
    fn lifecycle_is_one_way() {
        use InstanceStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Enqueued.can_transition_to(Running));
        assert!(!Running.can_transition_to(Enqueued));
        assert!(!Successful.can_transition_to(Canceled));
        assert!(!Dropped.can_transition_to(Running));
        assert!(!Running.can_transition_to(Dropped));
    }

    #[test]
    fn flags_follow_status() {
        let inst = detached(1);
        assert_eq!(inst.status(), InstanceStatus::Pending);
        assert!(!inst.is_active());

        inst.apply(Transition::Start);
        assert!(inst.is_running());
        assert!(inst.flag(InstanceFlag::IsActive));
        assert!(inst.started_at().is_some());

        inst.apply(Transition::Succeed(9));
        assert!(inst.is_successful());
        assert!(inst.flag(InstanceFlag::IsFinished));
        assert_eq!(inst.value(), Some(9));
        assert_eq!(inst.error(), None);
    }

    #[test]
    fn cancel_transition_fires_signal_once() {
        let inst = detached(2);
        inst.apply(Transition::Enqueue);
        assert_eq!(inst.apply(Transition::Cancel), Some(InstanceStatus::Canceled));
        assert!(inst.signal().is_canceled());
        assert_eq!(inst.apply(Transition::Cancel), None);
        assert_eq!(inst.apply(Transition::Start), None);
    }

    #[test]
    fn cancel_without_task_is_noop() {
        let inst = detached(3);
        assert!(!inst.cancel());
    }

    #[tokio::test]
    async fn settle_rejects_dropped() {
        let inst = detached(4);
        inst.apply(Transition::Drop);
        inst.settle();
        assert_eq!(inst.settled().await, Err(TaskError::Dropped));
    }
}
