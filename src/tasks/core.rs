//! # TaskCore: instance collection and admission engine.
//!
//! Owns every instance of one task and is the only place their status changes.
//!
//! ## Architecture
//! ```text
//! Task::perform(args)
//!   └─► TaskCore::perform
//!         ├─► lock state
//!         ├─► push instance (Pending), publish InstancePerformed
//!         ├─► admission::decide(policy, running, enqueued)
//!         │     ├─ Run            ─► start (Running, queue launch)
//!         │     ├─ Enqueue        ─► park job in backlog
//!         │     ├─ Drop           ─► Dropped
//!         │     ├─ Restart{n}     ─► cancel n oldest running, start
//!         │     └─ ReplaceBacklog ─► drop backlog, park job
//!         ├─► promote backlog while slots are free
//!         ├─► prune finished instances beyond retention
//!         ├─► unlock
//!         └─► launch: spawn run_once(job) ─► Completion::finish ─► complete
//!
//! complete / cancel
//!   └─► lock ─► transition ─► promote backlog (FIFO) ─► prune ─► unlock ─► launch
//! ```
//!
//! ## Rules
//! - One `std::sync::Mutex` guards the collection; it is never held across `.await`
//!   and no user code (bodies, subscribers) runs while it is held.
//! - Nothing is spawned while the lock is held: starts are queued in
//!   `State::launches` and spawned after unlocking.
//! - Every change takes a fresh revision from a process-wide counter and
//!   publishes one event. Revisions never repeat, not even across tasks.
//! - Promotion happens in the same critical section that freed the slot.
//! - A spawned body dropped before it finished (its runtime shut down) still
//!   completes its instance, as `Error`, and frees its slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;

use crate::config::TaskConfig;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::admission::{self, Admission};
use crate::signal::AbortSignal;
use crate::subscribers::SubscriberSet;
use crate::views::Snapshot;

use super::instance::{InstanceStatus, TaskInstance, Transition};
use super::runner::{Job, run_once};

/// Global instance id counter.
static INSTANCE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Global revision counter, shared by every task.
static REVISION_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    REVISION_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Admitted body waiting to be spawned once the lock is released.
struct Launch<T> {
    instance: TaskInstance<T>,
    job: Job<T>,
    handle: Handle,
}

struct State<T> {
    instances: Vec<TaskInstance<T>>,
    /// Bodies of enqueued instances, keyed by instance id.
    backlog: HashMap<u64, Job<T>>,
    launches: Vec<Launch<T>>,
    revision: u64,
    performed: u64,
    closed: bool,
}

impl<T> State<T> {
    /// Returns `(running, enqueued)` counts.
    fn load(&self) -> (usize, usize) {
        self.instances
            .iter()
            .fold((0, 0), |(running, enqueued), inst| match inst.status() {
                InstanceStatus::Running => (running + 1, enqueued),
                InstanceStatus::Enqueued => (running, enqueued + 1),
                _ => (running, enqueued),
            })
    }

    fn with_status(&self, status: InstanceStatus) -> Vec<TaskInstance<T>> {
        self.instances
            .iter()
            .filter(|inst| inst.status() == status)
            .cloned()
            .collect()
    }

    fn bump(&mut self) {
        self.revision = next_revision();
    }
}

pub(crate) struct TaskCore<T> {
    name: Arc<str>,
    config: TaskConfig,
    bus: Bus,
    /// Last runtime `perform` was called from.
    runtime: Mutex<Option<Handle>>,
    state: Mutex<State<T>>,
    subscribers: Mutex<Option<SubscriberSet>>,
}

impl<T> TaskCore<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    pub(crate) fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub(crate) fn performed(&self) -> u64 {
        self.lock().performed
    }

    /// Consistent copy of the collection with each instance's status.
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        let st = self.lock();
        Snapshot {
            revision: st.revision,
            entries: st
                .instances
                .iter()
                .map(|inst| (inst.clone(), inst.status()))
                .collect(),
        }
    }

    pub(crate) fn set_subscribers(&self, set: SubscriberSet) {
        let mut slot = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(set);
    }

    pub(crate) fn take_subscribers(&self) -> Option<SubscriberSet> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn remember_runtime(&self) {
        if let Ok(handle) = Handle::try_current() {
            *self.runtime.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        }
    }

    /// The caller's runtime, else the last one `perform` was called from.
    fn runtime(&self) -> Option<Handle> {
        Handle::try_current().ok().or_else(|| {
            self.runtime
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }
}

impl<T> TaskCore<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(name: Arc<str>, config: TaskConfig) -> Arc<Self> {
        let bus = Bus::new(config.bus_capacity_clamped());
        let core = Arc::new(Self {
            name,
            config,
            bus,
            runtime: Mutex::new(None),
            state: Mutex::new(State {
                instances: Vec::new(),
                backlog: HashMap::new(),
                launches: Vec::new(),
                revision: next_revision(),
                performed: 0,
                closed: false,
            }),
            subscribers: Mutex::new(None),
        });
        core.remember_runtime();
        core
    }

    /// Creates an instance and admits it under the configured policy.
    ///
    /// `make_job` receives the instance's signal and must only capture it;
    /// the returned job is invoked later on the runtime.
    pub(crate) fn perform<F>(self: &Arc<Self>, make_job: F) -> TaskInstance<T>
    where
        F: FnOnce(AbortSignal) -> Job<T>,
    {
        self.remember_runtime();

        let id = INSTANCE_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
        let instance = TaskInstance::new(id, Arc::clone(&self.name), Arc::downgrade(self));
        let job = make_job(instance.signal().clone());

        let launches = {
            let mut st = self.lock();
            self.admit(&mut st, &instance, job);
            self.promote(&mut st);
            self.prune(&mut st);
            std::mem::take(&mut st.launches)
        };
        self.launch(launches);
        instance
    }

    fn admit(&self, st: &mut State<T>, instance: &TaskInstance<T>, job: Job<T>) {
        st.instances.push(instance.clone());
        st.performed += 1;
        st.bump();
        self.bus.publish(
            Event::new(EventKind::InstancePerformed)
                .with_task(Arc::clone(&self.name))
                .with_instance(instance.id())
                .with_reason(self.config.policy.as_label()),
        );

        if st.closed {
            self.transition(st, instance, Transition::Drop);
            return;
        }

        let (running, enqueued) = st.load();
        match admission::decide(self.config.policy, running, enqueued) {
            Admission::Run => self.start(st, instance, job),
            Admission::Enqueue => self.enqueue(st, instance, job),
            Admission::Drop => {
                self.transition(st, instance, Transition::Drop);
            }
            Admission::Restart { evict } => {
                let victims: Vec<_> = st
                    .with_status(InstanceStatus::Running)
                    .into_iter()
                    .take(evict)
                    .collect();
                for victim in &victims {
                    self.cancel_locked(st, victim);
                }
                self.start(st, instance, job);
            }
            Admission::ReplaceBacklog => {
                for stale in st.with_status(InstanceStatus::Enqueued) {
                    if self.transition(st, &stale, Transition::Drop) {
                        st.backlog.remove(&stale.id());
                    }
                }
                self.enqueue(st, instance, job);
            }
        }
    }

    fn enqueue(&self, st: &mut State<T>, instance: &TaskInstance<T>, job: Job<T>) {
        if self.transition(st, instance, Transition::Enqueue) {
            st.backlog.insert(instance.id(), job);
        }
    }

    /// Moves `instance` to `Running` and queues its body for launch.
    fn start(&self, st: &mut State<T>, instance: &TaskInstance<T>, job: Job<T>) {
        let Some(handle) = self.runtime() else {
            // Without a runtime the body can never run; record it instead of panicking.
            if self.transition(st, instance, Transition::Start) {
                self.transition(
                    st,
                    instance,
                    Transition::Fail(TaskError::fail("no Tokio runtime available")),
                );
            }
            return;
        };
        if self.transition(st, instance, Transition::Start) {
            st.launches.push(Launch {
                instance: instance.clone(),
                job,
                handle,
            });
        }
    }

    /// Spawns queued bodies. Called without the state lock held.
    fn launch(self: &Arc<Self>, launches: Vec<Launch<T>>) {
        for Launch {
            instance,
            job,
            handle,
        } in launches
        {
            let completion = Completion::new(Arc::clone(self), instance);
            handle.spawn(async move {
                let result = run_once(job).await;
                completion.finish(result);
            });
        }
    }

    /// Records the body's result unless the instance was already cancelled.
    fn complete(self: &Arc<Self>, instance: &TaskInstance<T>, result: Result<T, TaskError>) {
        let transition = match result {
            Ok(value) => Transition::Succeed(value),
            Err(TaskError::Canceled) => Transition::Cancel,
            Err(err) => Transition::Fail(err),
        };
        let launches = {
            let mut st = self.lock();
            if self.transition(&mut st, instance, transition) {
                self.promote(&mut st);
                self.prune(&mut st);
            }
            std::mem::take(&mut st.launches)
        };
        self.launch(launches);
    }

    /// Cancels one instance and promotes the backlog.
    pub(crate) fn cancel(self: &Arc<Self>, instance: &TaskInstance<T>) -> bool {
        let (canceled, launches) = {
            let mut st = self.lock();
            let canceled = self.cancel_locked(&mut st, instance);
            if canceled {
                self.promote(&mut st);
                self.prune(&mut st);
            }
            (canceled, std::mem::take(&mut st.launches))
        };
        self.launch(launches);
        canceled
    }

    /// Cancels every active instance. Returns how many were cancelled.
    pub(crate) fn cancel_all(&self) -> usize {
        let mut st = self.lock();
        let active: Vec<_> = st
            .instances
            .iter()
            .filter(|inst| inst.is_active())
            .cloned()
            .collect();
        let mut canceled = 0;
        for inst in &active {
            if self.cancel_locked(&mut st, inst) {
                canceled += 1;
            }
        }
        self.prune(&mut st);
        canceled
    }

    /// Refuses every future `perform`; new instances are dropped on arrival.
    pub(crate) fn close(&self) {
        self.lock().closed = true;
    }

    fn cancel_locked(&self, st: &mut State<T>, instance: &TaskInstance<T>) -> bool {
        if !self.transition(st, instance, Transition::Cancel) {
            return false;
        }
        st.backlog.remove(&instance.id());
        true
    }

    /// Starts enqueued instances in FIFO order while slots are free.
    fn promote(&self, st: &mut State<T>) {
        let Some(max) = self.config.policy.max_concurrency() else {
            return;
        };
        loop {
            let (running, _) = st.load();
            if running >= max {
                break;
            }
            let Some(next) = st
                .instances
                .iter()
                .find(|inst| inst.status() == InstanceStatus::Enqueued)
                .cloned()
            else {
                break;
            };
            match st.backlog.remove(&next.id()) {
                Some(job) => self.start(st, &next, job),
                None => {
                    self.transition(st, &next, Transition::Drop);
                }
            }
        }
    }

    /// Evicts the oldest finished instances beyond the retention bound.
    fn prune(&self, st: &mut State<T>) {
        let Some(limit) = self.config.retention_limit() else {
            return;
        };
        let finished = st.instances.iter().filter(|i| i.is_finished()).count();
        if finished <= limit {
            return;
        }

        let mut excess = finished - limit;
        let mut pruned = Vec::with_capacity(excess);
        st.instances.retain(|inst| {
            if excess > 0 && inst.is_finished() {
                excess -= 1;
                pruned.push(inst.id());
                false
            } else {
                true
            }
        });
        st.bump();

        for id in pruned {
            self.bus.publish(
                Event::new(EventKind::InstancePruned)
                    .with_task(Arc::clone(&self.name))
                    .with_instance(id),
            );
        }
    }

    /// Applies one transition, then publishes and settles. Returns `false` if refused.
    fn transition(
        &self,
        st: &mut State<T>,
        instance: &TaskInstance<T>,
        transition: Transition<T>,
    ) -> bool {
        let Some(status) = instance.apply(transition) else {
            return false;
        };
        st.bump();

        let mut ev = Event::new(event_kind(status))
            .with_task(Arc::clone(&self.name))
            .with_instance(instance.id());
        if let Some(err) = instance.error() {
            ev = ev.with_reason(err.to_string());
        }
        self.bus.publish(ev);

        instance.settle();
        true
    }
}

/// Completes a spawned instance exactly once.
///
/// Lives inside the spawned future. If that future is dropped before
/// `finish` (its runtime shut down), the instance fails and frees its slot.
struct Completion<T>
where
    T: Clone + Send + Sync + 'static,
{
    core: Arc<TaskCore<T>>,
    instance: TaskInstance<T>,
    finished: bool,
}

impl<T> Completion<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(core: Arc<TaskCore<T>>, instance: TaskInstance<T>) -> Self {
        Self {
            core,
            instance,
            finished: false,
        }
    }

    fn finish(mut self, result: Result<T, TaskError>) {
        self.finished = true;
        self.core.complete(&self.instance, result);
    }
}

impl<T> Drop for Completion<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.finished {
            self.core.complete(
                &self.instance,
                Err(TaskError::fail("runtime shut down before the body finished")),
            );
        }
    }
}

impl<T> Drop for TaskCore<T> {
    /// Instances still active when the last handle goes away can never run
    /// or finish; cancel them so their waiters are released.
    fn drop(&mut self) {
        let st = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        st.backlog.clear();
        for inst in &st.instances {
            inst.abandon();
        }
    }
}

fn event_kind(status: InstanceStatus) -> EventKind {
    match status {
        InstanceStatus::Pending => EventKind::InstancePerformed,
        InstanceStatus::Running => EventKind::InstanceStarted,
        InstanceStatus::Enqueued => EventKind::InstanceEnqueued,
        InstanceStatus::Successful => EventKind::InstanceSucceeded,
        InstanceStatus::Error => EventKind::InstanceFailed,
        InstanceStatus::Canceled => EventKind::InstanceCanceled,
        InstanceStatus::Dropped => EventKind::InstanceDropped,
    }
}
