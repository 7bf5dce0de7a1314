//! # tasklane
//!
//! **Tasklane** runs cancelable async operations as tasks with a concurrency
//! policy. Every invocation of a task becomes an observable instance; the
//! policy decides whether it runs, waits, is dropped, or pushes an older
//! instance out.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   perform(args)     perform(args)     perform(args)
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Task (handle, cheap to clone)                                    │
//! │  - Operation (async body: Fn(AbortSignal, A) -> Future)           │
//! │  - TaskCore  (instances, backlog, revision, admission)            │
//! │  - Bus       (broadcast events)                                   │
//! │  - SubscriberSet (optional, per-subscriber queues)                │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//!  │TaskInstance │   │TaskInstance │   │TaskInstance │         │
//!  │  running    │   │  enqueued   │   │  dropped    │         │
//!  │ AbortSignal │   │ AbortSignal │   │ AbortSignal │         │
//!  └─────┬───────┘   └─────────────┘   └─────────────┘         │
//!        │ spawned on the Tokio runtime                        │
//!        ▼                                                     │
//!   run_once(job) ──► complete ──► promote backlog ──► prune   │
//!                                                              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                  Bus (broadcast channel)                          │
//! │              (capacity: TaskConfig::bus_capacity)                 │
//! └──────────┬──────────────────────────────────┬─────────────────────┘
//!            ▼                                  ▼
//!     Task::events()                    SubscriberSet listener
//!     receivers                     ┌─────────┼─────────┐
//!                                   ▼         ▼         ▼
//!                                worker1   worker2   workerN
//! ```
//!
//! ### Instance lifecycle
//! ```text
//! pending ──► running ──► successful | error | canceled
//!    ├──────► enqueued ──► running | canceled | dropped
//!    └──────► dropped
//! ```
//!
//! Derived views ([`views`]) read the task through revision-keyed snapshots and
//! recompute only after the task changed.
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Define tasks from closures, perform and inspect instances.  | [`Task`], [`TaskInstance`], [`Operation`]   |
//! | **Policies**      | Concurrency ceilings and what happens beyond them.          | [`ConcurrencyPolicy`]                       |
//! | **Cancellation**  | Cooperative cancellation of a single instance.              | [`AbortSignal`]                             |
//! | **Promises**      | Externally settled one-shot values.                         | [`Deferred`], [`Promise`], [`defer`]        |
//! | **Views**         | Memoized filters and aggregates over a task's instances.    | [`views::filtered_instances`], [`Computed`] |
//! | **Subscriber API**| Hook into instance lifecycle events.                        | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed instance errors.                                      | [`TaskError`]                               |
//! | **Configuration** | Policy, retention and bus settings.                         | [`TaskConfig`], [`TaskBuilder`]             |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber that writes events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tasklane::{AbortSignal, Task, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), TaskError> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn tasklane::Subscribe>> = vec![Arc::new(tasklane::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn tasklane::Subscribe>> = Vec::new();
//!
//!     let save = Task::builder("save", |signal: AbortSignal, doc: String| async move {
//!         signal.check()?;
//!         Ok::<_, TaskError>(doc.len())
//!     })
//!     .dropping()
//!     .with_subscribers(subs)
//!     .build();
//!
//!     let first = save.perform("draft".into());
//!     let second = save.perform("draft v2".into());
//!     assert!(second.is_dropped());
//!
//!     assert_eq!(first.settled().await?, 5);
//!     save.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod policies;
mod signal;
mod subscribers;
mod tasks;
pub mod views;

// ---- Public re-exports ----

pub use config::TaskConfig;
pub use error::TaskError;
pub use events::{Bus, Event, EventKind};
pub use policies::ConcurrencyPolicy;
pub use signal::{AbortSignal, Deferred, Promise, defer};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    InstanceFlag, InstanceStatus, Operation, OperationFuture, TableRow, Task, TaskBuilder,
    TaskInstance, TaskTable,
};
pub use views::{Computed, InstanceSource};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
