//! # Filtered and aggregate views over a task.
//!
//! ```text
//! accessor() ─► InstanceSource ─► snapshot().select(flag) ─► Computed<Vec<TaskInstance>>
//!                                                                 ├─► computed_length
//!                                                                 ├─► computed_first_of
//!                                                                 └─► computed_last_of
//! ```
//!
//! All views are pull-based: they recompute on the first read after the
//! task's revision changed and never touch the task's state.
//!
//! ## Example
//! ```rust
//! use tasklane::{AbortSignal, InstanceFlag, Task, TaskError};
//! use tasklane::views::{computed_length, filtered_instances};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let task = Task::new("ping", |_s: AbortSignal, n: u32| async move { Ok::<_, TaskError>(n) });
//!
//! let source = task.clone();
//! let done = filtered_instances(move || source.clone(), Some(InstanceFlag::IsSuccessful));
//! let done_count = computed_length(&done);
//!
//! task.perform(1).settled().await.ok();
//! assert_eq!(done_count.get(), 1);
//! # }
//! ```

use std::sync::Arc;

use crate::tasks::{InstanceFlag, TaskInstance};

use super::computed::Computed;
use super::source::InstanceSource;

/// Instances of the accessed source whose `key` flag is currently set, in invocation order.
///
/// A `None` key yields a view that is always empty.
pub fn filtered_instances<S, F, T>(
    accessor: F,
    key: Option<InstanceFlag>,
) -> Computed<Vec<TaskInstance<T>>>
where
    S: InstanceSource<T>,
    F: Fn() -> S + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    let Some(flag) = key else {
        return Computed::constant(Vec::new());
    };

    let accessor = Arc::new(accessor);
    let reader = Arc::clone(&accessor);
    Computed::new(
        move || (*reader)().revision(),
        move || {
            let snapshot = (*accessor)().snapshot();
            (snapshot.revision, snapshot.select(flag))
        },
    )
}

/// Number of items in a sequence view.
pub fn computed_length<I>(view: &Computed<Vec<I>>) -> Computed<usize>
where
    I: Clone + Send + 'static,
{
    view.map(|items| items.len())
}

/// First item of a sequence view, `None` when empty.
pub fn computed_first_of<I>(view: &Computed<Vec<I>>) -> Computed<Option<I>>
where
    I: Clone + Send + 'static,
{
    view.map(|items| items.into_iter().next())
}

/// Last item of a sequence view, `None` when empty.
pub fn computed_last_of<I>(view: &Computed<Vec<I>>) -> Computed<Option<I>>
where
    I: Clone + Send + 'static,
{
    view.map(|mut items| items.pop())
}
