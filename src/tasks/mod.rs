//! # Tasks and their instances.
//!
//! - [`Task`] reusable async operation under a concurrency policy
//! - [`TaskBuilder`] policy, retention and subscriber configuration
//! - [`TaskInstance`] one invocation with its status, value and error
//! - [`Operation`] the async body, implemented by closures
//! - [`TaskTable`] debug dump of a task's instances

mod builder;
mod core;
mod instance;
mod operation;
mod runner;
mod table;
mod task;

pub use builder::TaskBuilder;
pub use instance::{InstanceFlag, InstanceStatus, TaskInstance};
pub use operation::{Operation, OperationFuture};
pub use table::{TableRow, TaskTable};
pub use task::Task;

pub(crate) use runner::panic_message;
