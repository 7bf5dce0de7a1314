//! Derived views over a task's instances.
//!
//! ## Contents
//! - [`Computed`] revision-keyed memo cell (the observable primitive)
//! - [`InstanceSource`], [`Snapshot`] what a view reads from
//! - [`filtered_instances`] flag-filtered sequence of instances
//! - [`computed_length`], [`computed_first_of`], [`computed_last_of`] scalar aggregates

mod computed;
mod filtered;
mod source;

pub use computed::Computed;
pub use filtered::{computed_first_of, computed_last_of, computed_length, filtered_instances};
pub use source::{InstanceSource, Snapshot};
