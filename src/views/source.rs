use crate::tasks::{InstanceFlag, InstanceStatus, TaskInstance};

/// Consistent copy of a task's instance collection.
///
/// Taken under the task's lock, so every status reflects the same revision.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Revision of the collection when the snapshot was taken.
    pub revision: u64,
    /// Instances in invocation order, each with its status at `revision`.
    pub entries: Vec<(TaskInstance<T>, InstanceStatus)>,
}

impl<T> Snapshot<T> {
    /// Instances whose flag is set, preserving invocation order.
    pub fn select(&self, flag: InstanceFlag) -> Vec<TaskInstance<T>> {
        self.entries
            .iter()
            .filter(|(_, status)| flag.matches(*status))
            .map(|(inst, _)| inst.clone())
            .collect()
    }
}

/// Read-only, revisioned view of an instance collection.
///
/// Implemented by [`Task`](crate::Task); derived views only ever call these two methods.
pub trait InstanceSource<T> {
    /// Cheap counter that changes whenever the collection or any status changes.
    ///
    /// Values are never shared between two sources.
    fn revision(&self) -> u64;

    /// Consistent copy of the collection.
    fn snapshot(&self) -> Snapshot<T>;
}
