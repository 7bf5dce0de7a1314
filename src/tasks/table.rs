//! Tabular dump of a task's instances for debugging.

use std::fmt;

use super::instance::InstanceStatus;
use super::task::Task;

/// One row of a [`TaskTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: u64,
    pub status: InstanceStatus,
    pub value: Option<String>,
    pub error: Option<String>,
}

/// Point-in-time table of a task's instances.
///
/// Rendered through [`Display`](fmt::Display):
/// ```text
/// task=search policy=restartable revision=7 instances=2
///       id  status      value                 error
///        1  canceled    -                     -
///        2  successful  "results for rust"    -
/// ```
#[derive(Debug, Clone)]
pub struct TaskTable {
    pub task: String,
    pub policy: &'static str,
    pub revision: u64,
    pub rows: Vec<TableRow>,
}

impl fmt::Display for TaskTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "task={} policy={} revision={} instances={}",
            self.task,
            self.policy,
            self.revision,
            self.rows.len()
        )?;
        write!(f, "{:>8}  {:<10}  {:<20}  error", "id", "status", "value")?;
        for row in &self.rows {
            write!(
                f,
                "\n{:>8}  {:<10}  {:<20}  {}",
                row.id,
                row.status.as_label(),
                row.value.as_deref().unwrap_or("-"),
                row.error.as_deref().unwrap_or("-"),
            )?;
        }
        Ok(())
    }
}

impl<A, T> Task<A, T>
where
    T: Clone + fmt::Debug,
{
    /// Snapshot of every retained instance as a table.
    pub fn table(&self) -> TaskTable {
        let snapshot = self.snapshot();
        let rows = snapshot
            .entries
            .iter()
            .map(|(inst, status)| TableRow {
                id: inst.id(),
                status: *status,
                value: inst.value().map(|v| format!("{v:?}")),
                error: inst.error().map(|e| e.to_string()),
            })
            .collect();

        TaskTable {
            task: self.name().to_owned(),
            policy: self.policy().as_label(),
            revision: snapshot.revision,
            rows,
        }
    }

    /// Logs [`table`](Self::table) at debug level.
    pub fn print_task(&self) {
        let table = self.table();
        tracing::debug!(target: "tasklane", task = %table.task, "\n{table}");
    }
}
