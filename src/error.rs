//! Error types recorded on task instances.
//!
//! [`TaskError`] is the single error enum a task body returns and an instance
//! records. It is never raised from [`Task::perform`](crate::Task::perform):
//! callers inspect instance state (or await [`TaskInstance::settled`](crate::TaskInstance::settled))
//! instead of catching errors at the call site.
//!
//! Like the other runtime error types it provides helper methods (`as_label`,
//! `as_message`) for logs/metrics.

use std::fmt::Display;
use thiserror::Error;

/// # Errors produced by task instances.
///
/// - [`TaskError::Fail`] and [`TaskError::Panicked`] put an instance into the `Error` state.
/// - [`TaskError::Canceled`] is absorbed: the instance ends up `Canceled`, never `Error`.
/// - [`TaskError::Dropped`] only surfaces through `settled()` of a dropped instance.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task body failed for a reason unrelated to cancellation.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task body panicked; the panic was caught by the runner.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Instance was cancelled (explicitly or by policy eviction).
    #[error("instance canceled")]
    Canceled,

    /// Instance was refused by the concurrency policy and never ran.
    #[error("instance dropped by concurrency policy")]
    Dropped,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use tasklane::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasklane::TaskError;
    ///
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
            TaskError::Dropped => "task_dropped",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Canceled => "instance canceled".to_string(),
            TaskError::Dropped => "instance dropped".to_string(),
        }
    }

    /// Returns `true` for the variant produced by cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Fail {
            error: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(
            TaskError::Panicked { info: "boom".into() }.as_label(),
            "task_panicked"
        );
        assert_eq!(TaskError::Dropped.as_label(), "task_dropped");
    }

    #[test]
    fn anyhow_context_is_kept() {
        let err = anyhow::anyhow!("refused").context("connecting");
        let task_err = TaskError::from(err);
        assert_eq!(
            task_err,
            TaskError::Fail {
                error: "connecting: refused".into()
            }
        );
    }
}
