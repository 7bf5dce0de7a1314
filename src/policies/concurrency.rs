//! # Concurrency policy of a task.
//!
//! A [`Task`](crate::Task) runs its instances under exactly one policy. The
//! policy decides what happens to a new instance when the number of running
//! instances has reached the ceiling.
//!
//! ## Variants
//! - `Unbounded`: no ceiling, everything runs immediately.
//! - `Drop`: **ignore** the new instance (marked dropped, never runs).
//! - `Enqueue`: **wait** in FIFO order for a free slot.
//! - `Restartable`: **cancel** the oldest running instance and run the new one.
//! - `KeepLatest`: **drop** the waiting backlog and wait as the only queued instance.
//!
//! ## Invariants
//! - `max` is clamped to at least 1.
//! - For every bounded variant the number of running instances never exceeds `max`.

/// Policy controlling how new instances are admitted when the task is saturated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// Every instance runs immediately (default).
    #[default]
    Unbounded,

    /// Drop new instances while `max` are running.
    ///
    /// Use when:
    /// - Redundant work should be avoided
    /// - Example: "save" button pressed repeatedly
    Drop {
        /// Concurrency ceiling.
        max: usize,
    },

    /// Queue new instances (FIFO) while `max` are running.
    ///
    /// Use when:
    /// - All invocations must execute, in order
    /// - Example: sequential upload pipeline
    Enqueue {
        /// Concurrency ceiling.
        max: usize,
    },

    /// Cancel the oldest running instance to make room for the new one.
    ///
    /// Use when:
    /// - A new invocation invalidates older ones
    /// - Example: type-ahead search
    Restartable {
        /// Concurrency ceiling.
        max: usize,
    },

    /// Keep running instances, replace the backlog with the newest instance.
    ///
    /// Use when:
    /// - The running work must finish, but only the latest request matters afterwards
    /// - Example: polling refresh
    KeepLatest {
        /// Concurrency ceiling.
        max: usize,
    },
}

impl ConcurrencyPolicy {
    /// `Drop` with a ceiling of one.
    #[inline]
    pub const fn dropping() -> Self {
        ConcurrencyPolicy::Drop { max: 1 }
    }

    /// `Enqueue` with a ceiling of one.
    #[inline]
    pub const fn enqueuing() -> Self {
        ConcurrencyPolicy::Enqueue { max: 1 }
    }

    /// `Restartable` with a ceiling of one.
    #[inline]
    pub const fn restartable() -> Self {
        ConcurrencyPolicy::Restartable { max: 1 }
    }

    /// `KeepLatest` with a ceiling of one.
    #[inline]
    pub const fn keep_latest() -> Self {
        ConcurrencyPolicy::KeepLatest { max: 1 }
    }

    /// Returns the policy with a new ceiling (clamped to at least 1).
    ///
    /// A ceiling on `Unbounded` without any buffering strategy turns it into
    /// `Enqueue`, since that is the only variant that never discards work.
    ///
    /// ```
    /// use tasklane::ConcurrencyPolicy;
    ///
    /// assert_eq!(
    ///     ConcurrencyPolicy::Unbounded.with_max_concurrency(3),
    ///     ConcurrencyPolicy::Enqueue { max: 3 },
    /// );
    /// assert_eq!(
    ///     ConcurrencyPolicy::dropping().with_max_concurrency(0),
    ///     ConcurrencyPolicy::Drop { max: 1 },
    /// );
    /// ```
    pub fn with_max_concurrency(self, max: usize) -> Self {
        let max = max.max(1);
        match self {
            ConcurrencyPolicy::Unbounded | ConcurrencyPolicy::Enqueue { .. } => {
                ConcurrencyPolicy::Enqueue { max }
            }
            ConcurrencyPolicy::Drop { .. } => ConcurrencyPolicy::Drop { max },
            ConcurrencyPolicy::Restartable { .. } => ConcurrencyPolicy::Restartable { max },
            ConcurrencyPolicy::KeepLatest { .. } => ConcurrencyPolicy::KeepLatest { max },
        }
    }

    /// Returns the effective ceiling, `None` for `Unbounded`.
    #[inline]
    pub fn max_concurrency(&self) -> Option<usize> {
        match *self {
            ConcurrencyPolicy::Unbounded => None,
            ConcurrencyPolicy::Drop { max }
            | ConcurrencyPolicy::Enqueue { max }
            | ConcurrencyPolicy::Restartable { max }
            | ConcurrencyPolicy::KeepLatest { max } => Some(max.max(1)),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConcurrencyPolicy::Unbounded => "unbounded",
            ConcurrencyPolicy::Drop { .. } => "drop",
            ConcurrencyPolicy::Enqueue { .. } => "enqueue",
            ConcurrencyPolicy::Restartable { .. } => "restartable",
            ConcurrencyPolicy::KeepLatest { .. } => "keep_latest",
        }
    }
}
