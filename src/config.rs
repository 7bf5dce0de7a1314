//! # Task configuration.
//!
//! Provides [`TaskConfig`] settings shared by every instance of one task.
//!
//! ## Sentinel values
//! - `max_retained = 0` → unlimited retention (no pruning of finished instances)
//! - `bus_capacity = 0` → clamped to 1 by [`TaskConfig::bus_capacity_clamped`]

use crate::policies::ConcurrencyPolicy;

/// Configuration for a [`Task`](crate::Task).
///
/// ## Field semantics
/// - `policy`: admission strategy and concurrency ceiling
/// - `max_retained`: finished instances kept in the collection (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct TaskConfig {
    /// How new instances are admitted.
    pub policy: ConcurrencyPolicy,

    /// Maximum number of **finished** instances kept in the collection.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = the oldest finished instances beyond `n` are pruned after each transition
    ///
    /// Running and enqueued instances are never pruned.
    pub max_retained: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events receive
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl TaskConfig {
    /// Returns the retention bound as an `Option`.
    ///
    /// - `None` → keep every instance
    /// - `Some(n)` → keep at most `n` finished instances
    #[inline]
    pub fn retention_limit(&self) -> Option<usize> {
        if self.max_retained == 0 {
            None
        } else {
            Some(self.max_retained)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for TaskConfig {
    /// Default configuration:
    ///
    /// - `policy = ConcurrencyPolicy::Unbounded`
    /// - `max_retained = 0` (unlimited)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            policy: ConcurrencyPolicy::default(),
            max_retained: 0,
            bus_capacity: 1024,
        }
    }
}
