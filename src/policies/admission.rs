//! # Admission decision for a new instance
//!
//! Pure function from (policy, current load) to what must happen to the new
//! instance. Applying the decision (status changes, cancellation, spawning) is
//! done by the task core inside a single critical section.
//!
//! ```text
//!                    running < max          running ≥ max (or backlog present)
//! Unbounded    ──►   Run                    Run
//! Drop         ──►   Run                    Drop
//! Enqueue      ──►   Run                    Enqueue
//! Restartable  ──►   Run                    Restart { evict: running - max + 1 }
//! KeepLatest   ──►   Run                    ReplaceBacklog
//! ```
//!
//! ## Invariants
//! - A non-empty backlog is never overtaken: queued policies enqueue behind it.
//! - `Restart` evicts from the **front** of the running sequence (oldest first).

use super::concurrency::ConcurrencyPolicy;

/// Outcome of admission for one new instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Start the instance now.
    Run,
    /// Put the instance at the back of the backlog.
    Enqueue,
    /// Refuse the instance; it never runs.
    Drop,
    /// Cancel the `evict` oldest running instances, then start the new one.
    Restart { evict: usize },
    /// Drop every queued instance, then enqueue the new one.
    ReplaceBacklog,
}

/// Decides the fate of a new instance given the current load.
pub(crate) fn decide(policy: ConcurrencyPolicy, running: usize, enqueued: usize) -> Admission {
    let Some(max) = policy.max_concurrency() else {
        return Admission::Run;
    };
    let saturated = running >= max;

    match policy {
        ConcurrencyPolicy::Unbounded => Admission::Run,
        ConcurrencyPolicy::Drop { .. } if saturated => Admission::Drop,
        ConcurrencyPolicy::Enqueue { .. } if saturated || enqueued > 0 => Admission::Enqueue,
        ConcurrencyPolicy::Restartable { .. } if saturated => Admission::Restart {
            evict: running + 1 - max,
        },
        ConcurrencyPolicy::KeepLatest { .. } if saturated || enqueued > 0 => {
            Admission::ReplaceBacklog
        }
        _ => Admission::Run,
    }
}
