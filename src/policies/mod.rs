//! Concurrency policies.
//!
//! This module groups the knobs that decide **whether** a new instance runs,
//! waits, is discarded, or displaces an older one.
//!
//! ## Contents
//! - [`ConcurrencyPolicy`] which strategy a task uses and its ceiling
//! - `admission` the pure decision applied by the task core on every `perform`
//!
//! ## Quick wiring
//! ```text
//! Task { policy: ConcurrencyPolicy }
//!      └─► tasks::core::TaskCore::admit uses:
//!           - admission::decide(policy, running, enqueued)
//!           - then applies Run / Enqueue / Drop / Restart / ReplaceBacklog
//! ```
//!
//! ## Defaults
//! - `ConcurrencyPolicy::Unbounded`.
//! - Shorthand constructors (`dropping`, `enqueuing`, `restartable`, `keep_latest`) use a ceiling of 1.

pub(crate) mod admission;
mod concurrency;

pub use concurrency::ConcurrencyPolicy;
