//! # Revision-keyed memo cell.
//!
//! [`Computed`] is the lazily recomputed observable the derived views are
//! built from. It pairs a cheap `revision()` reader with an expensive
//! `compute()`; the value is recomputed only when read after the revision moved.
//!
//! ```text
//! get()
//!   ├─► revision() == cached revision ─► clone cached value
//!   └─► otherwise ─► compute() ─► (revision, value) ─► cache ─► value
//! ```
//!
//! ## Rules
//! - Pull-based: nothing happens until `get()` is called.
//! - The cached revision is the one `compute()` observed, so a change racing
//!   with a recomputation is picked up by the next read.
//! - Derived cells created with [`Computed::map`] share the parent's revision reader.
//! - Task revisions come from one process-wide counter, so an accessor that
//!   switches to another task always reads a revision the cell has not cached.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type RevisionFn = Arc<dyn Fn() -> u64 + Send + Sync>;
type ComputeFn<T> = Box<dyn Fn() -> (u64, T) + Send + Sync>;

struct Inner<T> {
    revision: RevisionFn,
    compute: ComputeFn<T>,
    cache: Mutex<Option<(u64, T)>>,
    recomputations: AtomicU64,
}

/// Lazily recomputed, memoized value. Cheap to clone; clones share the cache.
pub struct Computed<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("recomputations", &self.recomputations())
            .finish_non_exhaustive()
    }
}

impl<T> Computed<T> {
    /// Number of times the value has been (re)computed.
    pub fn recomputations(&self) -> u64 {
        self.inner.recomputations.load(Ordering::Relaxed)
    }
}

impl<T> Computed<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a cell from a revision reader and a computation returning the
    /// value together with the revision it reflects.
    pub fn new<R, C>(revision: R, compute: C) -> Self
    where
        R: Fn() -> u64 + Send + Sync + 'static,
        C: Fn() -> (u64, T) + Send + Sync + 'static,
    {
        Self::with_revision(Arc::new(revision), Box::new(compute))
    }

    /// A cell whose value never changes.
    pub fn constant(value: T) -> Self
    where
        T: Sync,
    {
        Self::new(|| 0, move || (0, value.clone()))
    }

    fn with_revision(revision: RevisionFn, compute: ComputeFn<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                revision,
                compute,
                cache: Mutex::new(None),
                recomputations: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the current value, recomputing only if the source changed.
    pub fn get(&self) -> T {
        self.read().1
    }

    /// Returns the current value with the revision it reflects.
    pub fn read(&self) -> (u64, T) {
        let current = (self.inner.revision)();
        let mut cache = self
            .inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some((rev, value)) = cache.as_ref() {
            if *rev == current {
                return (*rev, value.clone());
            }
        }

        let (rev, value) = (self.inner.compute)();
        self.inner.recomputations.fetch_add(1, Ordering::Relaxed);
        *cache = Some((rev, value.clone()));
        (rev, value)
    }

    /// Derives a new cell from this one, sharing its revision reader.
    pub fn map<U, F>(&self, f: F) -> Computed<U>
    where
        U: Clone + Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let parent = self.clone();
        Computed::with_revision(
            Arc::clone(&self.inner.revision),
            Box::new(move || {
                let (rev, value) = parent.read();
                (rev, f(value))
            }),
        )
    }
}
