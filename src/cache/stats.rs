//! Sweep Statistics Module
//!
//! Counts removals made by the lazy and active sweeps and worker retries.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Sweep Stats ==
/// Snapshot of sweep activity for one cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepStats {
    /// Fields removed by the lazy sweep workers
    pub lazy_removed: u64,
    /// Fields removed by active (full-scan) sweeps
    pub active_removed: u64,
    /// Times a worker backed off after a failed or empty read
    pub worker_retries: u64,
}

impl SweepStats {
    /// Total fields removed by either sweep.
    pub fn total_removed(&self) -> u64 {
        self.lazy_removed + self.active_removed
    }
}

// == Sweep Counters ==
/// Live counters shared between a cache and its workers.
#[derive(Debug, Default)]
pub(crate) struct SweepCounters {
    lazy_removed: AtomicU64,
    active_removed: AtomicU64,
    worker_retries: AtomicU64,
}

impl SweepCounters {
    pub fn record_lazy_removal(&self) {
        self.lazy_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_active_removals(&self, count: usize) {
        self.active_removed
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.worker_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SweepStats {
        SweepStats {
            lazy_removed: self.lazy_removed.load(Ordering::Relaxed),
            active_removed: self.active_removed.load(Ordering::Relaxed),
            worker_retries: self.worker_retries.load(Ordering::Relaxed),
        }
    }
}
