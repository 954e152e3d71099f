//! Process-wide "worker busy" indicator

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that is true exactly while the worker is processing a job.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Mark the worker busy until the returned guard is dropped.
    pub fn mark_busy(&self) -> BusyGuard {
        self.0.store(true, Ordering::SeqCst);
        BusyGuard { flag: self.clone() }
    }
}

/// Clears the busy flag when dropped.
///
/// The guard owns a handle to the flag, so it can travel with a dequeued
/// job from the queue to the worker.
#[must_use = "the worker is marked idle as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BusyGuard {
    flag: BusyFlag,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.0.store(false, Ordering::SeqCst);
    }
}
