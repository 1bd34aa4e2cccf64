//! Error budget and stop signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Remaining tolerance for per-song failures. Lives inside the pipeline state mutex.
///
/// `limit == 0` means unlimited: failures are still counted, but never exhaust the budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorBudget {
    limit: u32,
    remaining: i64,
}

impl ErrorBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            remaining: i64::from(limit),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit == 0
    }

    /// Goes negative once more failures than `limit` were recorded.
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Count one failure. Returns whether the budget is now exhausted.
    pub fn record_failure(&mut self) -> bool {
        self.remaining -= 1;
        self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        !self.is_unlimited() && self.remaining < 0
    }
}

/// Set-once stop flag, cloneable into worker threads and signal handlers.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns true only for the call that actually raised it.
    pub fn request(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
