//! Shared pipeline state: counters, failure log and the stop flag, injected into the producer
//! and every worker.

use std::sync::{Mutex, MutexGuard};

use super::budget::{ErrorBudget, StopSignal};
use crate::FailureRecord;

/// Everything workers mutate together. Guarded by one mutex; never held across I/O.
#[derive(Debug)]
struct Bookkeeping {
    songs_processed: usize,
    budget: ErrorBudget,
    failures: Vec<FailureRecord>,
    abandoned: usize,
    budget_exhausted: bool,
}

/// Point-in-time copy of the bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    pub songs_processed: usize,
    pub errors_remaining: i64,
    pub failures: Vec<FailureRecord>,
    pub abandoned: usize,
    pub budget_exhausted: bool,
}

pub struct PipelineState {
    book: Mutex<Bookkeeping>,
    stop: StopSignal,
}

impl PipelineState {
    pub fn new(max_errors: u32, stop: StopSignal) -> Self {
        Self {
            book: Mutex::new(Bookkeeping {
                songs_processed: 0,
                budget: ErrorBudget::new(max_errors),
                failures: Vec::new(),
                abandoned: 0,
                budget_exhausted: false,
            }),
            stop,
        }
    }

    // A panicked worker must not take the bookkeeping down with it.
    fn lock(&self) -> MutexGuard<'_, Bookkeeping> {
        self.book.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_requested()
    }

    /// Claim a freshly dequeued job. Returns its 1-based processing number, or `None` when stop
    /// was requested or the budget ran out in the meantime (the job is counted as abandoned).
    pub fn begin_job(&self) -> Option<usize> {
        let mut book = self.lock();
        if self.stop.is_requested() || book.budget_exhausted {
            book.abandoned += 1;
            return None;
        }
        book.songs_processed += 1;
        Some(book.songs_processed)
    }

    /// Append a failure and charge it to the budget. Returns true for the one failure that
    /// exhausts the budget; the caller then raises the stop flag.
    pub fn record_failure(&self, reference: &str, message: String) -> bool {
        let mut book = self.lock();
        book.failures.push(FailureRecord {
            reference: reference.to_string(),
            message,
        });
        if book.budget.record_failure() && !book.budget_exhausted {
            book.budget_exhausted = true;
            return true;
        }
        false
    }

    /// Count jobs left on the queue at shutdown.
    pub fn add_abandoned(&self, n: usize) {
        self.lock().abandoned += n;
    }

    pub fn errors_remaining(&self) -> i64 {
        self.lock().budget.remaining()
    }

    pub fn is_budget_exhausted(&self) -> bool {
        self.lock().budget.is_exhausted()
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.lock().failures.clone()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let book = self.lock();
        StateSnapshot {
            songs_processed: book.songs_processed,
            errors_remaining: book.budget.remaining(),
            failures: book.failures.clone(),
            abandoned: book.abandoned,
            budget_exhausted: book.budget_exhausted,
        }
    }
}
