//! Bounded work queue with task accounting.
//!
//! A crossbeam bounded channel carries the jobs; an unfinished-task counter lets the producer
//! wait until every job it enqueued has been marked done by a worker.

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// `put` timed out on a full queue. Hands the job back so the caller can retry.
pub struct QueueFull<T>(pub T);

impl<T> QueueFull<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

impl<T> fmt::Display for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("work queue is full")
    }
}

impl<T> std::error::Error for QueueFull<T> {}

/// `get` timed out on an empty queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("work queue is empty")]
pub struct QueueEmpty;

/// Bounded FIFO shared by the producer and the workers.
pub struct WorkQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
    unfinished: Mutex<usize>,
    all_done: Condvar,
}

impl<T> WorkQueue<T> {
    /// Queue holding at most `capacity` jobs (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            unfinished: Mutex::new(0),
            all_done: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently waiting (not yet taken by a worker).
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Jobs enqueued and not yet marked done, including those held by workers.
    pub fn unfinished(&self) -> usize {
        *self.lock_unfinished()
    }

    fn lock_unfinished(&self) -> MutexGuard<'_, usize> {
        self.unfinished.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue `job`, waiting up to `timeout` for room.
    pub fn put(&self, job: T, timeout: Duration) -> Result<(), QueueFull<T>> {
        // Count before sending so a fast worker's task_done can never run ahead of us.
        *self.lock_unfinished() += 1;
        match self.tx.send_timeout(job, timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(job)) | Err(SendTimeoutError::Disconnected(job)) => {
                self.finish_one();
                Err(QueueFull(job))
            }
        }
    }

    /// Dequeue the next job, waiting up to `timeout` for one to arrive.
    pub fn get(&self, timeout: Duration) -> Result<T, QueueEmpty> {
        match self.rx.recv_timeout(timeout) {
            Ok(job) => Ok(job),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                Err(QueueEmpty)
            }
        }
    }

    /// Mark one job taken with [`get`](Self::get) as fully processed.
    pub fn task_done(&self) {
        self.finish_one();
    }

    fn finish_one(&self) {
        let mut unfinished = self.lock_unfinished();
        if *unfinished == 0 {
            log::warn!("task_done called more times than jobs were enqueued");
            return;
        }
        *unfinished -= 1;
        if *unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Block until every enqueued job has been marked done.
    pub fn join(&self) {
        let mut unfinished = self.lock_unfinished();
        while *unfinished > 0 {
            unfinished = self
                .all_done
                .wait(unfinished)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Like [`join`](Self::join) but gives up once `stop()` returns true, checked every `poll`.
    /// Returns true when all jobs were done.
    pub fn join_until<F>(&self, poll: Duration, stop: F) -> bool
    where
        F: Fn() -> bool,
    {
        let mut unfinished = self.lock_unfinished();
        while *unfinished > 0 {
            if stop() {
                return false;
            }
            unfinished = self
                .all_done
                .wait_timeout(unfinished, poll)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
        true
    }

    /// Remove every job still waiting, marking each done. Used once workers have exited.
    pub fn drain(&self) -> Vec<T> {
        let left: Vec<T> = self.rx.try_iter().collect();
        for _ in &left {
            self.finish_one();
        }
        left
    }
}
