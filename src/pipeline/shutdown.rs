//! Shutdown coordinator: one place that raises the stop flag and joins the workers, exactly once.

use log::{debug, error};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

use super::budget::StopSignal;

/// Lifecycle of the worker pool. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    StopRequested,
    Draining,
    Stopped,
}

struct Inner {
    phase: Phase,
    workers: Vec<JoinHandle<()>>,
    worker_ids: Vec<ThreadId>,
}

pub struct ShutdownCoordinator {
    stop: StopSignal,
    inner: Mutex<Inner>,
    stopped: Condvar,
}

impl ShutdownCoordinator {
    pub fn new(stop: StopSignal) -> Self {
        Self {
            stop,
            inner: Mutex::new(Inner {
                phase: Phase::Idle,
                workers: Vec::new(),
                worker_ids: Vec::new(),
            }),
            stopped: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn phase(&self) -> Phase {
        let mut inner = self.lock();
        if inner.phase == Phase::Running && self.stop.is_requested() {
            inner.phase = Phase::StopRequested;
        }
        inner.phase
    }

    /// Hand over the worker threads (`Idle` to `Running`). Returns false when already launched
    /// or stopped; `workers` are then detached.
    pub fn launch(&self, workers: Vec<JoinHandle<()>>) -> bool {
        let mut inner = self.lock();
        if inner.phase != Phase::Idle {
            return false;
        }
        inner.worker_ids = workers.iter().map(|h| h.thread().id()).collect();
        inner.workers = workers;
        inner.phase = Phase::Running;
        true
    }

    /// Raise the stop flag without waiting. Safe from workers and signal handlers.
    pub fn request_stop(&self) {
        self.stop.request();
        let mut inner = self.lock();
        if inner.phase == Phase::Running {
            inner.phase = Phase::StopRequested;
        }
    }

    /// Raise the stop flag and wait for every worker to exit.
    ///
    /// Idempotent: the first caller joins the workers; concurrent callers wait for it to
    /// finish; later callers return at once. Called from a worker thread it only raises the
    /// flag, since a worker cannot join itself.
    pub fn stop(&self) {
        self.stop.request();
        let mut inner = self.lock();
        if inner.worker_ids.contains(&thread::current().id()) {
            if inner.phase == Phase::Running {
                inner.phase = Phase::StopRequested;
            }
            return;
        }
        let phase = inner.phase;
        match phase {
            Phase::Stopped => return,
            Phase::Draining => {
                while inner.phase != Phase::Stopped {
                    inner = self
                        .stopped
                        .wait(inner)
                        .unwrap_or_else(|e| e.into_inner());
                }
                return;
            }
            Phase::Idle | Phase::Running | Phase::StopRequested => {}
        }

        inner.phase = Phase::Draining;
        let workers = std::mem::take(&mut inner.workers);
        drop(inner);

        debug!("Waiting for {} workers to finish pending uploads...", workers.len());
        for handle in workers {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("{} panicked", name);
            }
        }
        debug!("All workers stopped");

        self.lock().phase = Phase::Stopped;
        self.stopped.notify_all();
    }
}
