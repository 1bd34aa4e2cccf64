use anyhow::{Context, Result, bail};
use kdam::Animation;
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::budget::StopSignal;
use super::context::PipelineTuning;
use super::producer::run_producer;
use super::queue::WorkQueue;
use super::shutdown::{Phase, ShutdownCoordinator};
use super::state::PipelineState;
use super::worker::{WorkerSettings, spawn_workers};
use crate::client::ClientFactory;
use crate::engine::progress::{ProgressBar, ProgressBarConfig, create_progress_bar, refresh_bar};
use crate::error::CatalogueError;
use crate::{CatalogueRecord, FailureRecord, ImportReport, ImportSettings, Job};

/// Batch importer: one producer (the thread calling [`start`](Self::start)) feeding a pool of
/// upload workers through a bounded queue.
///
/// Dropping the importer stops it, so every exit path (including early returns and panics in
/// the caller) joins the workers.
pub struct BatchImporter<F: ClientFactory> {
    settings: ImportSettings,
    tuning: PipelineTuning,
    factory: Arc<F>,
    queue: Arc<WorkQueue<Job>>,
    state: Arc<PipelineState>,
    shutdown: ShutdownCoordinator,
    started: AtomicBool,
}

impl<F: ClientFactory> BatchImporter<F> {
    pub fn new(settings: ImportSettings, factory: F) -> Self {
        let tuning = PipelineTuning::new(settings.workers, settings.queue_capacity);
        let stop = StopSignal::new();
        Self {
            queue: Arc::new(WorkQueue::new(tuning.queue_capacity)),
            state: Arc::new(PipelineState::new(settings.max_errors, stop.clone())),
            shutdown: ShutdownCoordinator::new(stop),
            factory: Arc::new(factory),
            tuning,
            settings,
            started: AtomicBool::new(false),
        }
    }

    pub fn tuning(&self) -> PipelineTuning {
        self.tuning
    }

    /// Handle for requesting a stop from elsewhere (e.g. a Ctrl+C handler). Raising it makes
    /// the producer and the workers wind down; [`start`](Self::start) then returns.
    pub fn stop_signal(&self) -> StopSignal {
        self.state.stop_signal().clone()
    }

    pub fn phase(&self) -> Phase {
        self.shutdown.phase()
    }

    /// Import every record from the configured offset on. Blocks until the catalogue is done
    /// and drained, the error budget runs out, or a stop is requested.
    ///
    /// Per-song failures and catalogue errors are reported in the returned [`ImportReport`];
    /// `Err` only means the pipeline could not run at all.
    pub fn start<I>(&self, records: I) -> Result<ImportReport>
    where
        I: IntoIterator<Item = Result<CatalogueRecord, CatalogueError>>,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            bail!("batch import already started");
        }

        let progress = self.setup_progress();
        let worker_settings = WorkerSettings {
            dry_run: self.settings.dry_run,
            store: self.settings.store,
            poll_interval: self.settings.poll_interval,
            songs_total: self.settings.songs_total,
            progress_base: self.settings.first_row() - 1,
        };

        info!("producer: Will use {} threads", self.tuning.workers);
        let workers = match spawn_workers(
            self.tuning.workers,
            &self.queue,
            &self.state,
            &self.factory,
            &worker_settings,
            &progress,
        ) {
            Ok(workers) => workers,
            Err(e) => {
                self.shutdown.request_stop();
                return Err(e).context("spawn upload workers");
            }
        };
        if !self.shutdown.launch(workers) {
            bail!("batch import was stopped before it started");
        }

        let summary = run_producer(
            records,
            &self.queue,
            &self.state,
            self.settings.first_row(),
            self.settings.poll_interval,
        );
        debug!("producer: done reading rows");
        let stop_seen = self.state.is_stop_requested();

        self.shutdown.stop();
        let left = self.queue.drain();
        self.state.add_abandoned(left.len());
        if let Some(bar) = &progress {
            refresh_bar(bar);
            eprintln!();
        }

        let snap = self.state.snapshot();
        Ok(ImportReport {
            max_errors: self.settings.max_errors,
            errors_remaining: snap.errors_remaining,
            failures: snap.failures,
            songs_processed: snap.songs_processed,
            enqueued: summary.enqueued,
            skipped: summary.skipped,
            abandoned: snap.abandoned,
            budget_exhausted: snap.budget_exhausted,
            cancelled: stop_seen && !snap.budget_exhausted && summary.fatal.is_none(),
            fatal: summary.fatal.map(|e| e.to_string()),
        })
    }

    /// Stop the import and wait for the workers. Idempotent; safe from any thread.
    pub fn stop(&self) {
        self.shutdown.stop();
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.state.failures()
    }

    pub fn errors_remaining(&self) -> i64 {
        self.state.errors_remaining()
    }

    fn setup_progress(&self) -> Option<ProgressBar> {
        let total = self.settings.songs_total?;
        if !self.settings.show_progress {
            return None;
        }
        let remaining = total.saturating_sub(self.settings.first_row() - 1);
        Some(create_progress_bar(ProgressBarConfig::new(
            remaining,
            "Importing",
            Animation::Classic,
        )))
    }
}

impl<F: ClientFactory> Drop for BatchImporter<F> {
    fn drop(&mut self) {
        self.shutdown.stop();
    }
}
