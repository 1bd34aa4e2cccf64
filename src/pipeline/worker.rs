//! Upload workers: each pulls jobs from the queue and drives its own client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::queue::WorkQueue;
use super::state::PipelineState;
use crate::client::{ClientFactory, NewSong, UploadClient, UploadProgress};
use crate::engine::progress::{ProgressBar, update_progress_bar, write_above_bar};
use crate::error::UploadError;
use crate::{AUTODETECT, CatalogueRecord, Job};

/// Successful ends of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Uploaded,
    /// Server already had the reference; nothing sent.
    AlreadyExists,
    /// Dry run: would have uploaded.
    DryRun,
}

/// Per-run settings every worker reads.
#[derive(Clone, Debug)]
pub struct WorkerSettings {
    pub dry_run: bool,
    pub store: bool,
    pub poll_interval: Duration,
    pub songs_total: Option<usize>,
    /// Rows skipped by the offset, so progress reads as a catalogue position.
    pub progress_base: usize,
}

/// Everything one worker thread owns or shares.
pub struct WorkerContext<F> {
    pub index: usize,
    pub queue: Arc<WorkQueue<Job>>,
    pub state: Arc<PipelineState>,
    pub factory: Arc<F>,
    pub settings: WorkerSettings,
    pub progress: Option<ProgressBar>,
}

/// Spawn `count` workers, numbered from 1.
pub fn spawn_workers<F: ClientFactory>(
    count: usize,
    queue: &Arc<WorkQueue<Job>>,
    state: &Arc<PipelineState>,
    factory: &Arc<F>,
    settings: &WorkerSettings,
    progress: &Option<ProgressBar>,
) -> std::io::Result<Vec<JoinHandle<()>>> {
    (1..=count)
        .map(|index| {
            let ctx = WorkerContext {
                index,
                queue: Arc::clone(queue),
                state: Arc::clone(state),
                factory: Arc::clone(factory),
                settings: settings.clone(),
                progress: progress.clone(),
            };
            thread::Builder::new()
                .name(format!("upload-worker-{index}"))
                .spawn(move || worker_loop(ctx))
        })
        .collect()
}

/// Worker body: runs until the stop flag is raised.
pub fn worker_loop<F: ClientFactory>(ctx: WorkerContext<F>) {
    let i = ctx.index;
    debug!("thread {}: spawned", i);
    let client = ctx.factory.client(i);

    while !ctx.state.is_stop_requested() {
        let job = match ctx.queue.get(ctx.settings.poll_interval) {
            Ok(job) => job,
            Err(_) => {
                debug!("thread {}: job queue empty, will try again", i);
                continue;
            }
        };
        let reference = job.record.reference.clone();

        let Some(n) = ctx.state.begin_job() else {
            debug!("thread {}: {} dropped, stop requested", i, reference);
            ctx.queue.task_done();
            continue;
        };
        match ctx.settings.songs_total {
            Some(total) => info!(
                "thread {}: {} Processing song {} of {}",
                i,
                reference,
                ctx.settings.progress_base + n,
                total
            ),
            None => info!("thread {}: {} Processing song {}", i, reference, n),
        }

        let mut exhausted = false;
        match process_job(&client, &job.record, &ctx.settings, i) {
            Ok(JobOutcome::Uploaded) => info!("thread {}: {} Added successfully", i, reference),
            Ok(JobOutcome::AlreadyExists) => {
                info!("thread {}: {} Song already known to server, skipping", i, reference)
            }
            Ok(JobOutcome::DryRun) => {}
            Err(e) => {
                // The failure log carries these when a bar is drawn.
                if ctx.progress.is_some() {
                    info!("thread {}: {} {} ({})", i, reference, e, e.kind());
                } else {
                    warn!("thread {}: {} {} ({})", i, reference, e, e.kind());
                }
                exhausted = ctx.state.record_failure(&reference, e.to_string());
            }
        }

        ctx.queue.task_done();
        if let Some(bar) = &ctx.progress {
            update_progress_bar(bar, 1);
        }

        if exhausted && ctx.state.stop_signal().request() {
            match &ctx.progress {
                Some(bar) => write_above_bar(bar, "Maximum errors reached. Aborting."),
                None => warn!("Maximum errors reached. Aborting."),
            }
        }
    }

    debug!("thread {}: exiting", i);
}

/// Existence check, then upload unless the server already has the song.
pub fn process_job<C: UploadClient>(
    client: &C,
    record: &CatalogueRecord,
    settings: &WorkerSettings,
    worker: usize,
) -> Result<JobOutcome, UploadError> {
    debug!(
        "thread {}: checking if {} already exists",
        worker, record.reference
    );
    if client.exists(&record.reference)? {
        return Ok(JobOutcome::AlreadyExists);
    }
    info!("thread {}: {} Song is new, submitting", worker, record.reference);

    let song = build_new_song(record)?;
    if settings.dry_run {
        info!(
            "thread {}: {} dry run, would upload {} ({} bytes encoded)",
            worker,
            record.reference,
            record.path.display(),
            song.file.len()
        );
        return Ok(JobOutcome::DryRun);
    }

    let reference = record.reference.as_str();
    let mut on_progress = |p: UploadProgress| {
        debug!(
            "thread {}: {} uploaded {}/{} bytes",
            worker, reference, p.bytes_read, p.bytes_total
        );
        if p.is_complete() {
            info!("thread {}: {} Awaiting song analysis", worker, reference);
        }
    };
    client.upload(&song, settings.store, &mut on_progress)?;
    Ok(JobOutcome::Uploaded)
}

/// Build the upload payload: media file base64-encoded, autodetect fields left out.
pub fn build_new_song(record: &CatalogueRecord) -> Result<NewSong, UploadError> {
    let bytes = std::fs::read(&record.path).map_err(|e| {
        UploadError::Validation(format!("cannot read {}: {}", record.path.display(), e))
    })?;

    let year = match explicit(&record.year) {
        Some(s) => Some(s.parse::<i32>().map_err(|_| {
            UploadError::Validation(format!("year is not an integer: {s:?}"))
        })?),
        None => None,
    };
    let beats_per_minute = match explicit(&record.beats_per_minute) {
        Some(s) => Some(s.parse::<f64>().map_err(|_| {
            UploadError::Validation(format!("beats per minute is not a number: {s:?}"))
        })?),
        None => None,
    };

    Ok(NewSong {
        reference: record.reference.clone(),
        file: BASE64.encode(bytes),
        album: explicit(&record.album).map(str::to_string),
        artist: explicit(&record.artist).map(str::to_string),
        title: explicit(&record.title).map(str::to_string),
        genre: explicit(&record.genre).map(str::to_string),
        isrc: explicit(&record.isrc).map(str::to_string),
        beats_per_minute,
        year,
    })
}

/// Field value, unless absent or the autodetect marker.
fn explicit(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| *v != AUTODETECT)
}
