//! Producer: feeds catalogue records into the work queue.

use log::{debug, error, info};
use std::time::Duration;

use super::queue::WorkQueue;
use super::state::PipelineState;
use crate::error::CatalogueError;
use crate::{CatalogueRecord, Job};

/// What the producer did before handing over to shutdown.
#[derive(Debug, Default)]
pub struct ProducerSummary {
    /// Records put on the queue.
    pub enqueued: usize,
    /// Records before the offset.
    pub skipped: usize,
    /// Stop was observed before the catalogue was exhausted or drained.
    pub abandoned: bool,
    /// Catalogue error that stopped the producer.
    pub fatal: Option<CatalogueError>,
}

/// Enqueue every record from row `offset` (1-based) on, then wait for the workers to drain the
/// queue. Returns early when the stop flag is raised; a catalogue error raises it itself.
///
/// Rows before the offset are skipped unchecked, so a broken row there is not fatal. Syntax and
/// I/O errors are fatal wherever they occur.
pub fn run_producer<I>(
    records: I,
    queue: &WorkQueue<Job>,
    state: &PipelineState,
    offset: usize,
    block: Duration,
) -> ProducerSummary
where
    I: IntoIterator<Item = Result<CatalogueRecord, CatalogueError>>,
{
    let mut summary = ProducerSummary::default();

    for (line, record) in records.into_iter().enumerate().map(|(i, r)| (i + 1, r)) {
        let record = match record {
            Ok(record) => record,
            Err(e) if line < offset && e.is_row_error() => {
                debug!("producer: skipping broken row {} before offset: {}", line, e);
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                error!("producer: {}", e);
                summary.fatal = Some(e);
                state.stop_signal().request();
                return summary;
            }
        };
        if line < offset {
            summary.skipped += 1;
            continue;
        }
        debug!("producer: read row {} ({})", line, record.reference);

        let mut job = Job { line, record };
        loop {
            if state.is_stop_requested() {
                info!("producer: stop requested, abandoning remaining catalogue");
                summary.abandoned = true;
                return summary;
            }
            match queue.put(job, block) {
                Ok(()) => {
                    summary.enqueued += 1;
                    break;
                }
                Err(full) => {
                    debug!("producer: queue full, trying again");
                    job = full.into_inner();
                }
            }
        }
    }

    debug!(
        "producer: done reading rows ({} enqueued), waiting for workers to drain",
        summary.enqueued
    );
    if !queue.join_until(block, || state.is_stop_requested()) {
        summary.abandoned = true;
    }
    summary
}
