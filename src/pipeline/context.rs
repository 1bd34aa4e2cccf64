//! Pipeline sizing: resolve the worker count once, before the pipeline is built.

use anyhow::Result;
use log::debug;

use crate::utils::config::WorkerLimits;

/// Worker count and queue capacity for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineTuning {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl PipelineTuning {
    /// Queue capacity defaults to one slot per worker.
    pub fn new(workers: usize, queue_capacity: Option<usize>) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            queue_capacity: queue_capacity.unwrap_or(workers).max(1),
        }
    }
}

/// Resolve `requested` workers: 0 asks `server_cores` (called only then). The result is
/// clamped to `limits`.
pub fn resolve_worker_count<F>(
    requested: usize,
    limits: WorkerLimits,
    server_cores: F,
) -> Result<usize>
where
    F: FnOnce() -> Result<usize>,
{
    let wanted = if requested == 0 {
        let cores = server_cores()?;
        debug!("Server reports {} logical cores", cores);
        cores
    } else {
        requested
    };
    let workers = wanted.clamp(limits.floor, limits.max.max(limits.floor));
    if workers != wanted {
        debug!("Capping workers {} -> {}", wanted, workers);
    }
    Ok(workers)
}
