//! Public and internal types for the import API and pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::utils::config::PipelineConsts;

/// Field value telling the server to detect the field itself from the media.
pub const AUTODETECT: &str = "<AUTODETECT>";

/// One row of the input catalogue. `reference` and `path` are always non-empty.
///
/// Optional fields keep the distinction between absent (`None`) and an empty cell (`Some("")`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogueRecord {
    /// Unique key of the song within the catalogue (and on the server).
    pub reference: String,
    /// Local media file to upload.
    pub path: PathBuf,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub isrc: Option<String>,
    pub beats_per_minute: Option<String>,
    pub year: Option<String>,
}

/// A catalogue record waiting in the work queue or held by a worker.
#[derive(Clone, Debug)]
pub struct Job {
    /// 1-based row index in the catalogue.
    pub line: usize,
    pub record: CatalogueRecord,
}

/// A job that could not be completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureRecord {
    pub reference: String,
    pub message: String,
}

/// Settings for one [`BatchImporter`](crate::pipeline::BatchImporter) run.
///
/// `workers` must already be resolved (see
/// [`resolve_worker_count`](crate::pipeline::resolve_worker_count)); a value of 0 is treated
/// as 1.
#[derive(Clone, Debug)]
pub struct ImportSettings {
    /// Number of upload worker threads.
    pub workers: usize,
    /// Work queue capacity. When None, equals `workers`.
    pub queue_capacity: Option<usize>,
    /// Tolerated per-song failures before aborting. 0 means unlimited.
    pub max_errors: u32,
    /// 1-based catalogue row to start at. Rows before it are skipped.
    pub offset: usize,
    /// Log what would be uploaded without uploading.
    pub dry_run: bool,
    /// Ask the server to keep the song after analysis.
    pub store: bool,
    /// How long a blocked queue operation waits before re-checking the stop flag.
    pub poll_interval: Duration,
    /// Total songs in the catalogue, for progress messages. Unknown when None.
    pub songs_total: Option<usize>,
    /// Show a progress bar over `songs_total`.
    pub show_progress: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: None,
            max_errors: PipelineConsts::DEFAULT_MAX_ERRORS,
            offset: 1,
            dry_run: false,
            store: true,
            poll_interval: PipelineConsts::POLL_INTERVAL,
            songs_total: None,
            show_progress: false,
        }
    }
}

impl ImportSettings {
    /// Offset clamped to the first row.
    pub fn first_row(&self) -> usize {
        self.offset.max(1)
    }
}

/// What a finished run hands back to the caller.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Configured budget (0 = unlimited).
    pub max_errors: u32,
    /// Budget left after the run; negative once exceeded.
    pub errors_remaining: i64,
    /// Failures in completion order.
    pub failures: Vec<FailureRecord>,
    /// Jobs a worker started on.
    pub songs_processed: usize,
    /// Records the producer put on the queue.
    pub enqueued: usize,
    /// Records skipped because they came before the offset.
    pub skipped: usize,
    /// Enqueued records that were never processed because stop came first.
    pub abandoned: usize,
    /// The error budget ran out and aborted the run.
    pub budget_exhausted: bool,
    /// Stop was requested from outside (e.g. Ctrl+C).
    pub cancelled: bool,
    /// Fatal catalogue error that stopped the producer.
    pub fatal: Option<String>,
}

impl ImportReport {
    /// Overall success.
    ///
    /// A finite budget is a tolerance for *continuing*, not for declaring success: one failure
    /// under `max_errors > 0` makes the run unsuccessful even though the budget was not
    /// exhausted. With an unlimited budget the run succeeds when it completed, whatever the
    /// number of failures.
    pub fn is_success(&self) -> bool {
        if self.fatal.is_some() || self.cancelled {
            return false;
        }
        self.max_errors == 0 || self.errors_remaining == i64::from(self.max_errors)
    }
}

/// Full options for the CLI: connection, catalogue and pipeline settings.
#[derive(Clone, Debug)]
pub struct Opts {
    pub catalogue: PathBuf,
    pub delimiter: u8,
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub api_key: Option<String>,
    pub prompt_api_key: bool,
    pub timeout_connect: Duration,
    pub timeout_read: Duration,
    pub max_errors: u32,
    pub store: bool,
    pub offset: usize,
    /// Requested worker count. 0 = use the server's core count.
    pub threads: usize,
    /// Upper bound for the worker count.
    pub max_threads: usize,
    pub dry_run: bool,
    pub verbose: bool,
    /// Draw a progress bar (per-song messages are then suppressed).
    pub progress: bool,
    /// Where to write failures as CSV when the run had any.
    pub error_log: Option<PathBuf>,
}

impl Opts {
    /// Defaults for everything but the catalogue path.
    pub fn new(catalogue: PathBuf) -> Self {
        let client = crate::client::ClientConfig::default();
        Self {
            catalogue,
            delimiter: b',',
            host: client.host,
            port: client.port,
            tls: client.tls,
            api_key: None,
            prompt_api_key: false,
            timeout_connect: client.timeout_connect,
            timeout_read: client.timeout_read,
            max_errors: PipelineConsts::DEFAULT_MAX_ERRORS,
            store: true,
            offset: 1,
            threads: 0,
            max_threads: crate::utils::config::WorkerLimits::MAX_WORKERS,
            dry_run: false,
            verbose: false,
            progress: false,
            error_log: None,
        }
    }

    pub fn client_config(&self) -> crate::client::ClientConfig {
        crate::client::ClientConfig {
            host: self.host.clone(),
            port: self.port,
            tls: self.tls,
            api_key: self.api_key.clone(),
            timeout_connect: self.timeout_connect,
            timeout_read: self.timeout_read,
        }
    }
}
