//! Import pipeline: bounded queue, producer, upload workers, error budget, shutdown.

pub mod budget;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod producer;
pub mod queue;
pub mod shutdown;
pub mod state;
pub mod worker;

pub use budget::{ErrorBudget, StopSignal};
pub use context::{PipelineTuning, resolve_worker_count};
pub use error_handler::{log_report, write_error_log};
pub use orchestrator::BatchImporter;
pub use producer::{ProducerSummary, run_producer};
pub use queue::{QueueEmpty, QueueFull, WorkQueue};
pub use shutdown::{Phase, ShutdownCoordinator};
pub use state::{PipelineState, StateSnapshot};
pub use worker::{JobOutcome, WorkerSettings, build_new_song, process_job, spawn_workers};
