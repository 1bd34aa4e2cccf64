use anyhow::{Context, Result};
use std::path::Path;

use crate::{FailureRecord, ImportReport};

/// Write failures as CSV (`reference,message`), in completion order.
pub fn write_error_log(path: &Path, failures: &[FailureRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create error log {}", path.display()))?;
    writer.write_record(["reference", "message"])?;
    for failure in failures {
        writer.write_record([failure.reference.as_str(), failure.message.as_str()])?;
    }
    writer
        .flush()
        .with_context(|| format!("write error log {}", path.display()))?;
    Ok(())
}

/// Log the end-of-run state: fatal catalogue error, budget abort, failures.
/// Call after `start` returned.
pub fn log_report(report: &ImportReport, verbose: bool) {
    if let Some(msg) = &report.fatal {
        log::error!("Catalogue could not be read: {}", msg);
    }
    if report.budget_exhausted {
        log::error!(
            "Maximum errors reached (set to {}). Import aborted.",
            report.max_errors
        );
    }
    if report.abandoned > 0 {
        log::warn!("{} queued songs were not processed", report.abandoned);
    }
    if !report.failures.is_empty() {
        log::warn!("{} songs failed", report.failures.len());
        if verbose {
            for f in &report.failures {
                eprintln!("  failed: {}: {}", f.reference, f.message);
            }
        }
    }
}
