//! Progress bar utilities for displaying import status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

/// Shared progress bar; workers update it, the importer refreshes it at the end.
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Force a refresh of the bar (e.g. so the final count is drawn after the last update).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " songs"
    )))
}

/// Advance the bar by `n`. One update per song, so waiting on the lock is cheap.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    let mut pb = pb.lock().unwrap_or_else(|e| e.into_inner());
    let _ = pb.update(n);
}

/// Print `msg` above the bar without tearing it.
pub fn write_above_bar(pb: &ProgressBar, msg: &str) {
    let mut pb = pb.lock().unwrap_or_else(|e| e.into_inner());
    let _ = pb.write(msg);
}
