//! helios-import CLI: batch import a song catalogue; use --dry-run to check without uploading.

use anyhow::Result;
use clap::Parser;
use helios_import::engine::Cli;
use helios_import::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let success = handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    if !success {
        std::process::exit(1);
    }
    Ok(())
}
