//! CLI command handler: resolve options, check the server, run the batch import, report.

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalogue::{CatalogueReader, count_records};
use crate::client::{HeliosClient, HttpClientFactory};
use crate::engine::arg_parser::Cli;
use crate::pipeline::{BatchImporter, log_report, resolve_worker_count, write_error_log};
use crate::utils::config::{PackagePaths, PipelineConsts, WorkerLimits};
use crate::utils::{Colors, apply_file_to_opts, get_api_key, load_import_toml, setup_logging};
use crate::{ImportReport, ImportSettings, Opts};

/// Defaults, then the settings file in `config_dir`, then the command line.
pub fn setup_opts(cli: &Cli, config_dir: &Path) -> Opts {
    let mut opts = Opts::new(cli.catalogue.clone());
    if let Some(file) = load_import_toml(config_dir) {
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    opts
}

/// Overwrite opts with every flag given on the command line.
pub fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    if let Some(c) = cli.delimiter {
        match u8::try_from(c) {
            Ok(b) if c.is_ascii() => opts.delimiter = b,
            _ => eprintln!("ignoring non-ASCII delimiter {:?}", c),
        }
    }
    if let Some(n) = cli.max_errors {
        opts.max_errors = n;
    }
    if let Some(no_store) = cli.no_store {
        opts.store = !no_store;
    }
    if let Some(offset) = cli.offset {
        opts.offset = offset.max(1);
    }
    if let Some(n) = cli.threads {
        opts.threads = n;
    }
    if let Some(n) = cli.max_threads {
        opts.max_threads = n;
    }
    if let Some(dry_run) = cli.dry_run {
        opts.dry_run = dry_run;
    }
    match &cli.error_log {
        Some(Some(p)) => opts.error_log = Some(p.clone()),
        Some(None) => opts.error_log = Some(PathBuf::new()),
        None => {}
    }
    if let Some(ref host) = cli.host {
        opts.host = host.clone();
    }
    if let Some(port) = cli.port {
        opts.port = port;
    }
    if cli.api_key.is_some() {
        opts.api_key = cli.api_key.clone();
    }
    opts.prompt_api_key = cli.prompt_api_key;
    if let Some(disabled) = cli.tls_disabled {
        opts.tls = !disabled;
    }
    if let Some(secs) = cli.timeout_connect {
        opts.timeout_connect = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.timeout_read {
        opts.timeout_read = Duration::from_secs(secs);
    }
    if let Some(progress) = cli.progress {
        opts.progress = progress;
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }
}

/// Error log destination: an empty path (flag given without value) means the default name.
pub fn error_log_path(opts: &Opts) -> Option<PathBuf> {
    opts.error_log.as_ref().map(|p| {
        if p.as_os_str().is_empty() {
            PathBuf::from(PackagePaths::get().error_log_filename())
        } else {
            p.clone()
        }
    })
}

/// Run the import described by `cli`. Returns whether the run counts as successful.
pub fn handle_run(cli: &Cli) -> Result<bool> {
    let cwd = std::env::current_dir().context("get current directory")?;
    let mut opts = setup_opts(cli, &cwd);
    setup_logging(opts.verbose, opts.progress);

    if opts.api_key.is_none() {
        opts.api_key = get_api_key(&cwd, opts.prompt_api_key)?;
    }
    if opts.dry_run {
        warn!("RUNNING IN DRY-RUN MODE. NO SONGS WILL BE UPLOADED.");
    }

    let songs_total = count_records(&opts.catalogue)?;
    info!(
        "{} songs in {}",
        songs_total,
        opts.catalogue.display()
    );

    let client_config = opts.client_config();
    let status = HeliosClient::new(&client_config)
        .server_status()
        .with_context(|| format!("query server status at {}", client_config.base_url()))?;
    info!(
        "Server at {} is up with {} songs",
        client_config.base_url(),
        status.songs
    );

    let workers = resolve_worker_count(
        opts.threads,
        WorkerLimits::with_max(opts.max_threads),
        || Ok(status.cpu.cores),
    )?;

    let settings = ImportSettings {
        workers,
        queue_capacity: None,
        max_errors: opts.max_errors,
        offset: opts.offset,
        dry_run: opts.dry_run,
        store: opts.store,
        poll_interval: PipelineConsts::POLL_INTERVAL,
        songs_total: Some(songs_total),
        show_progress: opts.progress,
    };
    let importer = BatchImporter::new(settings, HttpClientFactory::new(client_config));

    let stop = importer.stop_signal();
    ctrlc::set_handler(move || {
        if stop.request() {
            eprintln!("Aborting, please wait a moment...");
        }
    })
    .context("set Ctrl+C handler")?;

    let reader = CatalogueReader::from_path(&opts.catalogue, opts.delimiter)?;
    let report = importer.start(reader)?;
    drop(importer);

    log_report(&report, opts.verbose);
    if !report.failures.is_empty()
        && let Some(path) = error_log_path(&opts)
    {
        write_error_log(&path, &report.failures)?;
        info!(
            "Wrote {} failures to {}",
            report.failures.len(),
            path.display()
        );
    }
    print_summary(&report);
    Ok(report.is_success())
}

fn print_summary(report: &ImportReport) {
    let failed = report.failures.len();
    let done = report.songs_processed.saturating_sub(failed);
    let not_processed = report.abandoned + report.skipped;
    println!(
        "{}  {}  {}",
        Colors::colorize(Colors::SUCCESS, &format!("Processed: {}", done)),
        Colors::colorize(Colors::FAILURE, &format!("Failed: {}", failed)),
        Colors::colorize(Colors::SKIPPED, &format!("Not processed: {}", not_processed))
    );
}
