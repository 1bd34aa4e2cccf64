use clap::Parser;
use std::path::PathBuf;

/// Batch import a song catalogue into a Helios server.
#[derive(Clone, Debug, Parser)]
#[command(name = "helios-import", version)]
#[command(about = "Batch import songs into Helios; use --dry-run to check without uploading.")]
pub struct Cli {
    /// Path to input catalogue file.
    /// CSV columns: reference, album, artist, title, genre, isrc, year, path[, bpm].
    #[arg(value_name = "CATALOGUE")]
    pub catalogue: PathBuf,

    /// Delimiter character to use. Default: comma.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Maximum number of errors to tolerate before aborting. 0 = unlimited.
    #[arg(long)]
    pub max_errors: Option<u32>,

    /// Delete each song on the server right after analysis instead of storing it.
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub no_store: Option<bool>,

    /// 1-based catalogue row to begin processing on.
    #[arg(long)]
    pub offset: Option<usize>,

    /// Number of concurrent uploads. 0 = number of logical cores on the server.
    #[arg(long, short = 't')]
    pub threads: Option<usize>,

    /// Upper bound for the number of concurrent uploads.
    #[arg(long)]
    pub max_threads: Option<usize>,

    /// Check the catalogue and the server, but do not upload anything.
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub dry_run: Option<bool>,

    /// Write failed songs to this CSV file. Without a value: `helios-import.errors.csv`.
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    pub error_log: Option<Option<PathBuf>>,

    /// IP address or host name of the server.
    #[arg(long)]
    pub host: Option<String>,

    /// Port the server is listening on. Default: 6440.
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// API key sent with each request (or HELIOS_API_KEY / .env).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Prompt for the API key when none is configured.
    #[arg(long)]
    pub prompt_api_key: bool,

    /// Disable encryption.
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub tls_disabled: Option<bool>,

    /// Connect timeout in seconds.
    #[arg(long)]
    pub timeout_connect: Option<u64>,

    /// Read timeout in seconds.
    #[arg(long)]
    pub timeout_read: Option<u64>,

    /// Show a progress bar instead of per-song messages.
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub progress: Option<bool>,

    /// Verbose output.
    #[arg(
        long,
        short = 'v',
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub verbose: Option<bool>,
}
