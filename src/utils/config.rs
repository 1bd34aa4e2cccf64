//! Application configuration constants.
//! Defaults and limits in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    error_log_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                error_log_filename: format!("{pkg}.errors.csv"),
            }
        })
    }

    /// Optional settings file looked up in the working directory.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Error log name used when `--error-log` is given without a path.
    pub fn error_log_filename(&self) -> &str {
        &self.error_log_filename
    }
}

// ---- Worker threads ----

/// Bounds for the resolved worker count.
#[derive(Clone, Copy, Debug)]
pub struct WorkerLimits {
    /// Never fewer workers than this.
    pub floor: usize,
    /// Never more workers than this (also caps the server's core count).
    pub max: usize,
}

impl Default for WorkerLimits {
    fn default() -> Self {
        Self {
            floor: Self::FLOOR_WORKERS,
            max: Self::MAX_WORKERS,
        }
    }
}

impl WorkerLimits {
    pub const FLOOR_WORKERS: usize = 1;
    pub const MAX_WORKERS: usize = 32;

    pub fn with_max(max: usize) -> Self {
        Self {
            max: max.max(Self::FLOOR_WORKERS),
            ..Self::default()
        }
    }
}

// ---- Pipeline ----

pub struct PipelineConsts;

impl PipelineConsts {
    /// How long blocked queue operations wait before re-checking the stop flag.
    pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Tolerated per-song failures when nothing else is configured.
    pub const DEFAULT_MAX_ERRORS: u32 = 2;
}

// ---- Server connection ----

pub struct ClientConsts;

impl ClientConsts {
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 6440;
    pub const TIMEOUT_CONNECT: Duration = Duration::from_secs(15);
    /// Uploads wait for server-side analysis before the response arrives.
    pub const TIMEOUT_READ: Duration = Duration::from_secs(300);
    pub const USER_AGENT: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
    /// Environment variable holding the API key.
    pub const API_KEY_ENV: &'static str = "HELIOS_API_KEY";
}
