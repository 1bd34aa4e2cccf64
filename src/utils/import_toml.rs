//! Load `.helios-import.toml` from the working directory (CLI only). Library callers build
//! [`ImportSettings`](crate::ImportSettings) themselves.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct ImportToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    host: Option<String>,
    port: Option<u16>,
    tls: Option<bool>,
    timeout_connect: Option<u64>,
    timeout_read: Option<u64>,
    delimiter: Option<char>,
    max_errors: Option<u32>,
    store: Option<bool>,
    threads: Option<usize>,
    max_threads: Option<usize>,
    verbose: Option<bool>,
    progress: Option<bool>,
    error_log: Option<String>,
}

/// Load the settings file from `dir` if present. Returns None if missing or unreadable.
pub fn load_import_toml(dir: &Path) -> Option<ImportToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_import_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_import_toml(s: &str) -> Result<ImportToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field {
            $opts.$field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying the CLI.
/// The catalogue path, offset, dry run and API key are never read from the file.
pub fn apply_file_to_opts(file: &ImportToml, opts: &mut Opts) {
    let s = &file.settings;
    if let Some(ref host) = s.host {
        opts.host = host.clone();
    }
    apply_file_opt!(s, opts, port);
    apply_file_opt!(s, opts, tls);
    apply_file_opt!(s, opts, max_errors);
    apply_file_opt!(s, opts, store);
    apply_file_opt!(s, opts, threads);
    apply_file_opt!(s, opts, max_threads);
    apply_file_opt!(s, opts, verbose);
    apply_file_opt!(s, opts, progress);
    if let Some(secs) = s.timeout_connect {
        opts.timeout_connect = Duration::from_secs(secs);
    }
    if let Some(secs) = s.timeout_read {
        opts.timeout_read = Duration::from_secs(secs);
    }
    if let Some(c) = s.delimiter {
        match u8::try_from(c) {
            Ok(b) if c.is_ascii() => opts.delimiter = b,
            _ => log::warn!("ignoring non-ASCII delimiter {:?} in settings file", c),
        }
    }
    if let Some(ref p) = s.error_log {
        opts.error_log = Some(PathBuf::from(p));
    }
}
