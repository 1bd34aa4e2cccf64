//! API key loading: env var → .env in dir → secure prompt (when asked for).

use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use std::path::Path;

use crate::utils::config::ClientConsts;

fn non_empty_env(key: &str) -> Option<String> {
    let s = std::env::var(key).ok()?;
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

fn try_env_then_dotenv(dir: &Path) -> Option<String> {
    if let Some(s) = non_empty_env(ClientConsts::API_KEY_ENV) {
        return Some(s);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        return non_empty_env(ClientConsts::API_KEY_ENV);
    }
    None
}

/// Resolve the API key when none was given on the command line:
/// env (HELIOS_API_KEY) → .env in `dir` → prompt if `prompt` is set. `None` means the server is
/// contacted without a key.
pub fn get_api_key(dir: &Path, prompt: bool) -> Result<Option<String>> {
    if let Some(s) = try_env_then_dotenv(dir) {
        debug!("API key found in environment");
        return Ok(Some(s));
    }
    if !prompt {
        return Ok(None);
    }
    let label = format!("[{}]", env!("CARGO_PKG_NAME")).cyan().bold();
    let key = rpassword::prompt_password(format!("{} API key: ", label)).context("read API key")?;
    let key = key.trim().to_string();
    if key.is_empty() {
        info!("No API key entered, continuing without one");
        return Ok(None);
    }
    Ok(Some(key))
}
