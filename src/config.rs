use std::path::PathBuf;
use std::time::Duration;

use log::warn;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_POLL_SECS: u64 = 5;
pub const DEBUG_POLL_SECS: u64 = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const POINT_CACHE_FILE: &str = "area_points.json";

/// Runtime settings of the console.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir,
        }
    }

    /// Defaults overridden by the `JUNCTION_CONSOLE_*` environment variables.
    pub fn from_env(data_dir: PathBuf) -> Self {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(data_dir: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new(data_dir);

        if let Some(url) = lookup("JUNCTION_CONSOLE_API_URL") {
            let url = url.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_base_url = url.trim_end_matches('/').to_string();
            } else {
                warn!("ignoring JUNCTION_CONSOLE_API_URL={url:?}: not an http(s) URL");
            }
        }

        let debug_mode = lookup("JUNCTION_CONSOLE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            config.poll_interval = Duration::from_secs(DEBUG_POLL_SECS);
        }

        if let Some(secs) = seconds(&lookup, "JUNCTION_CONSOLE_POLL_SECS") {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = seconds(&lookup, "JUNCTION_CONSOLE_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn point_cache_path(&self) -> PathBuf {
        self.data_dir.join(POINT_CACHE_FILE)
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(secs),
        _ => {
            warn!("ignoring {key}={raw:?}: expected a positive number of seconds");
            None
        }
    }
}
