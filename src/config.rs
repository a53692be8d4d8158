//! Provider configuration, read from the environment (and `.env`).
//!
//! Every key has a default so the dashboard runs with no setup at all; a
//! malformed value is a configuration error (exit code 2) rather than a
//! silent fallback.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::AppError;

/// Placeholder endpoints probed when `INDICIUM_SOURCES` is not set.
///
/// None of them serves a results table, so with these defaults the stats
/// query degrades to simulated data while the history query still proves
/// connectivity.
pub const DEFAULT_SOURCES: [&str; 3] = [
    "https://jsonplaceholder.typicode.com/posts/1",
    "https://jsonplaceholder.typicode.com/users/1",
    "https://jsonplaceholder.typicode.com/comments/1",
];

pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Endpoint URLs in priority order. `{year}` / `{round}` are substituted
    /// from the current filters.
    pub sources: Vec<String>,
    /// Per-endpoint request timeout.
    pub timeout: Duration,
    /// Attempt all endpoints at once; the earliest listed success still wins.
    pub parallel: bool,
    /// Seed for simulated data. `None` draws fresh randomness on every call.
    pub seed: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            parallel: false,
            seed: None,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let sources = match lookup("INDICIUM_SOURCES") {
            Some(raw) => {
                let list = parse_sources(&raw);
                if list.is_empty() {
                    warn!("INDICIUM_SOURCES is empty; every query will use simulated data");
                }
                list
            }
            None => {
                debug!("INDICIUM_SOURCES not set, using built-in endpoints");
                defaults.sources
            }
        };

        let timeout_ms: u64 = try_load(&lookup, "INDICIUM_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(AppError::new(2, "INDICIUM_TIMEOUT_MS must be > 0."));
        }

        let parallel = try_load(&lookup, "INDICIUM_PARALLEL", false)?;
        let seed = match lookup("INDICIUM_SEED") {
            Some(raw) => Some(parse_value::<u64>("INDICIUM_SEED", &raw)?),
            None => None,
        };

        Ok(Self {
            sources,
            timeout: Duration::from_millis(timeout_ms),
            parallel,
            seed,
        })
    }
}

/// Split a comma-separated endpoint list, dropping blanks.
pub fn parse_sources(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::new(2, format!("Invalid {key} value '{raw}': {e}")))
}
