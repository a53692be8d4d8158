//! `tracing` subscriber setup.
//!
//! CLI subcommands log to stderr. The TUI owns the terminal, so its logs go
//! to the file named by `INDICIUM_LOG_FILE` or nowhere.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

pub const LOG_FILE_ENV: &str = "INDICIUM_LOG_FILE";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Logging knobs, read after `.env` has been loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// `RUST_LOG`-style directive; `warn` when unset.
    pub directive: Option<String>,
    /// TUI log file.
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            directive: non_empty(EnvFilter::DEFAULT_ENV),
            file: non_empty(LOG_FILE_ENV).map(PathBuf::from),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        self.directive
            .as_deref()
            .and_then(|d| EnvFilter::try_new(d).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
    }
}

/// Log to stderr.
pub fn init_cli(settings: &LogSettings) {
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to the configured file, otherwise discard everything.
pub fn init_tui(settings: &LogSettings) -> Result<(), AppError> {
    let Some(path) = &settings.file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .with_writer(std::io::sink)
            .try_init();
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open log file '{}': {e}", path.display())))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
