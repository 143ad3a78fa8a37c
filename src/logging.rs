//! File logging. The terminal belongs to the TUI, so nothing is written to
//! stdout or stderr once the subscriber is installed.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, default_state_dir};
use crate::errors::AppError;

const LOG_FILE_PREFIX: &str = "siffy.log";

/// Configured directory, else `<state dir>/logs`, else `./logs`.
fn log_dir(settings: &LoggingSettings) -> PathBuf {
    settings
        .directory
        .clone()
        .or_else(|| default_state_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// `RUST_LOG` when set, else the configured directive, else `info`.
fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing to a daily rolling file.
///
/// Keep the returned guard alive for the whole run; dropping it flushes and
/// stops the writer thread.
pub fn init(settings: &LoggingSettings) -> Result<WorkerGuard, AppError> {
    let dir = log_dir(settings);
    fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(env_filter(settings))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
