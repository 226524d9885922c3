//! Logging bootstrap.
//!
//! File-based tracing under `<home>/logs/` so CLI output stays clean.
//! Filtered via `KHETSETU_LOG` (default `khetsetu_core=info`).

use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::paths;

/// Initializes the global tracing subscriber with a daily-rotated log file.
///
/// Returns a guard that must be held for the lifetime of the process so
/// buffered log lines are flushed on exit.
///
/// # Errors
/// Returns an error if the log directory cannot be created.
pub fn init() -> Result<WorkerGuard> {
    let logs_dir = paths::logs_dir();
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&logs_dir, "khetsetu.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env("KHETSETU_LOG")
        .unwrap_or_else(|_| EnvFilter::new("khetsetu_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
