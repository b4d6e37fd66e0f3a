// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: directories, exclusive lock, logging.

use aires_config::Config;
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] aires_config::ConfigError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] aires_engine::PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem layout derived from one config snapshot.
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub alert_dir: PathBuf,
    pub log_dir: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
}

impl DaemonPaths {
    pub fn from_config(config: &Config) -> Self {
        let log_dir = config.directories.log_directory.clone();
        Self {
            input_dir: config.directories.input_directory.clone(),
            output_dir: config.directories.output_directory.clone(),
            temp_dir: config.directories.temp_directory.clone(),
            alert_dir: config.directories.alert_directory.clone(),
            lock_path: log_dir.join("aires.pid"),
            log_path: log_dir.join("aires.log"),
            log_dir,
        }
    }

    /// Create every directory the service needs, including the trays.
    pub fn ensure(&self) -> Result<(), DaemonError> {
        for dir in [
            &self.input_dir,
            &self.output_dir,
            &self.temp_dir,
            &self.alert_dir,
            &self.log_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::create_dir_all(self.input_dir.join(crate::watchdog::PROCESSED_TRAY))?;
        std::fs::create_dir_all(self.input_dir.join(crate::watchdog::FAILED_TRAY))?;
        Ok(())
    }
}

/// Acquire the exclusive PID lock so two daemons never watch one inbox.
/// The lock releases when the returned file drops.
pub fn acquire_lock(lock_path: &Path) -> Result<File, DaemonError> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Avoid truncating before the lock is held, which would wipe the
    // running daemon's PID.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(DaemonError::LockFailed)?;

    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Startup marker prefix written to the log before tracing is up, so a
/// supervisor can find where the current startup attempt begins.
/// Full format: "--- aires: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- aires: starting (pid: ";

/// Append the startup marker to the log file.
pub fn write_startup_marker(paths: &DaemonPaths) -> Result<(), DaemonError> {
    std::fs::create_dir_all(&paths.log_dir)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (aires.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `aires.log` → `aires.log.1` → `aires.log.2` → `aires.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Set up file logging for daemon mode. The returned guard must live as
/// long as the process logs.
pub fn setup_logging(
    paths: &DaemonPaths,
    level: &str,
) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&paths.log_dir)?;
    rotate_log_if_needed(&paths.log_path);

    let file_name = paths
        .log_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "aires.log".to_string());
    let file_appender = tracing_appender::rolling::never(&paths.log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
