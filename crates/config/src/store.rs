// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot-reloadable configuration store.
//!
//! Readers take an `Arc<Config>` snapshot and never lock. Reload builds a
//! fresh snapshot and swaps the pointer; a `Get` racing a `Reload` observes
//! either the whole old snapshot or the whole new one. Writes (`set`) take an
//! exclusive file lock for the read-modify-write cycle, then reload.

use crate::document::Document;
use crate::sections::Config;
use aires_core::HealthStatus;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors from configuration operations. Each carries a stable code.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config validation failed: {0}")]
    Validation(String),

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Stable machine-readable code for logs and alerts.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Load { .. } => "CONFIG_LOAD_ERROR",
            ConfigError::Validation(_) => "CONFIG_VALIDATION_ERROR",
            ConfigError::Write { .. } => "CONFIG_LOAD_ERROR",
        }
    }
}

/// Shared handle to the configuration file and its current snapshot.
pub struct ConfigStore {
    path: PathBuf,
    snapshot: RwLock<Arc<Config>>,
    /// Serializes reloads process-wide. Readers never take it.
    reload_lock: Mutex<()>,
}

impl ConfigStore {
    /// Load the INI file at `path` and build the first snapshot.
    pub fn load(path: impl Into<PathBuf>) -> Result<Arc<Self>, ConfigError> {
        let path = path.into();
        let config = read_snapshot(&path)?;
        Ok(Arc::new(Self {
            path,
            snapshot: RwLock::new(Arc::new(config)),
            reload_lock: Mutex::new(()),
        }))
    }

    /// Create a store from defaults when no file exists yet (used by `once`
    /// mode on a bare machine). `reload` will error until a file appears.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            snapshot: RwLock::new(Arc::new(Config::default_config())),
            reload_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current immutable snapshot. Never blocks on reloads in progress
    /// beyond the pointer read.
    pub fn get(&self) -> Arc<Config> {
        Arc::clone(&self.snapshot.read())
    }

    /// Re-read the file and atomically swap the snapshot.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let _guard = self.reload_lock.lock();
        let config = read_snapshot(&self.path)?;
        *self.snapshot.write() = Arc::new(config);
        Ok(())
    }

    /// Rewrite one `section.key` in the file, preserving comments and
    /// unrelated lines, then reload. The read-modify-write cycle runs under
    /// an exclusive file lock.
    pub fn set(&self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        {
            let mut file = std::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.path)
                .map_err(|e| ConfigError::Write {
                    path: self.path.clone(),
                    source: e,
                })?;
            file.lock_exclusive().map_err(|e| ConfigError::Write {
                path: self.path.clone(),
                source: e,
            })?;

            let result = rewrite_locked(&mut file, section, key, value);
            let _ = fs2::FileExt::unlock(&file);
            result.map_err(|e| ConfigError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }

        tracing::info!(section, key, value, "config value updated");
        self.reload()
    }

    /// Health per the config rules: missing/unreadable file or a critical
    /// violation is Unhealthy; binding fallbacks degrade.
    pub fn health_status(&self) -> HealthStatus {
        if !self.path.exists() {
            return HealthStatus::unhealthy(
                "config",
                format!("config file missing: {}", self.path.display()),
            );
        }
        if std::fs::read_to_string(&self.path).is_err() {
            return HealthStatus::unhealthy(
                "config",
                format!("config file unreadable: {}", self.path.display()),
            );
        }

        let snapshot = self.get();
        let violations = snapshot.critical_violations();
        if !violations.is_empty() {
            let mut status = HealthStatus::unhealthy("config", violations[0].clone());
            status.failure_reasons = violations;
            return status;
        }
        if !snapshot.warnings.is_empty() {
            let mut status = HealthStatus::degraded("config", snapshot.warnings[0].clone());
            status.failure_reasons = snapshot.warnings.clone();
            return status;
        }
        HealthStatus::healthy("config")
            .with_diagnostic("path", self.path.display().to_string())
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .finish()
    }
}

fn read_snapshot(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc = Document::parse(&text);
    let config = Config::bind(&doc);
    for warning in &config.warnings {
        tracing::warn!(%warning, "config bound with fallback");
    }
    Ok(config)
}

/// In-place edit of the already-locked file handle.
fn rewrite_locked(
    file: &mut std::fs::File,
    section: &str,
    key: &str,
    value: &str,
) -> std::io::Result<()> {
    let mut text = String::new();
    file.read_to_string(&mut text)?;

    let mut doc = Document::parse(&text);
    doc.set(section, key, value);
    let updated = doc.to_text();

    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(updated.as_bytes())?;
    file.flush()
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
