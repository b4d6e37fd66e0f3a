// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic booklet persistence under the output root.
//!
//! Writes go to `<path>.tmp` then rename, which is atomic on one
//! filesystem, so readers never observe a half-written booklet.

use crate::error::PipelineError;
use crate::render::render_markdown;
use aires_core::{Booklet, HealthStatus};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Free space below this is Unhealthy.
const CRITICAL_DISK_MB_DEFAULT: u64 = 100;

/// Free space below this (but above critical) is Degraded.
const WARNING_DISK_MB_DEFAULT: u64 = 500;

#[derive(Debug, Clone)]
pub struct BookletWriter {
    root: PathBuf,
    critical_disk_mb: u64,
    warning_disk_mb: u64,
}

impl BookletWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            critical_disk_mb: CRITICAL_DISK_MB_DEFAULT,
            warning_disk_mb: WARNING_DISK_MB_DEFAULT,
        }
    }

    pub fn with_disk_thresholds(mut self, critical_mb: u64, warning_mb: u64) -> Self {
        self.critical_disk_mb = critical_mb;
        self.warning_disk_mb = warning_mb;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Render and write the booklet at `{root}/{relative}`. Returns the
    /// final absolute path.
    pub fn save(&self, booklet: &Booklet, relative: &Path) -> Result<PathBuf, PipelineError> {
        if relative.is_absolute() {
            return Err(PipelineError::SaveError(format!(
                "booklet path must be relative: {}",
                relative.display()
            )));
        }

        let final_path = self.root.join(relative);
        let parent = final_path
            .parent()
            .ok_or_else(|| PipelineError::SaveDirNotFound(final_path.display().to_string()))?;
        std::fs::create_dir_all(parent).map_err(|e| map_io_error(parent, e))?;

        let markdown = render_markdown(booklet);
        let tmp_path = final_path.with_extension("md.tmp");
        std::fs::write(&tmp_path, markdown).map_err(|e| map_io_error(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            map_io_error(&final_path, e)
        })?;

        tracing::info!(
            booklet_id = %booklet.booklet_id,
            path = %final_path.display(),
            "booklet saved"
        );
        Ok(final_path)
    }

    /// Output-root health: exists or creatable, writable, and enough free
    /// space.
    pub fn health_status(&self) -> HealthStatus {
        if let Err(e) = std::fs::create_dir_all(&self.root) {
            return HealthStatus::unhealthy(
                "persistence",
                format!("output root not creatable: {e}"),
            );
        }

        // Probe writability with a real file.
        let probe = self.root.join(".aires-health-probe");
        if let Err(e) = std::fs::write(&probe, b"probe") {
            return HealthStatus::unhealthy("persistence", format!("output root not writable: {e}"));
        }
        let _ = std::fs::remove_file(&probe);

        let free_mb = match fs2::available_space(&self.root) {
            Ok(bytes) => bytes / (1024 * 1024),
            Err(e) => {
                return HealthStatus::degraded(
                    "persistence",
                    format!("free-space check failed: {e}"),
                )
            }
        };
        if free_mb < self.critical_disk_mb {
            return HealthStatus::unhealthy(
                "persistence",
                format!("only {free_mb} MB free (critical: {} MB)", self.critical_disk_mb),
            )
            .with_diagnostic("free_mb", free_mb.to_string());
        }
        if free_mb < self.warning_disk_mb {
            return HealthStatus::degraded(
                "persistence",
                format!("only {free_mb} MB free (warning: {} MB)", self.warning_disk_mb),
            )
            .with_diagnostic("free_mb", free_mb.to_string());
        }
        HealthStatus::healthy("persistence").with_diagnostic("free_mb", free_mb.to_string())
    }
}

fn map_io_error(path: &Path, e: std::io::Error) -> PipelineError {
    let detail = format!("{}: {}", path.display(), e);
    match e.kind() {
        ErrorKind::PermissionDenied => PipelineError::SaveUnauthorized(detail),
        ErrorKind::NotFound => PipelineError::SaveDirNotFound(detail),
        _ => PipelineError::SaveError(detail),
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
