// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox watchdog: polls the input directory and feeds the queue.
//!
//! A file is eligible when its extension is allowlisted, its modification
//! time is older than the age threshold (debouncing writers that are still
//! appending), and its size is under the cap. Rejected-for-capacity files
//! are simply reconsidered on the next poll.

use crate::queue::{EnqueueOutcome, JobQueue};
use aires_core::{CancelToken, Clock, Job};
use aires_engine::Metrics;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Tray subdirectories never polled.
pub const PROCESSED_TRAY: &str = "processed";
pub const FAILED_TRAY: &str = "failed";

#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    pub poll_interval: Duration,
    pub file_age_threshold: Duration,
    pub max_file_size_mb: u64,
    /// Allowed extensions with leading dot, e.g. ".txt".
    pub allowed_extensions: Vec<String>,
}

pub struct Watchdog<C> {
    input_dir: std::path::PathBuf,
    config: WatchdogConfig,
    queue: Arc<JobQueue>,
    metrics: Arc<Metrics>,
    clock: C,
}

impl<C: Clock> Watchdog<C> {
    pub fn new(
        input_dir: impl Into<std::path::PathBuf>,
        config: WatchdogConfig,
        queue: Arc<JobQueue>,
        metrics: Arc<Metrics>,
        clock: C,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            config,
            queue,
            metrics,
            clock,
        }
    }

    /// Poll until cancelled.
    pub async fn run(&self, ctx: CancelToken) {
        tracing::info!(
            input_dir = %self.input_dir.display(),
            interval_s = self.config.poll_interval.as_secs(),
            "watchdog started"
        );
        loop {
            self.scan_once();
            tokio::select! {
                _ = ctx.cancelled() => {
                    tracing::info!("watchdog stopped");
                    return;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// One poll pass. Public for tests and for `run` itself.
    pub fn scan_once(&self) {
        let entries = match std::fs::read_dir(&self.input_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    input_dir = %self.input_dir.display(),
                    error = %e,
                    "inbox poll failed"
                );
                return;
            }
        };

        let mut eligible: Vec<std::path::PathBuf> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if self.is_eligible(&path) {
                eligible.push(path);
            }
        }
        // Stable enqueue order across polls.
        eligible.sort();

        for path in eligible {
            let job = Job::new(&path, &self.clock);
            match self.queue.enqueue(job) {
                EnqueueOutcome::Queued => {
                    tracing::info!(path = %path.display(), "file enqueued");
                }
                EnqueueOutcome::Duplicate => {}
                EnqueueOutcome::Full => {
                    self.metrics.record_file_rejected();
                    tracing::debug!(
                        path = %path.display(),
                        "queue full, file deferred to next poll"
                    );
                }
            }
        }
    }

    fn is_eligible(&self, path: &Path) -> bool {
        let Ok(meta) = std::fs::metadata(path) else {
            return false;
        };
        if !meta.is_file() {
            return false;
        }
        if !self.extension_allowed(path) {
            return false;
        }
        let max_bytes = self.config.max_file_size_mb * 1024 * 1024;
        if meta.len() > max_bytes {
            tracing::warn!(
                path = %path.display(),
                size = meta.len(),
                "file exceeds size cap, ignored"
            );
            return false;
        }
        // Debounce: only files whose last write is older than the threshold.
        match meta.modified() {
            Ok(modified) => age_of(modified) >= self.config.file_age_threshold,
            Err(_) => false,
        }
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{}", ext.to_ascii_lowercase());
        self.config
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&dotted))
    }
}

fn age_of(modified: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
