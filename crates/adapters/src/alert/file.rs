// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File alert sink: appends one line per alert to a daily rolling file in
//! the alert directory (`alerts-YYYY-MM-DD.log`).

use super::{Alert, AlertError, AlertSink};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::io::Write;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_path(&self, raised_at_ms: u64) -> PathBuf {
        let day = Utc
            .timestamp_millis_opt(raised_at_ms as i64)
            .single()
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d");
        self.dir.join(format!("alerts-{day}.log"))
    }
}

#[async_trait]
impl AlertSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AlertError::EmitFailed(e.to_string()))?;

        let timestamp = Utc
            .timestamp_millis_opt(alert.raised_at_ms as i64)
            .single()
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ");

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(alert.raised_at_ms))
            .map_err(|e| AlertError::EmitFailed(e.to_string()))?;
        writeln!(file, "{} {}", timestamp, alert.render_line())
            .map_err(|e| AlertError::EmitFailed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
