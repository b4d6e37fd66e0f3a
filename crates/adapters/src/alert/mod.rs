// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert sinks and the bounded alert bus.

mod bus;
mod console;
mod desktop;
mod file;
mod noop;

pub use bus::AlertBus;
pub use console::ConsoleSink;
pub use desktop::DesktopSink;
pub use file::FileSink;
pub use noop::NoopSink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSink;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Alert severity. Critical alerts are never dropped by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "INFO"),
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One alert with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    /// Component that raised the alert, e.g. "watchdog" or "health".
    pub source: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    pub raised_at_ms: u64,
}

impl Alert {
    pub fn new(
        severity: AlertSeverity,
        source: impl Into<String>,
        message: impl Into<String>,
        raised_at_ms: u64,
    ) -> Self {
        Self {
            severity,
            source: source.into(),
            message: message.into(),
            context: BTreeMap::new(),
            raised_at_ms,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// One-line rendering used by the file and console sinks.
    pub fn render_line(&self) -> String {
        let mut line = format!("[{}] {}: {}", self.severity, self.source, self.message);
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            line.push_str(&format!(" ({})", pairs.join(", ")));
        }
        line
    }
}

/// Errors from alert delivery.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("emit failed: {0}")]
    EmitFailed(String),
}

/// One delivery channel for alerts.
///
/// Emission is best-effort: a failing sink is logged and skipped, it never
/// blocks the other channels.
#[async_trait]
pub trait AlertSink: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn emit(&self, alert: &Alert) -> Result<(), AlertError>;
}
