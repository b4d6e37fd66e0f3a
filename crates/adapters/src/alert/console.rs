// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console alert sink: one line to stderr per alert, colorized on a TTY.

use super::{Alert, AlertError, AlertSeverity, AlertSink};
use async_trait::async_trait;
use std::io::IsTerminal;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }

    /// Colors follow `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
    fn should_colorize() -> bool {
        if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
            return false;
        }
        if std::env::var("COLOR").is_ok_and(|v| v == "1") {
            return true;
        }
        std::io::stderr().is_terminal()
    }

    fn render(alert: &Alert, colorize: bool) -> String {
        let line = alert.render_line();
        if !colorize {
            return line;
        }
        match alert.severity {
            AlertSeverity::Critical => format!("{RED}{line}{RESET}"),
            AlertSeverity::Warning => format!("{YELLOW}{line}{RESET}"),
            AlertSeverity::Info => line,
        }
    }
}

#[async_trait]
impl AlertSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
        eprintln!("{}", Self::render(alert, Self::should_colorize()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
