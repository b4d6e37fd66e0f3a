// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded, non-blocking progress reporting.
//!
//! The orchestrator is the single producer; consumers are advisory UIs.
//! A full channel drops the event rather than stall the pipeline.

use tokio::sync::mpsc;

/// One progress event at a stable anchor point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: String,
    pub percent: u8,
}

/// Sending half handed to the orchestrator.
#[derive(Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSink {
    /// Create a sink with the given buffer size and its receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Emit an event; silently dropped when the buffer is full.
    pub fn emit(&self, stage: &str, percent: u8) {
        let _ = self.tx.try_send(ProgressEvent {
            stage: stage.to_string(),
            percent: percent.min(100),
        });
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
