// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake alert sink for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Alert, AlertError, AlertSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every alert it receives; can be scripted to fail.
#[derive(Clone, Default)]
pub struct FakeSink {
    inner: Arc<Mutex<FakeSinkState>>,
}

#[derive(Default)]
struct FakeSinkState {
    alerts: Vec<Alert>,
    fail: bool,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.inner.lock().alerts.clone()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().alerts.len()
    }

    /// Make every subsequent emit fail.
    pub fn set_failing(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }
}

#[async_trait]
impl AlertSink for FakeSink {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut state = self.inner.lock();
        if state.fail {
            return Err(AlertError::EmitFailed("scripted failure".to_string()));
        }
        state.alerts.push(alert.clone());
        Ok(())
    }
}
