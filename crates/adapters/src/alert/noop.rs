// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op alert sink, used when alerting is disabled in config.

use super::{Alert, AlertError, AlertSink};
use async_trait::async_trait;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl NoopSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for NoopSink {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn emit(&self, _alert: &Alert) -> Result<(), AlertError> {
        Ok(())
    }
}
