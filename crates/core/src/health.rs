// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health status snapshots and aggregation rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ternary health level (plus Unknown for probes that never answered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl HealthLevel {
    /// Aggregate many levels into one: Healthy only if all are Healthy,
    /// Degraded if any is Degraded and none worse, otherwise Unhealthy.
    /// An empty set is Unknown.
    pub fn aggregate(levels: impl IntoIterator<Item = HealthLevel>) -> HealthLevel {
        let mut saw_any = false;
        let mut saw_degraded = false;
        for level in levels {
            saw_any = true;
            match level {
                HealthLevel::Unhealthy | HealthLevel::Unknown => return HealthLevel::Unhealthy,
                HealthLevel::Degraded => saw_degraded = true,
                HealthLevel::Healthy => {}
            }
        }
        match (saw_any, saw_degraded) {
            (false, _) => HealthLevel::Unknown,
            (true, true) => HealthLevel::Degraded,
            (true, false) => HealthLevel::Healthy,
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthLevel::Healthy => write!(f, "healthy"),
            HealthLevel::Degraded => write!(f, "degraded"),
            HealthLevel::Unhealthy => write!(f, "unhealthy"),
            HealthLevel::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snapshot of one component's health. Replaced wholesale on each probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub component: String,
    pub level: HealthLevel,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub diagnostics: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_reasons: Vec<String>,
}

impl HealthStatus {
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            level: HealthLevel::Healthy,
            latency_ms: 0,
            error: None,
            diagnostics: BTreeMap::new(),
            failure_reasons: Vec::new(),
        }
    }

    pub fn degraded(component: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            level: HealthLevel::Degraded,
            failure_reasons: vec![reason],
            ..Self::healthy(component)
        }
    }

    pub fn unhealthy(component: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            level: HealthLevel::Unhealthy,
            error: Some(reason.clone()),
            failure_reasons: vec![reason],
            ..Self::healthy(component)
        }
    }

    pub fn unknown(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            level: HealthLevel::Unknown,
            failure_reasons: vec![reason.into()],
            ..Self::healthy(component)
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_diagnostic(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.diagnostics.insert(key.into(), value.into());
        self
    }

    /// First failure reason, for compact reports.
    pub fn first_failure(&self) -> Option<&str> {
        self.failure_reasons.first().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
