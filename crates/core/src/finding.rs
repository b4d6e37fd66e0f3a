// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed outputs of the four analysis stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One finding produced by a model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFinding {
    /// Name of the model that produced this finding.
    pub model: String,
    pub title: String,
    pub content: String,
    /// Confidence in [0,1] when the model reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Opaque references (doc URLs, rule ids) backing the finding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

impl ModelFinding {
    pub fn new(model: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            title: title.into(),
            content: content.into(),
            confidence: None,
            evidence: Vec::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Stage 1 output: documentation research.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocAnalysis {
    pub findings: Vec<ModelFinding>,
    pub summary: String,
    pub references: BTreeMap<String, String>,
}

impl DocAnalysis {
    /// Synthetic empty value handed to downstream stages in concurrent mode
    /// before the real analysis is ready.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Stage 2 output: project-context analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextAnalysis {
    pub findings: Vec<ModelFinding>,
    pub summary: String,
    /// Ordered pain points, most pressing first.
    pub pain_points: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ContextAnalysis {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Stage 3 output: pattern/standards validation.
///
/// Invariant: `overall_compliance` is true exactly when
/// `critical_violations` is empty. Construct through [`PatternValidation::new`]
/// to keep the two in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternValidation {
    pub findings: Vec<ModelFinding>,
    pub overall_compliance: bool,
    pub critical_violations: Vec<String>,
}

impl PatternValidation {
    pub fn new(findings: Vec<ModelFinding>, critical_violations: Vec<String>) -> Self {
        Self {
            overall_compliance: critical_violations.is_empty(),
            findings,
            critical_violations,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[cfg(test)]
#[path = "finding_tests.rs"]
mod tests;
