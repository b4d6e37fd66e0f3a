// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn confidence_is_clamped() {
    let finding = ModelFinding::new("mistral", "t", "c").with_confidence(1.7);
    assert_eq!(finding.confidence, Some(1.0));

    let finding = ModelFinding::new("mistral", "t", "c").with_confidence(-0.2);
    assert_eq!(finding.confidence, Some(0.0));
}

#[test]
fn validation_with_violations_is_non_compliant() {
    let validation = PatternValidation::new(Vec::new(), vec!["no canonical logging".to_string()]);
    assert!(!validation.overall_compliance);
    assert_eq!(validation.critical_violations.len(), 1);
}

#[test]
fn validation_without_violations_is_compliant() {
    let validation = PatternValidation::new(Vec::new(), Vec::new());
    assert!(validation.overall_compliance);
}

#[test]
fn empty_placeholders_have_no_content() {
    assert!(DocAnalysis::empty().findings.is_empty());
    assert!(ContextAnalysis::empty().pain_points.is_empty());
    assert!(PatternValidation::empty().overall_compliance);
}
