// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aires_adapters::{FakeGateway, GatewayError};
use aires_core::{CancelToken, CompilerError, Severity};

fn batch() -> ErrorBatch {
    ErrorBatch::new("build-001.txt", 1000).with_errors(vec![CompilerError::new(
        "CS1503",
        "cannot convert from 'int' to 'string'",
        Severity::Error,
    )])
}

fn options() -> GenerateOptions {
    GenerateOptions::default()
}

#[tokio::test]
async fn doc_analyzer_extracts_summary_and_references() {
    let gateway = FakeGateway::new();
    gateway.push_response(
        "CS1503 is an argument type mismatch.\n\n\
         See https://learn.microsoft.com/cs1503 for details.",
    );
    let stage = DocAnalyzer {
        model: "mistral".to_string(),
        options: options(),
    };

    let result = stage
        .run(&gateway, &batch(), "fn main() {}", &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(result.value.summary, "CS1503 is an argument type mismatch.");
    assert_eq!(result.value.findings.len(), 1);
    assert_eq!(result.value.findings[0].model, "mistral");
    assert_eq!(
        result.value.references.get("ref-1").map(String::as_str),
        Some("https://learn.microsoft.com/cs1503")
    );

    // The prompt carried the error line.
    let calls = gateway.calls();
    assert!(calls[0].prompt.contains("CS1503: cannot convert"));
}

#[tokio::test]
async fn doc_analyzer_maps_gateway_failure() {
    let gateway = FakeGateway::new();
    gateway.push_error(GatewayError::Server {
        status: 503,
        message: "overloaded".to_string(),
    });
    let stage = DocAnalyzer {
        model: "mistral".to_string(),
        options: options(),
    };

    let err = stage
        .run(&gateway, &batch(), "", &CancelToken::never())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MISTRAL_ANALYSIS_ERROR");
    assert!(err.is_transient());
}

#[tokio::test]
async fn context_analyzer_collects_pain_points() {
    let gateway = FakeGateway::new();
    gateway.push_response(
        "Type mismatches cluster in the billing module.\n\
         - implicit int conversions\n\
         - missing overloads\n",
    );
    let stage = ContextAnalyzer {
        model: "deepseek-coder".to_string(),
        options: options(),
    };

    let result = stage
        .run(
            &gateway,
            &batch(),
            &DocAnalysis::empty(),
            "",
            "src/\n  billing/\n",
            &CancelToken::never(),
        )
        .await
        .unwrap();

    assert_eq!(
        result.value.pain_points,
        vec!["implicit int conversions", "missing overloads"]
    );
    assert_eq!(
        result.value.summary,
        "Type mismatches cluster in the billing module."
    );
}

#[tokio::test]
async fn pattern_checker_derives_compliance_from_violations() {
    let gateway = FakeGateway::new();
    gateway.push_response(
        "Reviewed against standards.\n\
         VIOLATION: raw numeric literals in API layer\n\
         violation: missing canonical error wrapper\n",
    );
    let stage = PatternChecker {
        model: "codegemma".to_string(),
        options: options(),
    };

    let result = stage
        .run(
            &gateway,
            &batch(),
            &aires_core::ContextAnalysis::empty(),
            "",
            "",
            &CancelToken::never(),
        )
        .await
        .unwrap();

    assert!(!result.value.overall_compliance);
    assert_eq!(
        result.value.critical_violations,
        vec![
            "raw numeric literals in API layer",
            "missing canonical error wrapper"
        ]
    );
}

#[tokio::test]
async fn pattern_checker_compliant_when_no_violations() {
    let gateway = FakeGateway::new();
    gateway.push_response("Everything follows the standards.");
    let stage = PatternChecker {
        model: "codegemma".to_string(),
        options: options(),
    };

    let result = stage
        .run(
            &gateway,
            &batch(),
            &aires_core::ContextAnalysis::empty(),
            "",
            "",
            &CancelToken::never(),
        )
        .await
        .unwrap();

    assert!(result.value.overall_compliance);
    assert!(result.value.critical_violations.is_empty());
}

#[tokio::test]
async fn synthesizer_builds_ordered_booklet() {
    let gateway = FakeGateway::new();
    gateway.push_response("1. Change the argument type.\n2. Add an overload.");
    let stage = Synthesizer {
        model: "gemma2".to_string(),
        options: options(),
    };

    let doc = DocAnalysis {
        findings: vec![ModelFinding::new("mistral", "Documentation Analysis", "doc text")],
        summary: "doc summary".to_string(),
        references: BTreeMap::new(),
    };
    let context = aires_core::ContextAnalysis {
        findings: vec![ModelFinding::new("deepseek-coder", "Context Analysis", "ctx text")],
        summary: "ctx summary".to_string(),
        pain_points: vec!["pain".to_string()],
        metadata: BTreeMap::new(),
    };
    let validation = PatternValidation::new(
        vec![ModelFinding::new("codegemma", "Pattern Validation", "val text")],
        vec!["violation-1".to_string()],
    );

    let result = stage
        .run(
            &gateway,
            &batch(),
            &doc,
            &context,
            &validation,
            2000,
            &CancelToken::never(),
        )
        .await
        .unwrap();

    let booklet = result.value;
    assert_eq!(booklet.title, "Error Research: build-001");
    assert_eq!(booklet.generated_at_ms, 2000);

    let titles: Vec<&str> = booklet
        .sections_in_order()
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Documentation Analysis",
            "Context Analysis",
            "Pattern Validation",
            "Recommended Fixes"
        ]
    );

    // All upstream findings plus the synthesis itself.
    assert_eq!(booklet.findings.len(), 4);
    assert_eq!(booklet.findings[3].model, "gemma2");

    // Violations surface in the validation section.
    let validation_section = &booklet.sections_in_order()[2].content;
    assert!(validation_section.contains("violation-1"));
}

#[tokio::test]
async fn cancellation_is_not_a_stage_error() {
    let gateway = FakeGateway::new();
    gateway.push_error(GatewayError::Cancelled);
    let stage = DocAnalyzer {
        model: "mistral".to_string(),
        options: options(),
    };

    let err = stage
        .run(&gateway, &batch(), "", &CancelToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
}
