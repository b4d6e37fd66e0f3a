// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aires_core::{BookletSection, CompilerError, ErrorBatch, ModelFinding, Severity, SourceLocation};

fn sample_booklet() -> Booklet {
    let batch = ErrorBatch::new("build-001.txt", 1000).with_errors(vec![
        CompilerError::new("CS1503", "cannot convert", Severity::Error)
            .with_location(SourceLocation::new("Program.cs", 12, 34)),
        CompilerError::new("CS0246", "type not found", Severity::Error),
        CompilerError::new("CS1503", "second mismatch", Severity::Error),
    ]);
    // 2026-01-02T03:04:05Z
    let mut booklet = Booklet::new("Error Research: build-001", batch, 1_767_323_045_000);
    booklet.add_section(BookletSection::new(2, "Context Analysis", "context body"));
    booklet.add_section(BookletSection::new(1, "Documentation Analysis", "doc body"));
    booklet.findings.push(ModelFinding::new("mistral", "Documentation Analysis", "finding text"));
    booklet.set_metadata("concurrent", "false");
    booklet
}

#[test]
fn skeleton_is_complete() {
    let markdown = render_markdown(&sample_booklet());

    assert!(markdown.starts_with("# Error Research: build-001\n"));
    assert!(markdown.contains("**Generated:** 2026-01-02 03:04:05 UTC"));
    assert!(markdown.contains("**Batch ID:** "));
    assert!(markdown.contains("**Total Errors:** 3"));
    assert!(markdown.contains("## Metadata"));
    assert!(markdown.contains("- concurrent: false"));
    assert!(markdown.contains("## Original Errors"));
    assert!(markdown.contains("## AI Research Summary"));
    assert!(markdown.contains("### Documentation Analysis (mistral)"));
    assert!(markdown.ends_with("---\n*Generated by AIRES*\n"));
}

#[test]
fn errors_group_by_code_in_first_seen_order() {
    let markdown = render_markdown(&sample_booklet());

    let cs1503 = markdown.find("### CS1503").unwrap();
    let cs0246 = markdown.find("### CS0246").unwrap();
    assert!(cs1503 < cs0246);

    // Both CS1503 occurrences are under one heading.
    let group = &markdown[cs1503..cs0246];
    assert!(group.contains("cannot convert"));
    assert!(group.contains("second mismatch"));
    assert!(group.contains("`Program.cs(12,34)`"));
}

#[test]
fn sections_render_in_ascending_order() {
    let markdown = render_markdown(&sample_booklet());
    let doc = markdown.find("## Documentation Analysis").unwrap();
    let context = markdown.find("## Context Analysis").unwrap();
    assert!(doc < context);
}

#[test]
fn long_findings_are_truncated() {
    let mut booklet = sample_booklet();
    booklet.findings.push(ModelFinding::new("gemma2", "Synthesis", "x".repeat(2000)));

    let markdown = render_markdown(&booklet);
    let synthesis = markdown.find("### Synthesis (gemma2)").unwrap();
    let tail = &markdown[synthesis..];
    let excerpt_len = tail
        .lines()
        .find(|l| l.starts_with('x'))
        .map(|l| l.len())
        .unwrap();
    assert_eq!(excerpt_len, 500);
}

#[test]
fn rendering_is_deterministic() {
    let booklet = sample_booklet();
    assert_eq!(render_markdown(&booklet), render_markdown(&booklet));
}
