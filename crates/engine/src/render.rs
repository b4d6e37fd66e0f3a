// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic Markdown rendering of a booklet.
//!
//! Fixed skeleton: H1 title, bold metadata lines, `## Metadata`,
//! `## Original Errors` grouped by code, the ordered sections, an
//! `## AI Research Summary` with per-finding subsections truncated to 500
//! characters, and the footer.

use aires_core::Booklet;
use chrono::{TimeZone, Utc};

/// Cap on each finding excerpt in the research summary.
const FINDING_EXCERPT_LIMIT: usize = 500;

/// Render the full booklet to Markdown. Deterministic for identical inputs.
pub fn render_markdown(booklet: &Booklet) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", booklet.title));
    out.push_str(&format!("**Generated:** {}\n", format_utc(booklet.generated_at_ms)));
    out.push_str(&format!("**Batch ID:** {}\n", booklet.batch_id));
    out.push_str(&format!("**Total Errors:** {}\n\n", booklet.batch.len()));

    out.push_str("## Metadata\n\n");
    for (key, value) in &booklet.metadata {
        out.push_str(&format!("- {}: {}\n", key, value));
    }
    out.push('\n');

    out.push_str("## Original Errors\n\n");
    for code in booklet.batch.distinct_codes() {
        out.push_str(&format!("### {}\n\n", code));
        for error in booklet.batch.errors.iter().filter(|e| e.code == code) {
            if error.location.is_empty() {
                out.push_str(&format!("- {}\n", error.message));
            } else {
                out.push_str(&format!("- `{}` {}\n", error.location, error.message));
            }
        }
        out.push('\n');
    }

    for section in booklet.sections_in_order() {
        out.push_str(&format!("## {}\n\n", section.title));
        out.push_str(section.content.trim_end());
        out.push_str("\n\n");
    }

    out.push_str("## AI Research Summary\n\n");
    for finding in &booklet.findings {
        out.push_str(&format!("### {} ({})\n\n", finding.title, finding.model));
        out.push_str(excerpt(&finding.content));
        out.push_str("\n\n");
    }

    out.push_str("---\n*Generated by AIRES*\n");
    out
}

fn format_utc(epoch_ms: u64) -> String {
    Utc.timestamp_millis_opt(epoch_ms as i64)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

fn excerpt(text: &str) -> &str {
    if text.len() <= FINDING_EXCERPT_LIMIT {
        return text.trim_end();
    }
    let mut end = FINDING_EXCERPT_LIMIT;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
