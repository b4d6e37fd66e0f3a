// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C#/MSBuild output dialect.
//!
//! Recognizes Roslyn-style diagnostics:
//! `Program.cs(12,34): error CS1503: Argument 1: cannot convert ...`
//! with or without the `path(line,col):` prefix.

use super::{CompilerOutputParser, ParseOutcome};
use aires_core::{CompilerError, Severity, SourceLocation};

#[derive(Clone, Copy, Debug, Default)]
pub struct CSharpParser;

impl CSharpParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_line(line: &str) -> Option<CompilerError> {
        let (severity, marker) = if let Some(pos) = find_marker(line, "error ") {
            (Severity::Error, pos)
        } else if let Some(pos) = find_marker(line, "warning ") {
            (Severity::Warning, pos)
        } else {
            return None;
        };

        let (keyword_start, rest_start) = marker;
        let rest = &line[rest_start..];
        // Code runs up to the next ':'.
        let (code, message) = match rest.split_once(':') {
            Some((code, message)) => (code.trim(), message.trim()),
            None => return None,
        };
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let location = parse_location(line[..keyword_start].trim_end_matches([':', ' ']));
        Some(
            CompilerError::new(code, message, severity)
                .with_location(location.unwrap_or_default()),
        )
    }
}

/// Find `keyword` at a token boundary; returns (keyword start, code start).
fn find_marker(line: &str, keyword: &str) -> Option<(usize, usize)> {
    let pos = line.find(keyword)?;
    // Must start the line or follow ": " to avoid matching message text.
    let boundary_ok = pos == 0 || line[..pos].trim_end().ends_with(':');
    if !boundary_ok {
        return None;
    }
    Some((pos, pos + keyword.len()))
}

/// Parse a `path(line,col)` prefix.
fn parse_location(prefix: &str) -> Option<SourceLocation> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return None;
    }
    let open = prefix.rfind('(')?;
    let inner = prefix[open + 1..].strip_suffix(')')?;
    let (line, column) = inner.split_once(',')?;
    Some(SourceLocation::new(
        prefix[..open].trim(),
        line.trim().parse().ok()?,
        column.trim().parse().ok()?,
    ))
}

impl CompilerOutputParser for CSharpParser {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn parse(&self, raw: &str) -> ParseOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for line in raw.lines() {
            if let Some(diagnostic) = Self::parse_line(line) {
                match diagnostic.severity {
                    Severity::Error => errors.push(diagnostic),
                    _ => warnings.push(diagnostic),
                }
            }
        }
        ParseOutcome::new(errors, warnings)
    }
}

#[cfg(test)]
#[path = "csharp_tests.rs"]
mod tests;
