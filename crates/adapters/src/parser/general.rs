// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! General-purpose dialect for gcc/clang/rustc-shaped output.
//!
//! Recognizes `path:line:col: error: message`, `error: message`, and
//! `error[E0308]: message` forms.

use super::{CompilerOutputParser, ParseOutcome};
use aires_core::{CompilerError, Severity, SourceLocation};

/// Code assigned when the tool did not provide one.
const GENERIC_ERROR_CODE: &str = "ERROR";
const GENERIC_WARNING_CODE: &str = "WARNING";

#[derive(Clone, Copy, Debug, Default)]
pub struct GeneralParser;

impl GeneralParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_line(line: &str) -> Option<CompilerError> {
        let trimmed = line.trim();
        let (severity, keyword) = if let Some(pos) = marker_position(trimmed, "error") {
            (Severity::Error, pos)
        } else if let Some(pos) = marker_position(trimmed, "warning") {
            (Severity::Warning, pos)
        } else {
            return None;
        };

        let (start, after_keyword) = keyword;
        let rest = &trimmed[after_keyword..];

        // Optional bracketed code: error[E0308]: ...
        let (code, message) = if let Some(inner) = rest.strip_prefix('[') {
            let (code, tail) = inner.split_once(']')?;
            let message = tail.strip_prefix(':')?.trim();
            (code.trim().to_string(), message)
        } else {
            let message = rest.strip_prefix(':')?.trim();
            let code = match severity {
                Severity::Error => GENERIC_ERROR_CODE,
                _ => GENERIC_WARNING_CODE,
            };
            (code.to_string(), message)
        };
        if message.is_empty() {
            return None;
        }

        let location = parse_location(trimmed[..start].trim_end_matches([':', ' ']));
        Some(
            CompilerError::new(code, message, severity)
                .with_location(location.unwrap_or_default()),
        )
    }
}

/// Find the diagnostic keyword at a token boundary. Returns
/// (keyword start, index just past the keyword).
fn marker_position(line: &str, keyword: &str) -> Option<(usize, usize)> {
    let pos = line.find(keyword)?;
    let boundary_ok = pos == 0 || line[..pos].ends_with(": ") || line[..pos].ends_with(':');
    if !boundary_ok {
        return None;
    }
    let end = pos + keyword.len();
    // Next char must be ':' or '[' so "errors" and prose never match.
    match line[end..].chars().next() {
        Some(':') | Some('[') => Some((pos, end)),
        _ => None,
    }
}

/// Parse a `path:line:col` or `path:line` prefix.
fn parse_location(prefix: &str) -> Option<SourceLocation> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return None;
    }
    let mut parts = prefix.rsplitn(3, ':');
    let last = parts.next()?;
    let middle = parts.next();
    let first = parts.next();

    match (first, middle) {
        // path:line:col
        (Some(path), Some(line)) => {
            let line_no: u32 = line.trim().parse().ok()?;
            let col: u32 = last.trim().parse().ok()?;
            Some(SourceLocation::new(path.trim(), line_no, col))
        }
        // path:line
        (None, Some(path)) => {
            let line_no: u32 = last.trim().parse().ok()?;
            Some(SourceLocation {
                path: Some(path.trim().into()),
                line: Some(line_no),
                column: None,
            })
        }
        _ => None,
    }
}

impl CompilerOutputParser for GeneralParser {
    fn name(&self) -> &'static str {
        "general"
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
#[path = "general_tests.rs"]
mod tests;
