// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiler errors and the batches they arrive in.

use crate::id::BatchId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity of a single compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Where a diagnostic points in the source tree. All fields optional: build
/// tools frequently omit one or more.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            path: Some(path.into()),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.line.is_none() && self.column.is_none()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line, self.column) {
            (Some(p), Some(l), Some(c)) => write!(f, "{}({},{})", p.display(), l, c),
            (Some(p), Some(l), None) => write!(f, "{}({})", p.display(), l),
            (Some(p), None, _) => write!(f, "{}", p.display()),
            _ => write!(f, "<unknown>"),
        }
    }
}

/// One diagnostic as produced by an external parser. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerError {
    /// Tool-specific code, e.g. "CS1503".
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub location: SourceLocation,
    pub severity: Severity,
}

impl CompilerError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: SourceLocation::default(),
            severity,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

/// All diagnostics parsed from one input file, in original order.
/// Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBatch {
    pub batch_id: BatchId,
    pub source_file: PathBuf,
    pub created_at_ms: u64,
    pub errors: Vec<CompilerError>,
}

impl ErrorBatch {
    pub fn new(source_file: impl Into<PathBuf>, created_at_ms: u64) -> Self {
        Self {
            batch_id: BatchId::random(),
            source_file: source_file.into(),
            created_at_ms,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<CompilerError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Distinct error codes in first-seen order. Used for booklet grouping.
    pub fn distinct_codes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for e in &self.errors {
            if !seen.contains(&e.code.as_str()) {
                seen.push(e.code.as_str());
            }
        }
        seen
    }
}

#[cfg(test)]
#[path = "compiler_error_tests.rs"]
mod tests;
