// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The research booklet produced for one error batch.

use crate::compiler_error::ErrorBatch;
use crate::finding::ModelFinding;
use crate::id::{BatchId, BookletId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One ordered section of a booklet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookletSection {
    pub order: u32,
    pub title: String,
    pub content: String,
}

impl BookletSection {
    pub fn new(order: u32, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            order,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Markdown research booklet for one [`ErrorBatch`].
///
/// Sections carry explicit `order` values; rendering sorts by order, and
/// orders are unique within a booklet (enforced by [`Booklet::add_section`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booklet {
    pub booklet_id: BookletId,
    pub batch_id: BatchId,
    pub generated_at_ms: u64,
    pub title: String,
    pub sections: Vec<BookletSection>,
    /// Snapshot of the batch this booklet explains.
    pub batch: ErrorBatch,
    /// All stage findings, in pipeline order.
    pub findings: Vec<ModelFinding>,
    /// Step timings, mode flags, metric snapshots.
    pub metadata: BTreeMap<String, String>,
}

impl Booklet {
    pub fn new(title: impl Into<String>, batch: ErrorBatch, generated_at_ms: u64) -> Self {
        Self {
            booklet_id: BookletId::random(),
            batch_id: batch.batch_id.clone(),
            generated_at_ms,
            title: title.into(),
            sections: Vec::new(),
            batch,
            findings: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Append a section. A duplicate `order` is bumped past the current
    /// maximum so orders stay unique.
    pub fn add_section(&mut self, section: BookletSection) {
        let mut section = section;
        if self.sections.iter().any(|s| s.order == section.order) {
            let max = self.sections.iter().map(|s| s.order).max().unwrap_or(0);
            section.order = max + 1;
        }
        self.sections.push(section);
    }

    /// Sections sorted ascending by `order`.
    pub fn sections_in_order(&self) -> Vec<&BookletSection> {
        let mut sorted: Vec<&BookletSection> = self.sections.iter().collect();
        sorted.sort_by_key(|s| s.order);
        sorted
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }
}

#[cfg(test)]
#[path = "booklet_tests.rs"]
mod tests;
