// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::compiler_error::{CompilerError, ErrorBatch, Severity};

fn batch() -> ErrorBatch {
    ErrorBatch::new("build-001.txt", 1000).with_errors(vec![CompilerError::new(
        "CS1503",
        "cannot convert",
        Severity::Error,
    )])
}

#[test]
fn booklet_references_its_batch() {
    let b = batch();
    let batch_id = b.batch_id.clone();
    let booklet = Booklet::new("Research", b, 2000);

    assert_eq!(booklet.batch_id, batch_id);
    assert_eq!(booklet.batch.batch_id, batch_id);
}

#[test]
fn sections_sort_by_order() {
    let mut booklet = Booklet::new("Research", batch(), 0);
    booklet.add_section(BookletSection::new(3, "Synthesis", "..."));
    booklet.add_section(BookletSection::new(1, "Documentation", "..."));
    booklet.add_section(BookletSection::new(2, "Context", "..."));

    let titles: Vec<&str> = booklet
        .sections_in_order()
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Documentation", "Context", "Synthesis"]);
}

#[test]
fn duplicate_order_is_renumbered() {
    let mut booklet = Booklet::new("Research", batch(), 0);
    booklet.add_section(BookletSection::new(1, "A", ""));
    booklet.add_section(BookletSection::new(5, "B", ""));
    booklet.add_section(BookletSection::new(1, "C", ""));

    let mut orders: Vec<u32> = booklet.sections.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    orders.dedup();
    assert_eq!(orders.len(), 3, "section orders must stay unique");
    assert_eq!(booklet.sections[2].order, 6);
}

#[test]
fn metadata_round_trip() {
    let mut booklet = Booklet::new("Research", batch(), 0);
    booklet.set_metadata("concurrent", "true");
    assert_eq!(booklet.metadata.get("concurrent").map(String::as_str), Some("true"));
}
