// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aires_core::{CompilerError, ErrorBatch, HealthLevel, Severity};
use std::path::Path;

fn booklet() -> Booklet {
    let batch = ErrorBatch::new("build-001.txt", 0).with_errors(vec![CompilerError::new(
        "CS1503",
        "cannot convert",
        Severity::Error,
    )]);
    Booklet::new("Error Research: build-001", batch, 0)
}

#[test]
fn save_writes_rendered_markdown_at_relative_path() {
    let dir = tempfile::tempdir().unwrap();
    let writer = BookletWriter::new(dir.path());

    let path = writer
        .save(&booklet(), Path::new("build-001.md"))
        .unwrap();

    assert_eq!(path, dir.path().join("build-001.md"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# Error Research: build-001"));
    assert!(text.ends_with("*Generated by AIRES*\n"));
}

#[test]
fn save_creates_nested_directories_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let writer = BookletWriter::new(dir.path());

    writer
        .save(&booklet(), Path::new("2026/01/build-001.md"))
        .unwrap();
    writer
        .save(&booklet(), Path::new("2026/01/build-002.md"))
        .unwrap();

    assert!(dir.path().join("2026/01/build-001.md").exists());
    assert!(dir.path().join("2026/01/build-002.md").exists());
}

#[test]
fn no_temp_file_is_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let writer = BookletWriter::new(dir.path());
    writer.save(&booklet(), Path::new("b.md")).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn absolute_relative_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let writer = BookletWriter::new(dir.path());

    let err = writer
        .save(&booklet(), Path::new("/etc/booklet.md"))
        .unwrap_err();
    assert_eq!(err.code(), "BOOKLET_SAVE_ERROR");
}

#[test]
fn health_healthy_on_writable_root_with_space() {
    let dir = tempfile::tempdir().unwrap();
    let writer = BookletWriter::new(dir.path()).with_disk_thresholds(0, 0);
    assert_eq!(writer.health_status().level, HealthLevel::Healthy);
}

#[test]
fn health_degraded_when_below_warning_threshold() {
    let dir = tempfile::tempdir().unwrap();
    // Warning threshold far above any real disk forces the degraded branch.
    let writer = BookletWriter::new(dir.path()).with_disk_thresholds(0, u64::MAX);
    assert_eq!(writer.health_status().level, HealthLevel::Degraded);
}

#[test]
fn health_unhealthy_when_below_critical_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let writer = BookletWriter::new(dir.path()).with_disk_thresholds(u64::MAX, u64::MAX);
    assert_eq!(writer.health_status().level, HealthLevel::Unhealthy);
}

#[test]
fn uncreatable_root_is_unhealthy() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the output root should be: create_dir_all fails.
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let writer = BookletWriter::new(&blocker);
    assert_eq!(writer.health_status().level, HealthLevel::Unhealthy);
}
