// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn appends_one_line_per_alert() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::new(dir.path());

    // 2026-01-02T03:04:05Z
    let at_ms: u64 = 1_767_323_045_000;
    let alert = Alert::new(super::super::AlertSeverity::Warning, "worker", "job failed", at_ms)
        .with_context("job_id", "j-1");
    sink.emit(&alert).await.unwrap();
    sink.emit(&alert).await.unwrap();

    let path = dir.path().join("alerts-2026-01-02.log");
    let text = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("[WARNING] worker: job failed (job_id=j-1)"));
    assert!(lines[0].starts_with("2026-01-02T03:04:05"));
}

#[tokio::test]
async fn creates_alert_directory_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b");
    let sink = FileSink::new(&nested);

    let alert = Alert::new(super::super::AlertSeverity::Info, "s", "m", 0);
    sink.emit(&alert).await.unwrap();
    sink.emit(&alert).await.unwrap();

    assert!(nested.exists());
}
