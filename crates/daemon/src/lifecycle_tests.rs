// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aires_config::Document;

fn config_in(dir: &Path) -> Config {
    let text = format!(
        "[Directories]\n\
         InputDirectory = {0}/input\n\
         OutputDirectory = {0}/output\n\
         TempDirectory = {0}/temp\n\
         AlertDirectory = {0}/alerts\n\
         LogDirectory = {0}/logs\n",
        dir.display()
    );
    Config::bind(&Document::parse(&text))
}

#[test]
fn paths_derive_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DaemonPaths::from_config(&config_in(dir.path()));

    assert_eq!(paths.input_dir, dir.path().join("input"));
    assert_eq!(paths.lock_path, dir.path().join("logs/aires.pid"));
    assert_eq!(paths.log_path, dir.path().join("logs/aires.log"));
}

#[test]
fn ensure_creates_directories_and_trays() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DaemonPaths::from_config(&config_in(dir.path()));

    paths.ensure().unwrap();
    paths.ensure().unwrap(); // idempotent

    assert!(dir.path().join("input/processed").is_dir());
    assert!(dir.path().join("input/failed").is_dir());
    assert!(dir.path().join("output").is_dir());
    assert!(dir.path().join("alerts").is_dir());
    assert!(dir.path().join("logs").is_dir());
}

#[test]
fn lock_is_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let lock_path = dir.path().join("aires.pid");

    let held = acquire_lock(&lock_path).unwrap();
    let second = acquire_lock(&lock_path);
    assert!(matches!(second, Err(DaemonError::LockFailed(_))));

    drop(held);
    assert!(acquire_lock(&lock_path).is_ok());
}

#[test]
fn lock_file_records_pid() {
    let dir = tempfile::tempdir().unwrap();
    let lock_path = dir.path().join("aires.pid");
    let _held = acquire_lock(&lock_path).unwrap();

    let recorded = std::fs::read_to_string(&lock_path).unwrap();
    assert_eq!(recorded.trim(), std::process::id().to_string());
}

#[test]
fn startup_marker_appends_pid_line() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DaemonPaths::from_config(&config_in(dir.path()));

    write_startup_marker(&paths).unwrap();
    write_startup_marker(&paths).unwrap();

    let text = std::fs::read_to_string(&paths.log_path).unwrap();
    let markers: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("--- aires: starting"))
        .collect();
    assert_eq!(markers.len(), 2);
    assert!(markers[0].contains(&std::process::id().to_string()));
}

#[test]
fn small_log_is_not_rotated() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("aires.log");
    std::fs::write(&log, "short").unwrap();

    rotate_log_if_needed(&log);

    assert!(log.exists());
    assert!(!dir.path().join("aires.log.1").exists());
}

#[test]
fn oversized_log_rotates_with_shift() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("aires.log");
    std::fs::write(&log, vec![b'x'; 10 * 1024 * 1024]).unwrap();
    std::fs::write(dir.path().join("aires.log.1"), "old-1").unwrap();

    rotate_log_if_needed(&log);

    assert!(!log.exists());
    let rotated = std::fs::read_to_string(dir.path().join("aires.log.1")).unwrap();
    assert_eq!(rotated.len(), 10 * 1024 * 1024);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("aires.log.2")).unwrap(),
        "old-1"
    );
}
