// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specifications for the aires CLI.
//!
//! Black-box tests: they invoke the compiled binary and verify stdout,
//! stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Locate a workspace binary built alongside this test binary.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    // Standard target directory (works when CARGO_MANIFEST_DIR is correct)
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // Fallback: resolve relative to the test binary itself.
    // The test binary lives at target/debug/deps/specs-<hash>, so its
    // grandparent is target/debug/ where aires is built.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn aires(args: &[&str]) -> Output {
    Command::new(binary_path("aires"))
        .args(args)
        .output()
        .expect("aires binary runs")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn exit_code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

#[test]
fn help_lists_all_commands() {
    let output = aires(&["--help"]);
    assert_eq!(exit_code(&output), 0);
    let text = stdout_of(&output);
    for command in ["run", "once", "status", "config"] {
        assert!(text.contains(command), "help is missing `{command}`");
    }
}

#[test]
fn version_prints() {
    let output = aires(&["--version"]);
    assert_eq!(exit_code(&output), 0);
    assert!(stdout_of(&output).starts_with("aires "));
}

#[test]
fn config_set_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("aires.ini");
    std::fs::write(&config, "# tuning\n[Pipeline]\nMaxRetries = 3\n").unwrap();
    let config = config.to_string_lossy().to_string();

    let set = aires(&["-c", &config, "config", "set", "Pipeline.MaxRetries", "7"]);
    assert_eq!(exit_code(&set), 0);

    let get = aires(&["-c", &config, "config", "get", "Pipeline.MaxRetries"]);
    assert_eq!(exit_code(&get), 0);
    assert_eq!(stdout_of(&get), "7\n");

    // Comments survive the rewrite.
    let text = std::fs::read_to_string(&config).unwrap();
    assert!(text.contains("# tuning"));
}

#[test]
fn config_get_unknown_key_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("aires.ini");
    std::fs::write(&config, "[Pipeline]\n").unwrap();
    let config = config.to_string_lossy().to_string();

    let output = aires(&["-c", &config, "config", "get", "Pipeline.Nope"]);
    assert_eq!(exit_code(&output), 4);
}

#[test]
fn config_commands_without_file_exit_2() {
    let output = aires(&["-c", "/nonexistent/aires.ini", "config", "get", "A.B"]);
    assert_eq!(exit_code(&output), 2);
}

#[test]
fn malformed_config_key_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("aires.ini");
    std::fs::write(&config, "[Pipeline]\n").unwrap();
    let config = config.to_string_lossy().to_string();

    let output = aires(&["-c", &config, "config", "get", "nodot"]);
    assert_eq!(exit_code(&output), 4);
}

#[test]
fn once_with_missing_input_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("aires.ini").to_string_lossy().to_string();
    let missing = dir.path().join("missing.txt").to_string_lossy().to_string();

    let output = aires(&["-c", &config, "once", &missing]);
    assert_eq!(exit_code(&output), 4);
}

#[test]
fn run_with_missing_config_exits_2() {
    let output = aires(&["-c", "/nonexistent/aires.ini", "run"]);
    assert_eq!(exit_code(&output), 2);
}
