// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE: &str = "\
# AIRES configuration
[Directories]
InputDirectory = input
OutputDirectory = output

; inference settings
[AI_Services]
OllamaBaseUrl = http://localhost:11434
OllamaTimeout = 120s
";

#[test]
fn get_finds_values() {
    let doc = Document::parse(SAMPLE);
    assert_eq!(doc.get("Directories", "InputDirectory"), Some("input"));
    assert_eq!(
        doc.get("AI_Services", "OllamaBaseUrl"),
        Some("http://localhost:11434")
    );
    assert_eq!(doc.get("Directories", "Missing"), None);
    assert_eq!(doc.get("NoSuchSection", "InputDirectory"), None);
}

#[test]
fn lookups_are_case_insensitive() {
    let doc = Document::parse(SAMPLE);
    assert_eq!(doc.get("directories", "inputdirectory"), Some("input"));
    assert_eq!(doc.get("ai_services", "OLLAMATIMEOUT"), Some("120s"));
}

#[test]
fn set_rewrites_existing_value_in_place() {
    let mut doc = Document::parse(SAMPLE);
    doc.set("Directories", "InputDirectory", "/var/aires/in");

    let text = doc.to_text();
    assert!(text.contains("InputDirectory = /var/aires/in"));
    // Comments and unrelated lines untouched.
    assert!(text.contains("# AIRES configuration"));
    assert!(text.contains("; inference settings"));
    assert!(text.contains("OutputDirectory = output"));
}

#[test]
fn set_appends_missing_key_within_section() {
    let mut doc = Document::parse(SAMPLE);
    doc.set("Directories", "TempDirectory", "tmp");

    // New key lands inside [Directories], not at end of file.
    let text = doc.to_text();
    let dir_pos = text.find("TempDirectory = tmp").unwrap();
    let ai_pos = text.find("[AI_Services]").unwrap();
    assert!(dir_pos < ai_pos, "key must be inserted in its own section");
}

#[test]
fn set_appends_missing_key_when_section_is_not_last() {
    let mut doc = Document::parse("[A]\n[B]\nk = v\n");
    doc.set("A", "x", "1");

    let text = doc.to_text();
    let x_pos = text.find("x = 1").unwrap();
    let b_pos = text.find("[B]").unwrap();
    assert!(x_pos < b_pos, "insertion must stay inside [A]");
}

#[test]
fn set_creates_missing_section() {
    let mut doc = Document::parse(SAMPLE);
    doc.set("Pipeline", "MaxRetries", "5");

    let text = doc.to_text();
    assert!(text.contains("[Pipeline]"));
    assert!(text.contains("MaxRetries = 5"));
    assert_eq!(doc.get("Pipeline", "MaxRetries"), Some("5"));
}

#[test]
fn set_then_get_round_trip() {
    let mut doc = Document::parse("");
    doc.set("Watchdog", "Enabled", "false");
    let reparsed = Document::parse(&doc.to_text());
    assert_eq!(reparsed.get("Watchdog", "Enabled"), Some("false"));
}

#[test]
fn pairs_lists_section_in_order() {
    let doc = Document::parse(SAMPLE);
    let pairs = doc.pairs("Directories");
    assert_eq!(
        pairs,
        vec![
            ("InputDirectory".to_string(), "input".to_string()),
            ("OutputDirectory".to_string(), "output".to_string()),
        ]
    );
}

#[test]
fn unrecognized_lines_survive_round_trip() {
    let odd = "[S]\nnot a pair line\nk = v\n";
    let mut doc = Document::parse(odd);
    doc.set("S", "k", "w");
    assert!(doc.to_text().contains("not a pair line"));
}
