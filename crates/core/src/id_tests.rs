// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_id_display() {
    let id = JobId::new("job-1");
    assert_eq!(id.to_string(), "job-1");
}

#[test]
fn job_id_short_truncates() {
    let id = JobId::new("abcdefgh");
    assert_eq!(id.short(4), "abcd");
    assert_eq!(id.short(100), "abcdefgh");
}

#[test]
fn random_ids_are_unique() {
    let a = BatchId::random();
    let b = BatchId::random();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 36);
}

#[test]
fn id_serde_round_trip() {
    let id = BookletId::new("bk-9");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"bk-9\"");
    let parsed: BookletId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn id_from_str() {
    let id: EndpointId = "gpu0".into();
    assert_eq!(id.as_str(), "gpu0");
    assert_eq!(id, "gpu0");
}

#[test]
fn uuid_id_gen_produces_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}

#[test]
fn sequential_id_gen_counts_up() {
    let gen = SequentialIdGen::new("t");
    assert_eq!(gen.next(), "t-1");
    assert_eq!(gen.next(), "t-2");

    let cloned = gen.clone();
    assert_eq!(cloned.next(), "t-3");
}
