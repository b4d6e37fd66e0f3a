// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

#[test]
fn new_job_is_queued() {
    let clock = FakeClock::new();
    let job = Job::new("/inbox/build.txt", &clock);

    assert_eq!(job.state, JobState::Queued);
    assert_eq!(job.attempts, 0);
    assert!(!job.is_terminal());
}

#[test]
fn start_increments_attempts() {
    let clock = FakeClock::new();
    let mut job = Job::new("/inbox/build.txt", &clock);

    job.start();
    assert_eq!(job.state, JobState::Running);
    assert_eq!(job.attempts, 1);

    job.requeue();
    job.start();
    assert_eq!(job.attempts, 2);
}

#[test]
fn terminal_states_are_sticky() {
    let clock = FakeClock::new();
    let mut job = Job::new("/inbox/build.txt", &clock);
    job.start();
    job.succeed();
    assert_eq!(job.state, JobState::Succeeded);

    // Further transitions are ignored.
    job.fail("late failure");
    job.cancel();
    assert_eq!(job.state, JobState::Succeeded);
}

#[test]
fn fail_records_reason() {
    let clock = FakeClock::new();
    let mut job = Job::new("/inbox/build.txt", &clock);
    job.start();
    job.fail("NO_ERRORS_FOUND");

    assert_eq!(job.state, JobState::Failed("NO_ERRORS_FOUND".to_string()));
    assert!(job.is_terminal());
    assert_eq!(job.state.to_string(), "failed: NO_ERRORS_FOUND");
}

#[test]
fn cancel_from_queued() {
    let clock = FakeClock::new();
    let mut job = Job::new("/inbox/build.txt", &clock);
    job.cancel();
    assert_eq!(job.state, JobState::Cancelled);
}

#[test]
fn start_only_from_queued() {
    let clock = FakeClock::new();
    let mut job = Job::new("/inbox/build.txt", &clock);
    job.start();
    job.start();
    assert_eq!(job.attempts, 1, "double start must not double-count");
}
