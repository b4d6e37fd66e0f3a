// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aires_core::{CancelSource, FakeClock, JobState};

fn queue(capacity: usize) -> Arc<JobQueue> {
    JobQueue::new(capacity, Arc::new(Metrics::new()))
}

fn job(path: &str) -> Job {
    Job::new(path, &FakeClock::new())
}

#[test]
fn enqueue_claim_release_cycle() {
    let queue = queue(10);
    assert_eq!(queue.enqueue(job("/in/a.txt")), EnqueueOutcome::Queued);
    assert_eq!(queue.depth(), 1);

    let claimed = queue.claim().unwrap();
    assert_eq!(claimed.state, JobState::Running);
    assert_eq!(claimed.attempts, 1);
    assert_eq!(queue.depth(), 0);
    assert_eq!(queue.inflight(), 1);

    queue.release(&claimed.input_path);
    assert!(queue.is_idle());
}

#[test]
fn duplicate_paths_are_rejected_while_queued() {
    let queue = queue(10);
    assert_eq!(queue.enqueue(job("/in/a.txt")), EnqueueOutcome::Queued);
    assert_eq!(queue.enqueue(job("/in/a.txt")), EnqueueOutcome::Duplicate);
    assert_eq!(queue.depth(), 1);
}

#[test]
fn duplicate_paths_are_rejected_while_claimed() {
    let queue = queue(10);
    queue.enqueue(job("/in/a.txt"));
    let claimed = queue.claim().unwrap();

    assert_eq!(queue.enqueue(job("/in/a.txt")), EnqueueOutcome::Duplicate);

    queue.release(&claimed.input_path);
    assert_eq!(queue.enqueue(job("/in/a.txt")), EnqueueOutcome::Queued);
}

#[test]
fn full_queue_rejects_new_arrivals() {
    let queue = queue(2);
    assert_eq!(queue.enqueue(job("/in/a.txt")), EnqueueOutcome::Queued);
    assert_eq!(queue.enqueue(job("/in/b.txt")), EnqueueOutcome::Queued);
    assert_eq!(queue.enqueue(job("/in/c.txt")), EnqueueOutcome::Full);
    assert_eq!(queue.depth(), 2);
}

#[test]
fn claims_are_fifo() {
    let queue = queue(10);
    queue.enqueue(job("/in/a.txt"));
    queue.enqueue(job("/in/b.txt"));

    assert_eq!(queue.claim().unwrap().input_path, PathBuf::from("/in/a.txt"));
    assert_eq!(queue.claim().unwrap().input_path, PathBuf::from("/in/b.txt"));
    assert!(queue.claim().is_none());
}

#[tokio::test]
async fn next_waits_for_arrivals() {
    let queue = queue(10);
    let source = CancelSource::new();
    let token = source.token();

    let waiter = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.next(&token).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.enqueue(job("/in/late.txt"));

    let claimed = waiter.await.unwrap().unwrap();
    assert_eq!(claimed.input_path, PathBuf::from("/in/late.txt"));
}

#[tokio::test]
async fn next_returns_none_on_cancel() {
    let queue = queue(10);
    let source = CancelSource::new();
    let token = source.token();

    let waiter = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.next(&token).await })
    };
    source.cancel();
    assert!(waiter.await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn requeue_keeps_path_claimed_during_delay() {
    let queue = queue(10);
    queue.enqueue(job("/in/a.txt"));
    let claimed = queue.claim().unwrap();
    let source = CancelSource::new();

    queue.requeue_later(
        claimed,
        Duration::from_secs(4),
        FakeClock::new(),
        source.token(),
    );
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Still claimed: the watchdog cannot re-enqueue the path.
    assert_eq!(queue.enqueue(job("/in/a.txt")), EnqueueOutcome::Duplicate);
    assert_eq!(queue.depth(), 0);

    tokio::time::sleep(Duration::from_secs(4)).await;
    let requeued = queue.claim().unwrap();
    assert_eq!(requeued.input_path, PathBuf::from("/in/a.txt"));
    assert_eq!(requeued.attempts, 2, "second claim counts a new attempt");
}

#[tokio::test(start_paused = true)]
async fn requeue_cancelled_at_shutdown_releases_path() {
    let queue = queue(10);
    queue.enqueue(job("/in/a.txt"));
    let claimed = queue.claim().unwrap();
    let source = CancelSource::new();

    queue.requeue_later(
        claimed,
        Duration::from_secs(60),
        FakeClock::new(),
        source.token(),
    );
    tokio::time::sleep(Duration::from_secs(1)).await;
    source.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(queue.is_idle(), "cancelled retry must release its claim");
}
