// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded FIFO job queue with path-keyed de-duplication.
//!
//! A path lives in exactly one of two sets: `queued` (job waiting) or
//! `claimed` (worker owns it, including the delay before a retry lands).
//! Re-offering a path in either set is a no-op, so a poll can never
//! double-enqueue a file that is still being worked.

use aires_core::{CancelToken, Clock, Job};
use aires_engine::Metrics;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Result of offering a job to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// Path already queued or in flight.
    Duplicate,
    /// Queue at capacity; the caller re-offers on its next poll.
    Full,
}

struct QueueState {
    jobs: VecDeque<Job>,
    queued: HashSet<PathBuf>,
    claimed: HashSet<PathBuf>,
}

/// Shared job queue.
pub struct JobQueue {
    state: Mutex<QueueState>,
    /// Woken on enqueue so idle workers pick work up immediately.
    arrivals: Notify,
    capacity: usize,
    metrics: Arc<Metrics>,
}

impl JobQueue {
    pub fn new(capacity: usize, metrics: Arc<Metrics>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                queued: HashSet::new(),
                claimed: HashSet::new(),
            }),
            arrivals: Notify::new(),
            capacity: capacity.max(1),
            metrics,
        })
    }

    /// Offer a job. Duplicates and overflow are rejected, never queued twice.
    pub fn enqueue(&self, job: Job) -> EnqueueOutcome {
        let outcome = {
            let mut state = self.state.lock();
            if state.queued.contains(&job.input_path) || state.claimed.contains(&job.input_path) {
                EnqueueOutcome::Duplicate
            } else if state.jobs.len() >= self.capacity {
                EnqueueOutcome::Full
            } else {
                state.queued.insert(job.input_path.clone());
                state.jobs.push_back(job);
                self.metrics.set_queue_depth(state.jobs.len() as u64);
                EnqueueOutcome::Queued
            }
        };
        if outcome == EnqueueOutcome::Queued {
            self.metrics.record_file_enqueued();
            self.arrivals.notify_one();
        }
        outcome
    }

    /// Claim the oldest job, marking its path in-flight.
    pub fn claim(&self) -> Option<Job> {
        let mut state = self.state.lock();
        let mut job = state.jobs.pop_front()?;
        state.queued.remove(&job.input_path);
        state.claimed.insert(job.input_path.clone());
        self.metrics.set_queue_depth(state.jobs.len() as u64);
        job.start();
        Some(job)
    }

    /// Wait for the next job. Returns `None` once `ctx` is cancelled.
    pub async fn next(&self, ctx: &CancelToken) -> Option<Job> {
        loop {
            if ctx.is_cancelled() {
                return None;
            }
            if let Some(job) = self.claim() {
                return Some(job);
            }
            tokio::select! {
                _ = ctx.cancelled() => return None,
                _ = self.arrivals.notified() => {}
            }
        }
    }

    /// Release a claimed path after the job reached a terminal state.
    pub fn release(&self, path: &Path) {
        let mut state = self.state.lock();
        state.claimed.remove(path);
    }

    /// Requeue a job after `delay`. The path stays claimed during the wait
    /// so the watchdog cannot re-enqueue it; if the queue is full when the
    /// delay elapses, the push waits for room (retries are never shed).
    /// A cancellation during the wait cancels the job instead.
    pub fn requeue_later(
        self: &Arc<Self>,
        mut job: Job,
        delay: Duration,
        clock: impl Clock,
        ctx: CancelToken,
    ) {
        let queue = Arc::clone(self);
        job.requeue();
        tokio::spawn(async move {
            tokio::select! {
                _ = ctx.cancelled() => {
                    queue.cancel_claimed(job);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            loop {
                {
                    let mut state = queue.state.lock();
                    if state.jobs.len() < queue.capacity {
                        state.claimed.remove(&job.input_path);
                        state.queued.insert(job.input_path.clone());
                        job.enqueued_at_ms = clock.epoch_ms();
                        state.jobs.push_back(job);
                        queue.metrics.set_queue_depth(state.jobs.len() as u64);
                        break;
                    }
                }
                tokio::select! {
                    _ = ctx.cancelled() => {
                        queue.cancel_claimed(job);
                        return;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(250)) => {}
                }
            }
            queue.arrivals.notify_one();
        });
    }

    fn cancel_claimed(&self, mut job: Job) {
        job.cancel();
        self.release(&job.input_path.clone());
        tracing::info!(job_id = %job.job_id, "pending retry cancelled at shutdown");
    }

    pub fn depth(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn inflight(&self) -> usize {
        self.state.lock().claimed.len()
    }

    /// True when nothing is queued or claimed.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.jobs.is_empty() && state.claimed.is_empty()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
