// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.

use crate::clock::Clock;
use crate::id::JobId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle state of a job.
///
/// Transitions are monotonic: `Queued → Running → terminal`, with the single
/// exception of `Running → Queued` when a transient failure requeues the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed(String),
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed(_) | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Running => write!(f, "running"),
            JobState::Succeeded => write!(f, "succeeded"),
            JobState::Failed(reason) => write!(f, "failed: {}", reason),
            JobState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One unit of work: a single inbox file to turn into a booklet.
///
/// The queue owns a job until a worker claims it; the worker owns it until
/// it reaches a terminal state or is requeued for retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub input_path: PathBuf,
    pub enqueued_at_ms: u64,
    /// Number of processing attempts so far (0 before the first claim).
    pub attempts: u32,
    pub state: JobState,
}

impl Job {
    pub fn new(input_path: impl Into<PathBuf>, clock: &impl Clock) -> Self {
        Self {
            job_id: JobId::random(),
            input_path: input_path.into(),
            enqueued_at_ms: clock.epoch_ms(),
            attempts: 0,
            state: JobState::Queued,
        }
    }

    /// Claim the job for processing. Increments the attempt counter.
    pub fn start(&mut self) {
        if self.state == JobState::Queued {
            self.attempts += 1;
            self.state = JobState::Running;
        }
    }

    /// Return a running job to the queue for another attempt.
    pub fn requeue(&mut self) {
        if self.state == JobState::Running {
            self.state = JobState::Queued;
        }
    }

    pub fn succeed(&mut self) {
        if self.state == JobState::Running {
            self.state = JobState::Succeeded;
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.state.is_terminal() {
            self.state = JobState::Failed(reason.into());
        }
    }

    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = JobState::Cancelled;
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
