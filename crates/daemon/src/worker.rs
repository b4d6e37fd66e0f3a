// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool: drains the queue and drives jobs through the pipeline.
//!
//! Transient failures (timeouts, network errors, endpoint exhaustion)
//! requeue the job with exponential delay, up to the retry cap. Terminal
//! failures move the input file to the failed tray and raise a Warning
//! alert. Success persists the booklet and moves the input to processed.

use crate::queue::JobQueue;
use crate::watchdog::{FAILED_TRAY, PROCESSED_TRAY};
use aires_adapters::{AlertBus, AlertSeverity, LlmGateway};
use aires_core::{CancelToken, Clock, Job};
use aires_engine::{
    BookletWriter, Metrics, Orchestrator, PipelineError, PipelineInput,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Job-level retry policy for transient-classified failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base × 2^(attempt-1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// Everything one worker needs to take a job to a terminal state.
pub struct JobProcessor<G, C> {
    orchestrator: Arc<Orchestrator<G, C>>,
    writer: BookletWriter,
    queue: Arc<JobQueue>,
    alerts: AlertBus,
    metrics: Arc<Metrics>,
    clock: C,
    retry: RetryPolicy,
    input_dir: PathBuf,
    /// Deadline for one whole job run (stage timeouts plus slack).
    job_timeout: Duration,
}

impl<G: LlmGateway, C: Clock> JobProcessor<G, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orchestrator: Arc<Orchestrator<G, C>>,
        writer: BookletWriter,
        queue: Arc<JobQueue>,
        alerts: AlertBus,
        metrics: Arc<Metrics>,
        clock: C,
        retry: RetryPolicy,
        input_dir: impl Into<PathBuf>,
        job_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            writer,
            queue,
            alerts,
            metrics,
            clock,
            retry,
            input_dir: input_dir.into(),
            job_timeout,
        }
    }

    /// Drive one claimed job to a terminal state (or back into the queue).
    pub async fn process(&self, mut job: Job, ctx: &CancelToken) {
        let job_id = job.job_id.clone();
        let path = job.input_path.clone();
        tracing::info!(job_id = %job_id, path = %path.display(), attempt = job.attempts, "job started");

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                self.finish_failed(&mut job, "INPUT_READ_ERROR", &e.to_string());
                return;
            }
        };

        let input = PipelineInput {
            raw_compiler_output: raw,
            source_file: path.clone(),
            ..PipelineInput::default()
        };

        let run = tokio::time::timeout(
            self.job_timeout,
            self.orchestrator.run(&input, None, ctx),
        )
        .await
        .unwrap_or_else(|_| {
            Err(PipelineError::DocAnalysis {
                source: aires_adapters::GatewayError::Timeout(self.job_timeout),
            })
        });

        match run {
            Ok(booklet) => {
                let relative = booklet_relative_path(&path);
                match self.writer.save(&booklet, &relative) {
                    Ok(saved) => {
                        self.metrics.record_booklet_saved(self.clock.epoch_ms());
                        self.move_to_tray(&path, PROCESSED_TRAY);
                        job.succeed();
                        self.metrics.record_job_succeeded();
                        self.queue.release(&path);
                        tracing::info!(
                            job_id = %job_id,
                            booklet = %saved.display(),
                            "job succeeded"
                        );
                    }
                    Err(e) => {
                        self.finish_failed(&mut job, e.code(), &e.to_string());
                    }
                }
            }
            Err(PipelineError::Cancelled) => {
                // Not an error: leave the input in place for the next run.
                // (The orchestrator already counted the cancellation.)
                job.cancel();
                self.queue.release(&path);
                tracing::info!(job_id = %job_id, "job cancelled");
            }
            Err(e) if e.is_transient() && job.attempts <= self.retry.max_retries => {
                let delay = self.retry.delay_for(job.attempts);
                tracing::warn!(
                    job_id = %job_id,
                    error_code = e.code(),
                    attempt = job.attempts,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, requeueing"
                );
                self.metrics.record_job_requeued();
                self.queue
                    .requeue_later(job, delay, self.clock.clone(), ctx.clone());
            }
            Err(e) => {
                self.finish_failed(&mut job, e.code(), &e.to_string());
            }
        }
    }

    fn finish_failed(&self, job: &mut Job, code: &str, detail: &str) {
        let path = job.input_path.clone();
        job.fail(code);
        self.metrics.record_job_failed();
        self.metrics.record_failure(code);
        self.move_to_tray(&path, FAILED_TRAY);
        self.queue.release(&path);

        let mut context = BTreeMap::new();
        context.insert("job_id".to_string(), job.job_id.to_string());
        context.insert("error_code".to_string(), code.to_string());
        context.insert("input".to_string(), path.display().to_string());
        self.alerts.raise(
            AlertSeverity::Warning,
            "worker",
            format!("job failed terminally: {detail}"),
            context,
            self.clock.epoch_ms(),
        );
        tracing::error!(
            job_id = %job.job_id,
            error_code = code,
            attempt = job.attempts,
            "job failed terminally"
        );
    }

    fn move_to_tray(&self, path: &Path, tray: &str) {
        let tray_dir = self.input_dir.join(tray);
        if let Err(e) = std::fs::create_dir_all(&tray_dir) {
            tracing::warn!(tray, error = %e, "tray directory not creatable");
            return;
        }
        let Some(name) = path.file_name() else {
            return;
        };
        let target = tray_dir.join(name);
        if let Err(e) = std::fs::rename(path, &target) {
            tracing::warn!(
                from = %path.display(),
                to = %target.display(),
                error = %e,
                "tray move failed"
            );
        }
    }
}

/// Suggested booklet path: the input file's stem with a `.md` extension.
pub fn booklet_relative_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "booklet".to_string());
    PathBuf::from(format!("{stem}.md"))
}

/// Fixed-size worker pool over one shared processor.
pub struct WorkerPool;

impl WorkerPool {
    /// Spawn `count` workers. Each claims from the queue until `poll_ctx`
    /// cancels, then drains its in-flight job; `job_ctx` is the harder
    /// cancellation handed to the pipeline itself.
    pub fn spawn<G: LlmGateway, C: Clock>(
        count: usize,
        queue: Arc<JobQueue>,
        processor: Arc<JobProcessor<G, C>>,
        poll_ctx: CancelToken,
        job_ctx: CancelToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        (0..count.max(1))
            .map(|worker_idx| {
                let queue = Arc::clone(&queue);
                let processor = Arc::clone(&processor);
                let poll_ctx = poll_ctx.clone();
                let job_ctx = job_ctx.clone();
                tokio::spawn(async move {
                    tracing::info!(worker_idx, "worker started");
                    while let Some(job) = queue.next(&poll_ctx).await {
                        processor.process(job, &job_ctx).await;
                    }
                    tracing::info!(worker_idx, "worker stopped");
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
