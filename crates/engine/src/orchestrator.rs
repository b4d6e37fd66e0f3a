// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four-stage pipeline orchestrator.
//!
//! Two execution disciplines, selected by config:
//!
//! - **Sequential**: stages run strictly in order, each seeing every
//!   upstream output.
//! - **Concurrent**: stages 1-3 are dispatched simultaneously for latency;
//!   stages 2 and 3 receive synthetic empty placeholders for the upstream
//!   outputs that are not ready yet and produce best-effort, context-free
//!   analyses. Stage 4 joins all three. Booklets carry `concurrent=true` so
//!   readers know the tradeoff was taken.

use crate::error::PipelineError;
use crate::metrics::Metrics;
use crate::progress::ProgressSink;
use crate::stage::{
    ContextAnalyzer, DocAnalyzer, PatternChecker, StageModels, StageResult, Synthesizer,
};
use aires_adapters::{CompilerOutputParser, GatewayError, GenerateOptions, LlmGateway};
use aires_core::{Booklet, CancelToken, Clock, DocAnalysis, ErrorBatch, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything one pipeline run needs from the caller.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub raw_compiler_output: String,
    pub code_context: String,
    pub project_structure: String,
    pub project_codebase: String,
    pub project_standards: String,
    pub source_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Concurrent discipline for stages 1-3.
    pub concurrent: bool,
    /// Per-stage deadline.
    pub stage_timeout: Duration,
    /// Errors beyond this count are dropped from the batch.
    pub max_errors_per_batch: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrent: true,
            stage_timeout: Duration::from_secs(120),
            max_errors_per_batch: 100,
        }
    }
}

/// Pipeline orchestrator. Owns the stage executors and maps their failures
/// onto the stable error taxonomy.
pub struct Orchestrator<G, C = SystemClock> {
    gateway: Arc<G>,
    parser: Arc<dyn CompilerOutputParser>,
    clock: C,
    metrics: Arc<Metrics>,
    config: OrchestratorConfig,
    doc: DocAnalyzer,
    context: ContextAnalyzer,
    pattern: PatternChecker,
    synthesizer: Synthesizer,
}

impl<G: LlmGateway, C: Clock> Orchestrator<G, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<G>,
        parser: Arc<dyn CompilerOutputParser>,
        models: StageModels,
        options: GenerateOptions,
        config: OrchestratorConfig,
        metrics: Arc<Metrics>,
        clock: C,
    ) -> Self {
        Self {
            gateway,
            parser,
            clock,
            metrics,
            config,
            doc: DocAnalyzer {
                model: models.mistral,
                options,
            },
            context: ContextAnalyzer {
                model: models.deepseek,
                options,
            },
            pattern: PatternChecker {
                model: models.codegemma,
                options,
            },
            synthesizer: Synthesizer {
                model: models.gemma2,
                options,
            },
        }
    }

    /// Run the full pipeline over one raw compiler output.
    pub async fn run(
        &self,
        input: &PipelineInput,
        progress: Option<&ProgressSink>,
        ctx: &CancelToken,
    ) -> Result<Booklet, PipelineError> {
        let result = self.run_inner(input, progress, ctx).await;
        match &result {
            Ok(_) => self.metrics.record_booklet_generated(),
            Err(PipelineError::Cancelled) => self.metrics.record_cancellation(),
            Err(e) => self.metrics.record_failure(e.code()),
        }
        result
    }

    async fn run_inner(
        &self,
        input: &PipelineInput,
        progress: Option<&ProgressSink>,
        ctx: &CancelToken,
    ) -> Result<Booklet, PipelineError> {
        let emit = |stage: &str, percent: u8| {
            if let Some(sink) = progress {
                sink.emit(stage, percent);
            }
        };
        let run_start = self.clock.now();

        emit("starting", 0);
        emit("initializing", 5);

        // Step 0: parse. Zero errors fails fast; warnings alone do not make
        // a research batch.
        let parse_start = self.clock.now();
        let outcome = self.parser.parse(&input.raw_compiler_output);
        let mut errors = outcome.errors;
        if errors.len() > self.config.max_errors_per_batch {
            tracing::warn!(
                total = errors.len(),
                kept = self.config.max_errors_per_batch,
                "error batch truncated"
            );
            errors.truncate(self.config.max_errors_per_batch);
        }
        if errors.is_empty() {
            return Err(PipelineError::NoErrorsFound);
        }
        let batch = ErrorBatch::new(input.source_file.clone(), self.clock.epoch_ms())
            .with_errors(errors);
        let parse_ms = elapsed_ms(&self.clock, parse_start);
        emit("parsed", 10);

        tracing::info!(
            batch_id = %batch.batch_id,
            errors = batch.len(),
            concurrent = self.config.concurrent,
            "pipeline started"
        );

        let (doc, context, validation, stage_timings, parallel_ms) = if self.config.concurrent {
            self.run_concurrent(input, &batch, &emit, ctx).await?
        } else {
            self.run_sequential(input, &batch, &emit, ctx).await?
        };

        if ctx.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // Stage 4: synthesis.
        emit("synthesis", 75);
        let synth_start = self.clock.now();
        emit("synthesis-running", 80);
        let synth = self
            .stage_with_timeout(
                self.synthesizer.run(
                    self.gateway.as_ref(),
                    &batch,
                    &doc.value,
                    &context.value,
                    &validation.value,
                    self.clock.epoch_ms(),
                    ctx,
                ),
                |source| PipelineError::Synthesis { source },
            )
            .await?;
        let synth_ms = elapsed_ms(&self.clock, synth_start);
        emit("synthesis-done", 90);

        let retries =
            doc.retries + context.retries + validation.retries + synth.retries;
        self.metrics.add_gateway_retries(retries as u64);

        let mut booklet = synth.value;
        let total_ms = elapsed_ms(&self.clock, run_start);
        booklet.set_metadata("ParseErrors", parse_ms.to_string());
        booklet.set_metadata("MistralAnalysis", stage_timings[0].to_string());
        booklet.set_metadata("DeepSeekAnalysis", stage_timings[1].to_string());
        booklet.set_metadata("CodeGemmaValidation", stage_timings[2].to_string());
        booklet.set_metadata("Gemma2Generation", synth_ms.to_string());
        booklet.set_metadata("TotalDurationMs", total_ms.to_string());
        booklet.set_metadata("GatewayRetries", retries.to_string());
        booklet.set_metadata("concurrent", self.config.concurrent.to_string());
        if let Some(parallel_ms) = parallel_ms {
            let stage_sum: u64 = stage_timings.iter().sum();
            booklet.set_metadata("ParallelExecutionTime", parallel_ms.to_string());
            booklet.set_metadata(
                "TimeSaved",
                stage_sum.saturating_sub(parallel_ms).to_string(),
            );
        }
        let snapshot = self.metrics.snapshot();
        booklet.set_metadata(
            "Metrics.BookletsGenerated",
            (snapshot.booklets_generated + 1).to_string(),
        );
        booklet.set_metadata("Metrics.GatewayRetries", snapshot.gateway_retries.to_string());

        self.metrics.record_run_latency(total_ms);
        emit("persisting", 95);
        emit("complete", 100);

        tracing::info!(
            batch_id = %batch.batch_id,
            booklet_id = %booklet.booklet_id,
            total_ms,
            retries,
            "pipeline complete"
        );
        Ok(booklet)
    }

    /// Sequential discipline: strict order, full upstream context.
    async fn run_sequential(
        &self,
        input: &PipelineInput,
        batch: &ErrorBatch,
        emit: &(dyn Fn(&str, u8) + Sync),
        ctx: &CancelToken,
    ) -> Result<StageTrio, PipelineError> {
        emit("documentation-analysis", 15);
        let t = self.clock.now();
        emit("documentation-running", 20);
        let doc = self
            .stage_with_timeout(
                self.doc
                    .run(self.gateway.as_ref(), batch, &input.code_context, ctx),
                |source| PipelineError::DocAnalysis { source },
            )
            .await?;
        let doc_ms = elapsed_ms(&self.clock, t);
        emit("documentation-done", 30);
        self.check_cancel(ctx)?;

        emit("context-analysis", 35);
        let t = self.clock.now();
        emit("context-running", 40);
        let context = self
            .stage_with_timeout(
                self.context.run(
                    self.gateway.as_ref(),
                    batch,
                    &doc.value,
                    &input.code_context,
                    &input.project_structure,
                    ctx,
                ),
                |source| PipelineError::ContextAnalysis { source },
            )
            .await?;
        let context_ms = elapsed_ms(&self.clock, t);
        emit("context-done", 50);
        self.check_cancel(ctx)?;

        emit("pattern-validation", 55);
        let t = self.clock.now();
        emit("pattern-running", 60);
        let validation = self
            .stage_with_timeout(
                self.pattern.run(
                    self.gateway.as_ref(),
                    batch,
                    &context.value,
                    &input.project_codebase,
                    &input.project_standards,
                    ctx,
                ),
                |source| PipelineError::PatternValidation { source },
            )
            .await?;
        let validation_ms = elapsed_ms(&self.clock, t);
        emit("pattern-done", 70);
        self.check_cancel(ctx)?;

        Ok((doc, context, validation, [doc_ms, context_ms, validation_ms], None))
    }

    /// Concurrent discipline: stages 1-3 dispatched together, stages 2/3 on
    /// empty placeholder inputs, joined by an all-of barrier.
    async fn run_concurrent(
        &self,
        input: &PipelineInput,
        batch: &ErrorBatch,
        emit: &(dyn Fn(&str, u8) + Sync),
        ctx: &CancelToken,
    ) -> Result<StageTrio, PipelineError> {
        emit("parallel-analysis", 15);
        let placeholder_doc = DocAnalysis::empty();
        let placeholder_context = aires_core::ContextAnalysis::empty();

        let barrier_start = self.clock.now();
        let doc_fut = async {
            let t = self.clock.now();
            let result = self
                .stage_with_timeout(
                    self.doc
                        .run(self.gateway.as_ref(), batch, &input.code_context, ctx),
                    |source| PipelineError::DocAnalysis { source },
                )
                .await;
            (result, elapsed_ms(&self.clock, t))
        };
        let context_fut = async {
            let t = self.clock.now();
            let result = self
                .stage_with_timeout(
                    self.context.run(
                        self.gateway.as_ref(),
                        batch,
                        &placeholder_doc,
                        &input.code_context,
                        &input.project_structure,
                        ctx,
                    ),
                    |source| PipelineError::ContextAnalysis { source },
                )
                .await;
            (result, elapsed_ms(&self.clock, t))
        };
        let validation_fut = async {
            let t = self.clock.now();
            let result = self
                .stage_with_timeout(
                    self.pattern.run(
                        self.gateway.as_ref(),
                        batch,
                        &placeholder_context,
                        &input.project_codebase,
                        &input.project_standards,
                        ctx,
                    ),
                    |source| PipelineError::PatternValidation { source },
                )
                .await;
            (result, elapsed_ms(&self.clock, t))
        };

        let ((doc, doc_ms), (context, context_ms), (validation, validation_ms)) =
            tokio::join!(doc_fut, context_fut, validation_fut);
        let parallel_ms = elapsed_ms(&self.clock, barrier_start);
        emit("parallel-done", 70);

        Ok((
            doc?,
            context?,
            validation?,
            [doc_ms, context_ms, validation_ms],
            Some(parallel_ms),
        ))
    }

    async fn stage_with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, PipelineError>>,
        on_timeout: impl FnOnce(GatewayError) -> PipelineError,
    ) -> Result<T, PipelineError> {
        match tokio::time::timeout(self.config.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(GatewayError::Timeout(self.config.stage_timeout))),
        }
    }

    fn check_cancel(&self, ctx: &CancelToken) -> Result<(), PipelineError> {
        if ctx.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}

/// Results of stages 1-3, their timings, and the concurrent wallclock.
type StageTrio = (
    StageResult<DocAnalysis>,
    StageResult<aires_core::ContextAnalysis>,
    StageResult<aires_core::PatternValidation>,
    [u64; 3],
    Option<u64>,
);

fn elapsed_ms<C: Clock>(clock: &C, start: std::time::Instant) -> u64 {
    clock.now().saturating_duration_since(start).as_millis() as u64
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
