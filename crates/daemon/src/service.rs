// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service assembly: explicit constructor wiring of every component.
//!
//! No runtime service resolution anywhere. `run_daemon` builds the whole
//! object graph from one config snapshot; `process_single_file` builds the
//! minimal graph for `once` mode; `status_report` builds only the probes.

use crate::lifecycle::{self, DaemonError, DaemonPaths};
use crate::queue::JobQueue;
use crate::watchdog::{Watchdog, WatchdogConfig};
use crate::worker::{JobProcessor, RetryPolicy, WorkerPool};
use aires_adapters::{
    AlertBus, AlertSink, BalancedGateway, CompilerOutputParser, ConsoleSink, CSharpParser,
    DesktopSink, EndpointConfig, FileSink, GeneralParser, GenerateOptions, LlmGateway,
    OllamaGateway, TracedGateway,
};
use aires_config::{Config, ConfigStore};
use aires_core::{CancelSource, CancelToken, Clock, HealthLevel, SystemClock};
use aires_engine::{
    BookletWriter, FnProbe, HealthRegistry, HealthReport, Metrics, Orchestrator,
    OrchestratorConfig, StageModels,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Concrete gateway stack used by the service: per-endpoint Ollama clients,
/// traced, behind the balancer (which degenerates to one endpoint when GPU
/// balancing is off).
pub type ServiceGateway = BalancedGateway<TracedGateway<OllamaGateway>>;

/// Compiler-output dialect selected at the CLI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserDialect {
    #[default]
    CSharp,
    General,
}

impl std::str::FromStr for ParserDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csharp" | "cs" => Ok(ParserDialect::CSharp),
            "general" => Ok(ParserDialect::General),
            other => Err(format!("unknown parser dialect: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub shutdown_deadline: Duration,
    pub dialect: ParserDialect,
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self {
            shutdown_deadline: Duration::from_secs(30),
            dialect: ParserDialect::CSharp,
        }
    }
}

fn build_parser(dialect: ParserDialect) -> Arc<dyn CompilerOutputParser> {
    match dialect {
        ParserDialect::CSharp => Arc::new(CSharpParser::new()),
        ParserDialect::General => Arc::new(GeneralParser::new()),
    }
}

/// Build the gateway stack from config: one endpoint per configured GPU
/// base URL, or the single service URL when balancing is disabled.
pub fn build_gateway(config: &Config) -> ServiceGateway {
    let ai = &config.ai_services;
    let client = |url: &str| {
        TracedGateway::new(
            OllamaGateway::new(url, ai.ollama_timeout)
                .with_max_retries(config.pipeline.max_retries)
                .with_retry_base(config.pipeline.retry_delay),
        )
    };

    if ai.enable_gpu_load_balancing && !ai.gpu_endpoints.is_empty() {
        let endpoints = ai
            .gpu_endpoints
            .iter()
            .enumerate()
            .map(|(i, url)| {
                let endpoint = EndpointConfig::new(format!("gpu{i}"), url.clone())
                    .with_max_concurrent(config.pipeline.max_concurrent_files.max(1))
                    .with_label("gpu", i.to_string());
                (endpoint, client(url))
            })
            .collect();
        BalancedGateway::new(endpoints)
    } else {
        BalancedGateway::single("main", ai.ollama_base_url.clone(), client(&ai.ollama_base_url))
    }
}

/// Build the alert bus from the Alerting section toggles.
pub fn build_alert_bus(config: &Config) -> AlertBus {
    let mut sinks: Vec<Arc<dyn AlertSink>> = Vec::new();
    if config.alerting.enabled {
        if config.alerting.console_alerts {
            sinks.push(Arc::new(ConsoleSink::new()));
        }
        if config.alerting.file_alerts {
            sinks.push(Arc::new(FileSink::new(
                config.directories.alert_directory.clone(),
            )));
        }
        if config.alerting.windows_event_log {
            sinks.push(Arc::new(DesktopSink::new()));
        }
    }
    AlertBus::new(sinks)
}

fn build_orchestrator(
    config: &Config,
    gateway: Arc<ServiceGateway>,
    parser: Arc<dyn CompilerOutputParser>,
    metrics: Arc<Metrics>,
) -> Orchestrator<ServiceGateway> {
    let ai = &config.ai_services;
    Orchestrator::new(
        gateway,
        parser,
        StageModels {
            mistral: ai.mistral_model.clone(),
            deepseek: ai.deepseek_model.clone(),
            codegemma: ai.codegemma_model.clone(),
            gemma2: ai.gemma2_model.clone(),
        },
        GenerateOptions {
            temperature: ai.model_temperature,
            top_p: ai.model_top_p,
            num_predict: ai.model_max_tokens,
        },
        OrchestratorConfig {
            concurrent: config.pipeline.enable_parallel_processing,
            stage_timeout: ai.ollama_timeout,
            max_errors_per_batch: config.processing.max_errors_per_file,
        },
        metrics,
        SystemClock,
    )
}

fn build_writer(config: &Config) -> BookletWriter {
    BookletWriter::new(config.directories.output_directory.clone()).with_disk_thresholds(
        config.alerting.critical_disk_space_mb,
        config.alerting.warning_disk_space_mb,
    )
}

/// Register the standard probe set: config, persistence, inference service,
/// and queue/metrics diagnostics.
pub fn build_registry(
    store: Arc<ConfigStore>,
    writer: BookletWriter,
    gateway: ServiceGateway,
    metrics: Arc<Metrics>,
    alerts: Option<AlertBus>,
) -> HealthRegistry {
    let mut registry = HealthRegistry::new();
    if let Some(alerts) = alerts {
        registry = registry.with_alerts(alerts);
    }

    let probe_store = Arc::clone(&store);
    registry.register(Arc::new(FnProbe::sync("config", move || {
        probe_store.health_status()
    })));
    registry.register(Arc::new(FnProbe::sync("persistence", move || {
        writer.health_status()
    })));
    registry.register(Arc::new(FnProbe::new("llm-service", move || {
        let gateway = gateway.clone();
        async move { gateway.service_health().await }
    })));
    registry.register(Arc::new(FnProbe::sync("metrics", move || {
        let snapshot = metrics.snapshot();
        aires_core::HealthStatus::healthy("metrics")
            .with_diagnostic("queue_depth", snapshot.queue_depth.to_string())
            .with_diagnostic("booklets_saved", snapshot.booklets_saved.to_string())
            .with_diagnostic("jobs_failed", snapshot.jobs_failed.to_string())
    })));
    registry
}

/// Run the unattended service until `shutdown` fires, then drain.
pub async fn run_daemon(
    store: Arc<ConfigStore>,
    shutdown: CancelToken,
    options: DaemonOptions,
) -> Result<(), DaemonError> {
    let config = store.get();
    let paths = DaemonPaths::from_config(&config);
    paths.ensure()?;
    let _lock = lifecycle::acquire_lock(&paths.lock_path)?;

    let clock = SystemClock;
    let metrics = Arc::new(Metrics::new());
    let alerts = build_alert_bus(&config);
    let alert_cancel = CancelSource::new();
    let alert_task = alerts.spawn_dispatcher(alert_cancel.token());

    let parser = build_parser(options.dialect);
    let gateway = Arc::new(build_gateway(&config));
    let orchestrator = Arc::new(build_orchestrator(
        &config,
        Arc::clone(&gateway),
        parser,
        Arc::clone(&metrics),
    ));
    let writer = build_writer(&config);

    let queue = JobQueue::new(config.watchdog.max_queue_size, Arc::clone(&metrics));
    let poll_cancel = CancelSource::new();
    let job_cancel = CancelSource::new();

    let job_timeout = config.ai_services.ollama_timeout * 4 + Duration::from_secs(30);
    let processor = Arc::new(JobProcessor::new(
        orchestrator,
        writer.clone(),
        Arc::clone(&queue),
        alerts.clone(),
        Arc::clone(&metrics),
        clock,
        RetryPolicy {
            max_retries: config.pipeline.max_retries,
            base_delay: config.pipeline.retry_delay,
        },
        paths.input_dir.clone(),
        job_timeout,
    ));

    let workers = WorkerPool::spawn(
        config.watchdog.processing_threads,
        Arc::clone(&queue),
        processor,
        poll_cancel.token(),
        job_cancel.token(),
    );

    let watchdog_task = if config.watchdog.enabled {
        let watchdog = Watchdog::new(
            paths.input_dir.clone(),
            WatchdogConfig {
                poll_interval: config.watchdog.polling_interval,
                file_age_threshold: config.watchdog.file_age_threshold,
                max_file_size_mb: config.processing.max_file_size_mb,
                allowed_extensions: config.processing.allowed_extensions.clone(),
            },
            Arc::clone(&queue),
            Arc::clone(&metrics),
            clock,
        );
        let ctx = poll_cancel.token();
        Some(tokio::spawn(async move { watchdog.run(ctx).await }))
    } else {
        tracing::warn!("watchdog disabled in config; inbox will not be polled");
        None
    };

    let health_task = if config.monitoring.enable_health_checks {
        let registry = build_registry(
            Arc::clone(&store),
            writer,
            (*gateway).clone(),
            Arc::clone(&metrics),
            Some(alerts.clone()),
        );
        let interval = config.monitoring.metrics_interval.max(Duration::from_secs(1));
        let ctx = poll_cancel.token();
        Some(tokio::spawn(async move {
            loop {
                let report = registry.check_all(SystemClock.epoch_ms()).await;
                tracing::debug!(aggregate = %report.aggregate, "health sweep");
                tokio::select! {
                    _ = ctx.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }))
    } else {
        None
    };

    tracing::info!(
        input_dir = %paths.input_dir.display(),
        workers = config.watchdog.processing_threads,
        concurrent = config.pipeline.enable_parallel_processing,
        "AIRES daemon ready"
    );
    println!("READY");

    // Idle until asked to stop.
    shutdown.cancelled().await;
    tracing::info!("shutdown requested, draining in-flight jobs");

    // 1. Stop polling and claiming; workers finish their current job.
    poll_cancel.cancel();
    let drain = async {
        for worker in workers {
            let _ = worker.await;
        }
    };
    if tokio::time::timeout(options.shutdown_deadline, drain)
        .await
        .is_err()
    {
        tracing::warn!(
            deadline_s = options.shutdown_deadline.as_secs(),
            "shutdown deadline exceeded, force-cancelling jobs"
        );
    }
    // 2. Cancel the job context: force-cancels overrunning pipelines and
    // turns pending retry timers into cancelled jobs, releasing their claims.
    job_cancel.cancel();

    if let Some(task) = watchdog_task {
        let _ = task.await;
    }
    if let Some(task) = health_task {
        task.abort();
    }

    // 3. Drain the alert queue before exit.
    alert_cancel.cancel();
    let _ = alert_task.await;

    tracing::info!("daemon stopped");
    Ok(())
}

/// Process one file end to end, outside the watchdog loop (`once` mode).
/// Returns the booklet's absolute path.
pub async fn process_single_file(
    store: Arc<ConfigStore>,
    input: &Path,
    dialect: ParserDialect,
) -> Result<PathBuf, DaemonError> {
    let config = store.get();
    let raw = std::fs::read_to_string(input)?;

    let metrics = Arc::new(Metrics::new());
    let gateway = Arc::new(build_gateway(&config));
    let orchestrator = build_orchestrator(
        &config,
        gateway,
        build_parser(dialect),
        Arc::clone(&metrics),
    );
    let writer = build_writer(&config);

    let pipeline_input = aires_engine::PipelineInput {
        raw_compiler_output: raw,
        source_file: input.to_path_buf(),
        ..aires_engine::PipelineInput::default()
    };
    let booklet = orchestrator
        .run(&pipeline_input, None, &CancelToken::never())
        .await?;
    let relative = crate::worker::booklet_relative_path(input);
    let saved = writer.save(&booklet, &relative)?;
    metrics.record_booklet_saved(SystemClock.epoch_ms());
    Ok(saved)
}

/// One health sweep over the standard probe set, for `status`.
pub async fn status_report(store: Arc<ConfigStore>) -> HealthReport {
    let config = store.get();
    let registry = build_registry(
        Arc::clone(&store),
        build_writer(&config),
        build_gateway(&config),
        Arc::new(Metrics::new()),
        None,
    );
    registry.check_all(SystemClock.epoch_ms()).await
}

/// Exit code for a status report: 0 unless the aggregate is unhealthy.
pub fn status_exit_code(report: &HealthReport) -> i32 {
    match report.aggregate {
        HealthLevel::Unhealthy => 3,
        _ => 0,
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
