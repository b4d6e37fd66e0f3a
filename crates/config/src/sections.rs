// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed configuration sections bound from the INI document.
//!
//! Binding never fails: a value that does not parse logs a warning, records
//! it on the snapshot (for the Degraded health signal), and falls back to the
//! declared default. Environment variables `AIRES_<SECTION>__<KEY>` override
//! file values.

use crate::document::Document;
use std::path::PathBuf;
use std::time::Duration;

/// Paths AIRES reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoriesSection {
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub temp_directory: PathBuf,
    pub alert_directory: PathBuf,
    pub log_directory: PathBuf,
}

/// Inference server, model names, and sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AiServicesSection {
    pub ollama_base_url: String,
    pub ollama_timeout: Duration,
    pub mistral_model: String,
    pub deepseek_model: String,
    pub codegemma_model: String,
    pub gemma2_model: String,
    pub model_temperature: f64,
    pub model_max_tokens: u32,
    pub model_top_p: f64,
    pub enable_gpu_load_balancing: bool,
    /// Base URLs of the balanced endpoints, e.g. one per GPU. Empty means
    /// the single `ollama_base_url` endpoint.
    pub gpu_endpoints: Vec<String>,
}

/// Pipeline execution knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSection {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub enable_parallel_processing: bool,
    pub batch_size: u32,
    pub max_concurrent_files: u32,
}

/// Inbox polling and worker pool sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogSection {
    pub enabled: bool,
    pub polling_interval: Duration,
    pub file_age_threshold: Duration,
    pub max_queue_size: usize,
    pub processing_threads: usize,
}

/// Input file eligibility limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingSection {
    pub max_file_size_mb: u64,
    pub allowed_extensions: Vec<String>,
    pub max_errors_per_file: usize,
    pub context_lines_before_error: u32,
    pub context_lines_after_error: u32,
}

/// Alert channel toggles and resource thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertingSection {
    pub enabled: bool,
    pub console_alerts: bool,
    pub file_alerts: bool,
    pub windows_event_log: bool,
    pub critical_disk_space_mb: u64,
    pub warning_disk_space_mb: u64,
    pub critical_memory_percent: u32,
    pub warning_memory_percent: u32,
    /// Accepted and carried; no producer is wired to it.
    pub error_rate_threshold_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringSection {
    pub enable_telemetry: bool,
    pub metrics_interval: Duration,
    pub enable_health_checks: bool,
}

/// Immutable configuration snapshot. Replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub directories: DirectoriesSection,
    pub ai_services: AiServicesSection,
    pub pipeline: PipelineSection,
    pub watchdog: WatchdogSection,
    pub processing: ProcessingSection,
    pub alerting: AlertingSection,
    pub logging: LoggingSection,
    pub monitoring: MonitoringSection,
    /// Non-fatal binding problems (bad numerics, etc.) noted at load time.
    pub warnings: Vec<String>,
}

impl Config {
    /// Bind every section from the document, collecting fallback warnings.
    pub fn bind(doc: &Document) -> Self {
        let mut b = Binder {
            doc,
            warnings: Vec::new(),
        };

        let directories = DirectoriesSection {
            input_directory: b.path("Directories", "InputDirectory", "input"),
            output_directory: b.path("Directories", "OutputDirectory", "output"),
            temp_directory: b.path("Directories", "TempDirectory", "temp"),
            alert_directory: b.path("Directories", "AlertDirectory", "alerts"),
            log_directory: b.path("Directories", "LogDirectory", "logs"),
        };
        let ai_services = AiServicesSection {
            ollama_base_url: b.string("AI_Services", "OllamaBaseUrl", "http://localhost:11434"),
            ollama_timeout: b.secs("AI_Services", "OllamaTimeout", 120),
            mistral_model: b.string("AI_Services", "MistralModel", "mistral"),
            deepseek_model: b.string("AI_Services", "DeepSeekModel", "deepseek-coder"),
            codegemma_model: b.string("AI_Services", "CodeGemmaModel", "codegemma"),
            gemma2_model: b.string("AI_Services", "Gemma2Model", "gemma2"),
            model_temperature: b.float("AI_Services", "ModelTemperature", 0.7),
            model_max_tokens: b.int("AI_Services", "ModelMaxTokens", 2048) as u32,
            model_top_p: b.float("AI_Services", "ModelTopP", 0.9),
            enable_gpu_load_balancing: b.bool("AI_Services", "EnableGpuLoadBalancing", false),
            gpu_endpoints: b.list("AI_Services", "GpuEndpoints", &[]),
        };
        let pipeline = PipelineSection {
            max_retries: b.int("Pipeline", "MaxRetries", 3) as u32,
            retry_delay: b.secs("Pipeline", "RetryDelay", 2),
            enable_parallel_processing: b.bool("Pipeline", "EnableParallelProcessing", true),
            batch_size: b.int("Pipeline", "BatchSize", 10) as u32,
            max_concurrent_files: b.int("Pipeline", "MaxConcurrentFiles", 4) as u32,
        };
        let watchdog = WatchdogSection {
            enabled: b.bool("Watchdog", "Enabled", true),
            polling_interval: b.secs("Watchdog", "PollingIntervalSeconds", 30),
            file_age_threshold: Duration::from_secs(
                b.int("Watchdog", "FileAgeThresholdMinutes", 2) * 60,
            ),
            max_queue_size: b.int("Watchdog", "MaxQueueSize", 100) as usize,
            processing_threads: (b.int("Watchdog", "ProcessingThreads", 4) as usize).max(1),
        };
        let processing = ProcessingSection {
            max_file_size_mb: b.int("Processing", "MaxFileSizeMB", 10),
            allowed_extensions: b.list("Processing", "AllowedExtensions", &[".txt", ".log"]),
            max_errors_per_file: b.int("Processing", "MaxErrorsPerFile", 100) as usize,
            context_lines_before_error: b.int("Processing", "ContextLinesBeforeError", 5) as u32,
            context_lines_after_error: b.int("Processing", "ContextLinesAfterError", 5) as u32,
        };
        let alerting = AlertingSection {
            enabled: b.bool("Alerting", "Enabled", true),
            console_alerts: b.bool("Alerting", "ConsoleAlerts", true),
            file_alerts: b.bool("Alerting", "FileAlerts", true),
            windows_event_log: b.bool("Alerting", "WindowsEventLog", false),
            critical_disk_space_mb: b.int("Alerting", "CriticalDiskSpaceMB", 100),
            warning_disk_space_mb: b.int("Alerting", "WarningDiskSpaceMB", 500),
            critical_memory_percent: b.int("Alerting", "CriticalMemoryPercent", 90) as u32,
            warning_memory_percent: b.int("Alerting", "WarningMemoryPercent", 80) as u32,
            error_rate_threshold_percent: b.int("Alerting", "ErrorRateThresholdPercent", 10) as u32,
        };
        let logging = LoggingSection {
            level: b.string("Logging", "Level", "info"),
        };
        let monitoring = MonitoringSection {
            enable_telemetry: b.bool("Monitoring", "EnableTelemetry", false),
            metrics_interval: b.secs("Monitoring", "MetricsInterval", 30),
            enable_health_checks: b.bool("Monitoring", "EnableHealthChecks", true),
        };

        Self {
            directories,
            ai_services,
            pipeline,
            watchdog,
            processing,
            alerting,
            logging,
            monitoring,
            warnings: b.warnings,
        }
    }

    /// Violations of critical fields. Any entry here means Unhealthy.
    pub fn critical_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.directories.input_directory.as_os_str().is_empty() {
            out.push("Directories.InputDirectory is empty".to_string());
        }
        if self.directories.output_directory.as_os_str().is_empty() {
            out.push("Directories.OutputDirectory is empty".to_string());
        }
        if self.ai_services.ollama_base_url.trim().is_empty() {
            out.push("AI_Services.OllamaBaseUrl is empty".to_string());
        }
        if self.processing.allowed_extensions.is_empty() {
            out.push("Processing.AllowedExtensions is empty".to_string());
        }
        out
    }

    /// Default configuration (as if bound from an empty document).
    pub fn default_config() -> Self {
        Self::bind(&Document::parse(""))
    }
}

/// Internal binding cursor: document + env overlay + warning collector.
struct Binder<'a> {
    doc: &'a Document,
    warnings: Vec<String>,
}

impl Binder<'_> {
    /// Raw value with env overlay: `AIRES_<SECTION>__<KEY>` wins over file.
    fn raw(&self, section: &str, key: &str) -> Option<String> {
        let var = format!(
            "AIRES_{}__{}",
            section.to_ascii_uppercase(),
            key.to_ascii_uppercase()
        );
        if let Ok(v) = std::env::var(&var) {
            return Some(v);
        }
        self.doc.get(section, key).map(str::to_string)
    }

    fn string(&mut self, section: &str, key: &str, default: &str) -> String {
        self.raw(section, key).unwrap_or_else(|| default.to_string())
    }

    fn path(&mut self, section: &str, key: &str, default: &str) -> PathBuf {
        PathBuf::from(self.string(section, key, default))
    }

    fn int(&mut self, section: &str, key: &str, default: u64) -> u64 {
        match self.raw(section, key) {
            None => default,
            Some(v) => v.trim().parse().unwrap_or_else(|_| {
                self.fallback(section, key, &v, &default.to_string());
                default
            }),
        }
    }

    fn float(&mut self, section: &str, key: &str, default: f64) -> f64 {
        match self.raw(section, key) {
            None => default,
            Some(v) => v.trim().parse().unwrap_or_else(|_| {
                self.fallback(section, key, &v, &default.to_string());
                default
            }),
        }
    }

    fn bool(&mut self, section: &str, key: &str, default: bool) -> bool {
        match self.raw(section, key) {
            None => default,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    self.fallback(section, key, &v, &default.to_string());
                    default
                }
            },
        }
    }

    /// Seconds value; a trailing `s` is tolerated ("120" and "120s" agree).
    fn secs(&mut self, section: &str, key: &str, default: u64) -> Duration {
        let n = match self.raw(section, key) {
            None => default,
            Some(v) => {
                let trimmed = v.trim().trim_end_matches(['s', 'S']);
                trimmed.parse().unwrap_or_else(|_| {
                    self.fallback(section, key, &v, &default.to_string());
                    default
                })
            }
        };
        Duration::from_secs(n)
    }

    /// Comma-separated list; empty entries dropped.
    fn list(&mut self, section: &str, key: &str, default: &[&str]) -> Vec<String> {
        match self.raw(section, key) {
            None => default.iter().map(|s| s.to_string()).collect(),
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn fallback(&mut self, section: &str, key: &str, got: &str, default: &str) {
        tracing::warn!(
            section,
            key,
            value = got,
            default,
            "unparseable config value, using default"
        );
        self.warnings
            .push(format!("{}.{}: unparseable value {:?}", section, key, got));
    }
}

#[cfg(test)]
#[path = "sections_tests.rs"]
mod tests;
