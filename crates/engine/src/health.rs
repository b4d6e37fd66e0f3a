// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health registry: parallel probes, aggregation, edge-triggered alerts.

use aires_adapters::{AlertBus, AlertSeverity};
use aires_core::{format_elapsed_ms, HealthLevel, HealthStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-probe deadline.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for a whole `check_all` sweep.
const DEFAULT_GLOBAL_TIMEOUT: Duration = Duration::from_secs(15);

/// One registered health probe.
#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn check(&self) -> HealthStatus;
}

type BoxedStatusFuture = Pin<Box<dyn Future<Output = HealthStatus> + Send>>;

/// Probe built from a closure, for components that expose a plain
/// health function rather than implement the trait themselves.
pub struct FnProbe {
    name: String,
    check: Box<dyn Fn() -> BoxedStatusFuture + Send + Sync>,
}

impl FnProbe {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HealthStatus> + Send + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(move || Box::pin(f())),
        }
    }

    /// Probe over a synchronous health function.
    pub fn sync<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> HealthStatus + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::new(name, move || {
            let f = Arc::clone(&f);
            async move { f() }
        })
    }
}

#[async_trait]
impl HealthProbe for FnProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> HealthStatus {
        (self.check)().await
    }
}

/// Aggregated result of one sweep.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub aggregate: HealthLevel,
    pub statuses: Vec<HealthStatus>,
}

impl HealthReport {
    /// Plain-text diagnostic report: one line per probe.
    pub fn render(&self) -> String {
        let mut out = format!("overall: {}\n", self.aggregate);
        for status in &self.statuses {
            out.push_str(&format!(
                "  {:<24} {:<10} {:>8}",
                status.component,
                status.level.to_string(),
                format_elapsed_ms(status.latency_ms),
            ));
            if let Some(reason) = status.first_failure() {
                out.push_str(&format!("  {}", reason));
            }
            out.push('\n');
        }
        out
    }
}

/// Registry of probes with edge-triggered transition alerts.
pub struct HealthRegistry {
    probes: Vec<Arc<dyn HealthProbe>>,
    probe_timeout: Duration,
    global_timeout: Duration,
    alerts: Option<AlertBus>,
    previous_aggregate: Mutex<Option<HealthLevel>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            probes: Vec::new(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            global_timeout: DEFAULT_GLOBAL_TIMEOUT,
            alerts: None,
            previous_aggregate: Mutex::new(None),
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_global_timeout(mut self, timeout: Duration) -> Self {
        self.global_timeout = timeout;
        self
    }

    /// Wire the alert bus for Healthy→Unhealthy transition alerts.
    pub fn with_alerts(mut self, alerts: AlertBus) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn register(&mut self, probe: Arc<dyn HealthProbe>) {
        self.probes.push(probe);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Run every probe in parallel, each under the per-probe timeout, the
    /// sweep under the global timeout. Emits edge-triggered alerts on
    /// aggregate transitions.
    pub async fn check_all(&self, now_ms: u64) -> HealthReport {
        let sweep = async {
            let mut join_set = tokio::task::JoinSet::new();
            for (idx, probe) in self.probes.iter().enumerate() {
                let probe = Arc::clone(probe);
                let probe_timeout = self.probe_timeout;
                join_set.spawn(async move {
                    let name = probe.name().to_string();
                    let start = Instant::now();
                    let status = match tokio::time::timeout(probe_timeout, probe.check()).await {
                        Ok(status) => status,
                        Err(_) => HealthStatus::unknown(
                            name,
                            format!("probe timed out after {:?}", probe_timeout),
                        )
                        .with_latency_ms(start.elapsed().as_millis() as u64),
                    };
                    (idx, status)
                });
            }

            let mut statuses: Vec<(usize, HealthStatus)> = Vec::new();
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(entry) => statuses.push(entry),
                    Err(e) => tracing::warn!(error = %e, "health probe task failed"),
                }
            }
            statuses.sort_by_key(|(idx, _)| *idx);
            statuses.into_iter().map(|(_, s)| s).collect::<Vec<_>>()
        };

        let statuses = match tokio::time::timeout(self.global_timeout, sweep).await {
            Ok(statuses) => statuses,
            Err(_) => vec![HealthStatus::unknown(
                "registry",
                format!("health sweep timed out after {:?}", self.global_timeout),
            )],
        };

        let aggregate = HealthLevel::aggregate(statuses.iter().map(|s| s.level));
        self.alert_on_transition(aggregate, &statuses, now_ms);

        HealthReport {
            aggregate,
            statuses,
        }
    }

    /// Critical once when the aggregate leaves Healthy for Unhealthy, Info
    /// once on recovery. Level-triggered spam is deliberately avoided.
    fn alert_on_transition(&self, aggregate: HealthLevel, statuses: &[HealthStatus], now_ms: u64) {
        let mut previous = self.previous_aggregate.lock();
        let before = previous.replace(aggregate);
        drop(previous);

        let Some(alerts) = &self.alerts else { return };
        let became_unhealthy = aggregate == HealthLevel::Unhealthy
            && before.is_some_and(|b| b != HealthLevel::Unhealthy);
        let recovered = aggregate == HealthLevel::Healthy
            && before.is_some_and(|b| b == HealthLevel::Unhealthy);

        if became_unhealthy {
            let mut context = BTreeMap::new();
            for status in statuses.iter().filter(|s| s.level != HealthLevel::Healthy) {
                context.insert(
                    status.component.clone(),
                    status.first_failure().unwrap_or("unhealthy").to_string(),
                );
            }
            alerts.raise(
                AlertSeverity::Critical,
                "health",
                "aggregate health transitioned to unhealthy",
                context,
                now_ms,
            );
        } else if recovered {
            alerts.raise(
                AlertSeverity::Info,
                "health",
                "aggregate health recovered",
                BTreeMap::new(),
                now_ms,
            );
        }
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
