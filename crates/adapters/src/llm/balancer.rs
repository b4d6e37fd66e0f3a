// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GPU-aware load balancing across inference endpoints.
//!
//! Policy: weighted least-inflight. Candidates are healthy endpoints with
//! spare capacity; among them the lowest `inflight/weight` wins, ties broken
//! by lowest observed latency, then randomly. A failing endpoint is marked
//! unhealthy and re-probed in the background with exponential backoff
//! (capped at 60s). When no candidate exists, callers wait up to the
//! admission deadline before `NoEndpoint`.

use super::{GatewayError, GenerateOutput, GenerateRequest, LlmGateway};
use aires_core::{CancelToken, EndpointId, HealthLevel, HealthStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// EWMA smoothing factor for per-endpoint latency.
const LATENCY_ALPHA: f64 = 0.3;

/// Re-probe backoff cap for unhealthy endpoints.
const REPROBE_CAP: Duration = Duration::from_secs(60);

/// Default bound on how long a caller waits for admission.
const DEFAULT_ADMISSION_DEADLINE: Duration = Duration::from_secs(30);

/// Static description of one balanced endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub id: EndpointId,
    pub base_url: String,
    /// Relative capacity weight; minimum 1.
    pub weight: u32,
    pub max_concurrent: u32,
    /// Free-form labels, e.g. `gpu=0`.
    pub labels: BTreeMap<String, String>,
}

impl EndpointConfig {
    pub fn new(id: impl Into<EndpointId>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            weight: 1,
            max_concurrent: 4,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight.max(1);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: u32) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Point-in-time view of one endpoint, for status output and metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSnapshot {
    pub id: EndpointId,
    pub healthy: bool,
    pub inflight: u32,
    pub last_latency_ms: Option<f64>,
}

struct Slot<G> {
    config: EndpointConfig,
    gateway: G,
}

#[derive(Debug, Clone)]
struct SlotState {
    healthy: bool,
    inflight: u32,
    last_latency_ms: Option<f64>,
    /// True while a background re-probe task owns this endpoint.
    reprobing: bool,
}

impl SlotState {
    fn new() -> Self {
        Self {
            healthy: true,
            inflight: 0,
            last_latency_ms: None,
            reprobing: false,
        }
    }
}

struct Inner<G> {
    slots: Vec<Slot<G>>,
    states: Mutex<Vec<SlotState>>,
    /// Woken whenever capacity may have appeared (release or recovery).
    released: Notify,
    admission_deadline: Duration,
}

/// Load-balancing gateway over one or more endpoints.
///
/// With a single endpoint this degenerates to pass-through admission with
/// zero policy, which is how it runs when GPU balancing is disabled.
pub struct BalancedGateway<G> {
    inner: Arc<Inner<G>>,
}

impl<G> Clone for BalancedGateway<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: LlmGateway> BalancedGateway<G> {
    pub fn new(endpoints: Vec<(EndpointConfig, G)>) -> Self {
        let slots: Vec<Slot<G>> = endpoints
            .into_iter()
            .map(|(config, gateway)| Slot { config, gateway })
            .collect();
        let states = slots.iter().map(|_| SlotState::new()).collect();
        Self {
            inner: Arc::new(Inner {
                slots,
                states: Mutex::new(states),
                released: Notify::new(),
                admission_deadline: DEFAULT_ADMISSION_DEADLINE,
            }),
        }
    }

    /// Single-endpoint form used when balancing is disabled in config.
    pub fn single(id: impl Into<EndpointId>, base_url: impl Into<String>, gateway: G) -> Self {
        let config = EndpointConfig::new(id, base_url).with_max_concurrent(u32::MAX >> 1);
        Self::new(vec![(config, gateway)])
    }

    /// Adjust the admission deadline. Only effective before the balancer is
    /// cloned/shared.
    pub fn with_admission_deadline(mut self, deadline: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.admission_deadline = deadline;
        }
        self
    }

    /// Snapshot of every endpoint's live counters.
    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        let states = self.inner.states.lock();
        self.inner
            .slots
            .iter()
            .zip(states.iter())
            .map(|(slot, state)| EndpointSnapshot {
                id: slot.config.id.clone(),
                healthy: state.healthy,
                inflight: state.inflight,
                last_latency_ms: state.last_latency_ms,
            })
            .collect()
    }

    /// Total in-flight requests across all endpoints.
    pub fn inflight_total(&self) -> u32 {
        self.inner.states.lock().iter().map(|s| s.inflight).sum()
    }

    /// Pick an endpoint and reserve one admission slot on it.
    async fn acquire(&self, ctx: &CancelToken) -> Result<usize, GatewayError> {
        // tokio's clock, so paused-time tests stay deterministic.
        let deadline = tokio::time::Instant::now() + self.inner.admission_deadline;
        loop {
            if let Some(idx) = self.try_pick() {
                return Ok(idx);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(GatewayError::NoEndpoint(self.inner.admission_deadline));
            }
            tokio::select! {
                _ = ctx.cancelled() => return Err(GatewayError::Cancelled),
                _ = self.inner.released.notified() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(GatewayError::NoEndpoint(self.inner.admission_deadline));
                }
            }
        }
    }

    /// One policy decision under the lock. Returns the chosen slot index
    /// with its inflight counter already incremented.
    fn try_pick(&self) -> Option<usize> {
        let mut states = self.inner.states.lock();
        let mut best: Option<(usize, f64, f64)> = None;
        let mut tied: Vec<usize> = Vec::new();

        for (idx, (slot, state)) in self.inner.slots.iter().zip(states.iter()).enumerate() {
            if !state.healthy || state.inflight >= slot.config.max_concurrent {
                continue;
            }
            let load = f64::from(state.inflight) / f64::from(slot.config.weight);
            let latency = state.last_latency_ms.unwrap_or(0.0);
            match best {
                None => {
                    best = Some((idx, load, latency));
                    tied = vec![idx];
                }
                Some((_, best_load, best_latency)) => {
                    if load < best_load || (load == best_load && latency < best_latency) {
                        best = Some((idx, load, latency));
                        tied = vec![idx];
                    } else if load == best_load && latency == best_latency {
                        tied.push(idx);
                    }
                }
            }
        }

        let idx = if tied.len() > 1 {
            tied[rand::rng().random_range(0..tied.len())]
        } else {
            best?.0
        };
        states[idx].inflight += 1;
        Some(idx)
    }

    /// Release an admission slot, folding the call outcome into the counters.
    fn release(&self, idx: usize, latency: Option<Duration>, failed: bool) {
        let mut spawn_reprobe = false;
        {
            let mut states = self.inner.states.lock();
            let state = &mut states[idx];
            state.inflight = state.inflight.saturating_sub(1);
            if let Some(latency) = latency {
                let sample = latency.as_secs_f64() * 1_000.0;
                state.last_latency_ms = Some(match state.last_latency_ms {
                    Some(prev) => LATENCY_ALPHA * sample + (1.0 - LATENCY_ALPHA) * prev,
                    None => sample,
                });
            }
            if failed && state.healthy {
                state.healthy = false;
                if !state.reprobing {
                    state.reprobing = true;
                    spawn_reprobe = true;
                }
            }
        }
        if spawn_reprobe {
            self.spawn_reprobe(idx);
        }
        self.inner.released.notify_waiters();
    }

    /// Background re-probe of an unhealthy endpoint with capped backoff.
    fn spawn_reprobe(&self, idx: usize) {
        let balancer = self.clone();
        tokio::spawn(async move {
            let mut backoff = Duration::from_secs(1);
            loop {
                tokio::time::sleep(backoff).await;
                let status = balancer.inner.slots[idx].gateway.service_health().await;
                let id = balancer.inner.slots[idx].config.id.clone();
                if status.level == HealthLevel::Healthy {
                    tracing::info!(endpoint = %id, "endpoint recovered");
                    let mut states = balancer.inner.states.lock();
                    states[idx].healthy = true;
                    states[idx].reprobing = false;
                    drop(states);
                    balancer.inner.released.notify_waiters();
                    return;
                }
                tracing::warn!(
                    endpoint = %id,
                    backoff_ms = backoff.as_millis() as u64,
                    "endpoint still unhealthy"
                );
                backoff = (backoff * 2).min(REPROBE_CAP);
            }
        });
    }
}

#[async_trait]
impl<G: LlmGateway> LlmGateway for BalancedGateway<G> {
    async fn generate(
        &self,
        request: &GenerateRequest,
        ctx: &CancelToken,
    ) -> Result<GenerateOutput, GatewayError> {
        let idx = self.acquire(ctx).await?;
        let start = Instant::now();
        let result = self.inner.slots[idx].gateway.generate(request, ctx).await;

        match &result {
            Ok(_) => self.release(idx, Some(start.elapsed()), false),
            Err(GatewayError::Cancelled) => self.release(idx, None, false),
            // 4xx is the caller's fault, not the endpoint's.
            Err(GatewayError::BadRequest(_)) | Err(GatewayError::ModelNotLoaded(_)) => {
                self.release(idx, Some(start.elapsed()), false)
            }
            Err(_) => self.release(idx, None, true),
        }
        result
    }

    /// An endpoint counts as healthy only when its liveness flag is set AND
    /// an active probe answers. Probes run one endpoint at a time;
    /// unreachable hosts fail fast, true black holes are bounded by the
    /// caller's probe timeout.
    async fn service_health(&self) -> HealthStatus {
        let total = self.inner.slots.len();
        let mut healthy = 0;
        let mut first_failure: Option<String> = None;
        for (idx, slot) in self.inner.slots.iter().enumerate() {
            let flagged = self.inner.states.lock()[idx].healthy;
            let probe = slot.gateway.service_health().await;
            if flagged && probe.level == HealthLevel::Healthy {
                healthy += 1;
            } else if first_failure.is_none() {
                let reason = if flagged {
                    probe.first_failure().unwrap_or("probe failed").to_string()
                } else {
                    "marked unhealthy by traffic".to_string()
                };
                first_failure = Some(format!("{}: {}", slot.config.id, reason));
            }
        }

        let status = if healthy == total {
            HealthStatus::healthy("llm-service")
        } else if healthy > 0 {
            HealthStatus::degraded(
                "llm-service",
                first_failure.unwrap_or_else(|| {
                    format!("{} of {} endpoints unhealthy", total - healthy, total)
                }),
            )
        } else {
            HealthStatus::unhealthy(
                "llm-service",
                first_failure.unwrap_or_else(|| "all endpoints unhealthy".to_string()),
            )
        };
        status
            .with_diagnostic("endpoints", total.to_string())
            .with_diagnostic("healthy", healthy.to_string())
            .with_diagnostic("inflight", self.inflight_total().to_string())
    }

    async fn model_health(&self, model: &str) -> HealthStatus {
        let idx = {
            let states = self.inner.states.lock();
            states.iter().position(|s| s.healthy)
        };
        match idx {
            Some(idx) => self.inner.slots[idx].gateway.model_health(model).await,
            None => HealthStatus::unhealthy(
                format!("llm-model:{model}"),
                "all endpoints unhealthy",
            ),
        }
    }
}

#[cfg(test)]
#[path = "balancer_tests.rs"]
mod tests;
