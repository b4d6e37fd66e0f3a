// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake gateway for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{GatewayError, GenerateOutput, GenerateRequest, LlmGateway, TokenUsage};
use aires_core::{CancelToken, HealthLevel, HealthStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Recorded call to [`FakeGateway::generate`].
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub model: String,
    pub prompt: String,
}

struct FakeState {
    calls: Vec<GenerateCall>,
    /// Scripted results consumed front-to-back; when empty, a canned
    /// response echoing the model name is produced.
    script: VecDeque<Result<String, GatewayError>>,
    service_level: HealthLevel,
    /// Per-call artificial latency, for overlap observation.
    delay: Duration,
    inflight: u32,
    max_inflight: u32,
}

/// Fake gateway for testing.
///
/// Records every call, replays scripted results, and tracks the maximum
/// number of overlapping `generate` calls it observed.
#[derive(Clone)]
pub struct FakeGateway {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                script: VecDeque::new(),
                service_level: HealthLevel::Healthy,
                delay: Duration::ZERO,
                inflight: 0,
                max_inflight: 0,
            })),
        }
    }

    /// Queue a successful response.
    pub fn push_response(&self, text: impl Into<String>) {
        self.inner.lock().script.push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: GatewayError) {
        self.inner.lock().script.push_back(Err(error));
    }

    /// Make `service_health` report the given level.
    pub fn set_service_level(&self, level: HealthLevel) {
        self.inner.lock().service_level = level;
    }

    /// Artificial per-call latency so concurrent callers overlap.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = delay;
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    /// Highest number of overlapping generate calls observed.
    pub fn max_inflight(&self) -> u32 {
        self.inner.lock().max_inflight
    }
}

#[async_trait]
impl LlmGateway for FakeGateway {
    async fn generate(
        &self,
        request: &GenerateRequest,
        ctx: &CancelToken,
    ) -> Result<GenerateOutput, GatewayError> {
        let (delay, scripted) = {
            let mut state = self.inner.lock();
            state.calls.push(GenerateCall {
                model: request.model.clone(),
                prompt: request.prompt.clone(),
            });
            state.inflight += 1;
            state.max_inflight = state.max_inflight.max(state.inflight);
            (state.delay, state.script.pop_front())
        };

        if !delay.is_zero() {
            tokio::select! {
                _ = ctx.cancelled() => {
                    self.inner.lock().inflight -= 1;
                    return Err(GatewayError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.inner.lock().inflight -= 1;
        if ctx.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        match scripted {
            Some(Ok(text)) => Ok(GenerateOutput {
                text,
                usage: TokenUsage {
                    total_duration_ms: delay.as_millis() as u64,
                    prompt_tokens: request.prompt.len() as u64 / 4,
                    completion_tokens: 16,
                },
                retries: 0,
            }),
            Some(Err(error)) => Err(error),
            None => Ok(GenerateOutput {
                text: format!("fake response from {}", request.model),
                usage: TokenUsage::default(),
                retries: 0,
            }),
        }
    }

    async fn service_health(&self) -> HealthStatus {
        let level = self.inner.lock().service_level;
        match level {
            HealthLevel::Healthy => HealthStatus::healthy("llm-service"),
            HealthLevel::Degraded => HealthStatus::degraded("llm-service", "scripted degradation"),
            _ => HealthStatus::unhealthy("llm-service", "scripted outage"),
        }
    }

    async fn model_health(&self, model: &str) -> HealthStatus {
        let level = self.inner.lock().service_level;
        let component = format!("llm-model:{model}");
        match level {
            HealthLevel::Healthy => HealthStatus::healthy(component),
            HealthLevel::Degraded => HealthStatus::degraded(component, "scripted degradation"),
            _ => HealthStatus::unhealthy(component, "scripted outage"),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
