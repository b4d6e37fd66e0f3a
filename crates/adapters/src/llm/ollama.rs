// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the Ollama-compatible inference API.
//!
//! `generate` retries transport failures and 5xx responses with exponential
//! backoff (2s, 4s, 8s, ...); 4xx responses are never retried. Cancellation
//! aborts the in-flight request at the next await point.

use super::{
    GatewayError, GenerateOptions, GenerateOutput, GenerateRequest, LlmGateway, TokenUsage,
};
use aires_core::{CancelToken, HealthStatus};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Timeout for health probes, independent of the generation timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Model latency above this degrades (not fails) the model health check.
const DEFAULT_WARN_LATENCY: Duration = Duration::from_secs(2);

/// Prompt used by the deep model health check.
const HEALTH_PROMPT: &str = "Reply with OK.";

#[derive(Clone)]
pub struct OllamaGateway {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    retry_base: Duration,
    warn_latency: Duration,
}

impl OllamaGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
            timeout,
            max_retries: 3,
            retry_base: Duration::from_secs(2),
            warn_latency: DEFAULT_WARN_LATENCY,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// First backoff delay; doubles per retry. Tests shrink this.
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    pub fn with_warn_latency(mut self, warn_latency: Duration) -> Self {
        self.warn_latency = warn_latency;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate_once(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateOutput, GatewayError> {
        let body = serde_json::json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.options.temperature,
                "top_p": request.options.top_p,
                "num_predict": request.options.num_predict,
            },
        });

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.timeout)
                } else {
                    GatewayError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(GatewayError::ModelNotLoaded(request.model.clone()));
        }
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::BadRequest(format!(
                "status {}: {}",
                status.as_u16(),
                message
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let Some(text) = parsed.response else {
            return Err(GatewayError::InvalidResponse(
                "missing `response` field".to_string(),
            ));
        };

        Ok(GenerateOutput {
            text,
            usage: TokenUsage {
                total_duration_ms: parsed.total_duration.unwrap_or(0) / 1_000_000,
                prompt_tokens: parsed.prompt_eval_count.unwrap_or(0),
                completion_tokens: parsed.eval_count.unwrap_or(0),
            },
            retries: 0,
        })
    }

    async fn fetch_tags(&self) -> Result<TagsResponse, GatewayError> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(PROBE_TIMEOUT)
                } else {
                    GatewayError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmGateway for OllamaGateway {
    async fn generate(
        &self,
        request: &GenerateRequest,
        ctx: &CancelToken,
    ) -> Result<GenerateOutput, GatewayError> {
        let mut attempt: u32 = 0;
        loop {
            let result = tokio::select! {
                _ = ctx.cancelled() => return Err(GatewayError::Cancelled),
                result = self.generate_once(request) => result,
            };

            match result {
                Ok(mut output) => {
                    output.retries = attempt;
                    return Ok(output);
                }
                Err(e) if e.retryable_in_call() && attempt < self.max_retries => {
                    // Delays follow 2^n seconds for n = 1..MaxRetries.
                    let delay = self.retry_base * (1u32 << attempt);
                    attempt += 1;
                    tracing::warn!(
                        model = %request.model,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "generate failed, retrying"
                    );
                    tokio::select! {
                        _ = ctx.cancelled() => return Err(GatewayError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn service_health(&self) -> HealthStatus {
        let start = Instant::now();
        match self.fetch_tags().await {
            Ok(tags) => HealthStatus::healthy("llm-service")
                .with_latency_ms(start.elapsed().as_millis() as u64)
                .with_diagnostic("base_url", &self.base_url)
                .with_diagnostic("models", tags.models.len().to_string()),
            Err(e) => {
                let mut status = HealthStatus::unhealthy("llm-service", e.to_string());
                status.latency_ms = start.elapsed().as_millis() as u64;
                status.with_diagnostic("base_url", &self.base_url)
            }
        }
    }

    async fn model_health(&self, model: &str) -> HealthStatus {
        let component = format!("llm-model:{model}");
        let tags = match self.fetch_tags().await {
            Ok(tags) => tags,
            Err(e) => return HealthStatus::unhealthy(component, e.to_string()),
        };
        let listed = tags
            .models
            .iter()
            .any(|m| m.name == model || m.name.split(':').next() == Some(model));
        if !listed {
            return HealthStatus::unhealthy(component, format!("model {model} not listed"));
        }

        let request = GenerateRequest::new(model, HEALTH_PROMPT).with_options(GenerateOptions {
            num_predict: 8,
            ..GenerateOptions::default()
        });
        let start = Instant::now();
        match self.generate_once(&request).await {
            Ok(_) => {
                let elapsed = start.elapsed();
                let latency_ms = elapsed.as_millis() as u64;
                if elapsed > self.warn_latency {
                    HealthStatus::degraded(
                        component,
                        format!("latency {}ms above warn threshold", latency_ms),
                    )
                    .with_latency_ms(latency_ms)
                } else {
                    HealthStatus::healthy(component).with_latency_ms(latency_ms)
                }
            }
            Err(e) => {
                let mut status = HealthStatus::unhealthy(component, e.to_string());
                status.latency_ms = start.elapsed().as_millis() as u64;
                status
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[allow(dead_code)]
    done: Option<bool>,
    /// Nanoseconds, per the Ollama wire format.
    total_duration: Option<u64>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[cfg(test)]
#[path = "ollama_tests.rs"]
mod tests;
