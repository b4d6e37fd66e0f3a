// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM gateway adapters.

mod balancer;
mod ollama;
mod traced;

pub use balancer::{BalancedGateway, EndpointConfig, EndpointSnapshot};
pub use ollama::OllamaGateway;
pub use traced::TracedGateway;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGateway, GenerateCall};

use aires_core::{CancelToken, HealthStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Sampling parameters forwarded to the inference server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            num_predict: 2048,
        }
    }
}

/// One inference request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Token accounting reported by the server, normalized to milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_duration_ms: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Successful inference result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOutput {
    pub text: String,
    pub usage: TokenUsage,
    /// Transparent retries spent obtaining this result.
    pub retries: u32,
}

/// Gateway failure taxonomy. `is_transient` drives job-level retry
/// classification in the watchdog.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("no endpoint available within {0:?}")]
    NoEndpoint(Duration),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Transient errors are worth another job-level attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Network(_)
                | GatewayError::Timeout(_)
                | GatewayError::Server { .. }
                | GatewayError::NoEndpoint(_)
        )
    }

    /// Errors the gateway itself retries in-call (transport and 5xx).
    fn retryable_in_call(&self) -> bool {
        matches!(
            self,
            GatewayError::Network(_) | GatewayError::Timeout(_) | GatewayError::Server { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Network(_) => "GATEWAY_NETWORK_ERROR",
            GatewayError::Timeout(_) => "GATEWAY_TIMEOUT",
            GatewayError::ModelNotLoaded(_) => "GATEWAY_MODEL_NOT_LOADED",
            GatewayError::BadRequest(_) => "GATEWAY_BAD_REQUEST",
            GatewayError::Server { .. } => "GATEWAY_SERVER_ERROR",
            GatewayError::NoEndpoint(_) => "NO_ENDPOINT_AVAILABLE",
            GatewayError::InvalidResponse(_) => "GATEWAY_INVALID_RESPONSE",
            GatewayError::Cancelled => "GATEWAY_CANCELLED",
        }
    }
}

/// Adapter for the inference HTTP service.
///
/// `generate` is assumed idempotent: inference is stateless from the
/// gateway's perspective, so retrying a failed call is always safe.
#[async_trait]
pub trait LlmGateway: Send + Sync + 'static {
    /// Run one inference call. Cancellation via `ctx` aborts the in-flight
    /// HTTP request immediately.
    async fn generate(
        &self,
        request: &GenerateRequest,
        ctx: &CancelToken,
    ) -> Result<GenerateOutput, GatewayError>;

    /// Liveness of the service itself (model list endpoint).
    async fn service_health(&self) -> HealthStatus;

    /// Deep health of one model: listed and answering a trivial prompt.
    async fn model_health(&self, model: &str) -> HealthStatus;
}
