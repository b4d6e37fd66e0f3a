// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced gateway wrapper for consistent observability

use super::{GatewayError, GenerateOutput, GenerateRequest, LlmGateway};
use aires_core::{CancelToken, HealthStatus};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any [`LlmGateway`]
#[derive(Clone)]
pub struct TracedGateway<G> {
    inner: G,
}

impl<G> TracedGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: LlmGateway> LlmGateway for TracedGateway<G> {
    async fn generate(
        &self,
        request: &GenerateRequest,
        ctx: &CancelToken,
    ) -> Result<GenerateOutput, GatewayError> {
        async {
            tracing::debug!(prompt_len = request.prompt.len(), "sending");
            let start = std::time::Instant::now();
            let result = self.inner.generate(request, ctx).await;
            let latency_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(output) => tracing::info!(
                    latency_ms,
                    retries = output.retries,
                    completion_tokens = output.usage.completion_tokens,
                    "generated"
                ),
                Err(e) => tracing::error!(latency_ms, error_code = e.code(), error = %e, "generate failed"),
            }
            result
        }
        .instrument(tracing::info_span!("llm.generate", model = %request.model))
        .await
    }

    async fn service_health(&self) -> HealthStatus {
        let status = self.inner.service_health().await;
        tracing::debug!(level = %status.level, "service health checked");
        status
    }

    async fn model_health(&self, model: &str) -> HealthStatus {
        let status = self.inner.model_health(model).await;
        tracing::debug!(model, level = %status.level, "model health checked");
        status
    }
}
