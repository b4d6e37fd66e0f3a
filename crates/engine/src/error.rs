// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the pipeline

use aires_adapters::GatewayError;
use thiserror::Error;

/// Failures of a pipeline run. Each carries a stable code used in logs,
/// alerts, and the failure-counter metrics.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input parsed cleanly but contained zero errors. Not retryable.
    #[error("no errors found in input")]
    NoErrorsFound,

    #[error("documentation analysis failed: {source}")]
    DocAnalysis {
        #[source]
        source: GatewayError,
    },

    #[error("context analysis failed: {source}")]
    ContextAnalysis {
        #[source]
        source: GatewayError,
    },

    #[error("pattern validation failed: {source}")]
    PatternValidation {
        #[source]
        source: GatewayError,
    },

    #[error("booklet synthesis failed: {source}")]
    Synthesis {
        #[source]
        source: GatewayError,
    },

    #[error("booklet save unauthorized: {0}")]
    SaveUnauthorized(String),

    #[error("booklet directory not found: {0}")]
    SaveDirNotFound(String),

    #[error("booklet save failed: {0}")]
    SaveError(String),

    #[error("pipeline status unavailable: {0}")]
    Status(String),

    /// Cancellation surfaced mid-run. Not a failure: the job transitions to
    /// Cancelled, no alert fires.
    #[error("cancelled")]
    Cancelled,

    #[error("unexpected orchestrator failure: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::NoErrorsFound => "NO_ERRORS_FOUND",
            PipelineError::DocAnalysis { .. } => "MISTRAL_ANALYSIS_ERROR",
            PipelineError::ContextAnalysis { .. } => "DEEPSEEK_CONTEXT_ERROR",
            PipelineError::PatternValidation { .. } => "CODEGEMMA_VALIDATION_ERROR",
            PipelineError::Synthesis { .. } => "GEMMA2_GENERATION_ERROR",
            PipelineError::SaveUnauthorized(_) => "BOOKLET_SAVE_UNAUTHORIZED",
            PipelineError::SaveDirNotFound(_) => "BOOKLET_SAVE_DIR_NOT_FOUND",
            PipelineError::SaveError(_) => "BOOKLET_SAVE_ERROR",
            PipelineError::Status(_) => "PIPELINE_STATUS_ERROR",
            PipelineError::Cancelled => "CANCELLED",
            PipelineError::Unexpected(_) => "ORCHESTRATOR_UNEXPECTED",
        }
    }

    /// Transient failures qualify for a job-level retry in the watchdog.
    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::DocAnalysis { source }
            | PipelineError::ContextAnalysis { source }
            | PipelineError::PatternValidation { source }
            | PipelineError::Synthesis { source } => source.is_transient(),
            _ => false,
        }
    }

    /// The underlying gateway error, when a stage caused the failure.
    pub fn gateway_cause(&self) -> Option<&GatewayError> {
        match self {
            PipelineError::DocAnalysis { source }
            | PipelineError::ContextAnalysis { source }
            | PipelineError::PatternValidation { source }
            | PipelineError::Synthesis { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
