// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four stage executors.
//!
//! Each stage is a pure adapter: typed input in, one gateway call, typed
//! output out. Response parsing is deliberately lenient: a well-formed HTTP
//! response never fails a stage; unrecognized text degrades to a single
//! finding carrying the raw content.

use crate::error::PipelineError;
use aires_adapters::{GenerateOptions, GenerateRequest, LlmGateway};
use aires_core::{
    Booklet, BookletSection, CancelToken, ContextAnalysis, DocAnalysis, ErrorBatch, ModelFinding,
    PatternValidation,
};
use std::collections::BTreeMap;

/// Cap on how much of each upstream document is quoted into a prompt.
const PROMPT_CONTEXT_LIMIT: usize = 4_000;

/// Model names for the four stages, straight from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageModels {
    pub mistral: String,
    pub deepseek: String,
    pub codegemma: String,
    pub gemma2: String,
}

/// A stage's typed value plus the retries spent producing it.
#[derive(Debug, Clone)]
pub struct StageResult<T> {
    pub value: T,
    pub retries: u32,
}

/// Stage 1: documentation research over the raw errors (mistral).
#[derive(Debug, Clone)]
pub struct DocAnalyzer {
    pub model: String,
    pub options: GenerateOptions,
}

impl DocAnalyzer {
    pub async fn run<G: LlmGateway>(
        &self,
        gateway: &G,
        batch: &ErrorBatch,
        code_context: &str,
        ctx: &CancelToken,
    ) -> Result<StageResult<DocAnalysis>, PipelineError> {
        let prompt = format!(
            "You are a compiler documentation researcher. For each error below, \
             explain what the error code means and cite the relevant documentation.\n\n\
             Errors:\n{}\n\nCode context:\n{}\n\n\
             Answer with a one-line summary first, then details. \
             List documentation URLs on their own lines.",
            render_errors(batch),
            truncate(code_context, PROMPT_CONTEXT_LIMIT),
        );
        let request = GenerateRequest::new(&self.model, prompt).with_options(self.options);
        let output = gateway
            .generate(&request, ctx)
            .await
            .map_err(|source| match source {
                aires_adapters::GatewayError::Cancelled => PipelineError::Cancelled,
                source => PipelineError::DocAnalysis { source },
            })?;

        let summary = first_line(&output.text);
        let references = collect_references(&output.text);
        let finding = ModelFinding::new(&self.model, "Documentation Analysis", &output.text)
            .with_evidence(references.values().cloned().collect());
        Ok(StageResult {
            value: DocAnalysis {
                findings: vec![finding],
                summary,
                references,
            },
            retries: output.retries,
        })
    }
}

/// Stage 2: project-context analysis (deepseek).
#[derive(Debug, Clone)]
pub struct ContextAnalyzer {
    pub model: String,
    pub options: GenerateOptions,
}

impl ContextAnalyzer {
    pub async fn run<G: LlmGateway>(
        &self,
        gateway: &G,
        batch: &ErrorBatch,
        doc: &DocAnalysis,
        code_context: &str,
        project_structure: &str,
        ctx: &CancelToken,
    ) -> Result<StageResult<ContextAnalysis>, PipelineError> {
        let prompt = format!(
            "You are a software project analyst. Given the compiler errors and the \
             documentation research below, identify the project-specific causes and \
             pain points.\n\nErrors:\n{}\n\nDocumentation research:\n{}\n\n\
             Code context:\n{}\n\nProject structure:\n{}\n\n\
             Answer with a one-line summary first, then bullet points (`- `) for \
             each pain point.",
            render_errors(batch),
            truncate(&doc.summary, PROMPT_CONTEXT_LIMIT),
            truncate(code_context, PROMPT_CONTEXT_LIMIT),
            truncate(project_structure, PROMPT_CONTEXT_LIMIT),
        );
        let request = GenerateRequest::new(&self.model, prompt).with_options(self.options);
        let output = gateway
            .generate(&request, ctx)
            .await
            .map_err(|source| match source {
                aires_adapters::GatewayError::Cancelled => PipelineError::Cancelled,
                source => PipelineError::ContextAnalysis { source },
            })?;

        let summary = first_line(&output.text);
        let pain_points = collect_bullets(&output.text);
        let finding = ModelFinding::new(&self.model, "Context Analysis", &output.text);
        Ok(StageResult {
            value: ContextAnalysis {
                findings: vec![finding],
                summary,
                pain_points,
                metadata: BTreeMap::new(),
            },
            retries: output.retries,
        })
    }
}

/// Stage 3: pattern and standards validation (codegemma).
///
/// Violation lines are expected as `VIOLATION: <text>`; their presence flips
/// `overall_compliance` to false.
#[derive(Debug, Clone)]
pub struct PatternChecker {
    pub model: String,
    pub options: GenerateOptions,
}

impl PatternChecker {
    pub async fn run<G: LlmGateway>(
        &self,
        gateway: &G,
        batch: &ErrorBatch,
        context: &ContextAnalysis,
        project_codebase: &str,
        project_standards: &str,
        ctx: &CancelToken,
    ) -> Result<StageResult<PatternValidation>, PipelineError> {
        let prompt = format!(
            "You are a code standards reviewer. Check whether the code touched by \
             these errors follows the project standards.\n\nErrors:\n{}\n\n\
             Context analysis:\n{}\n\nCodebase summary:\n{}\n\nStandards:\n{}\n\n\
             Report each critical violation on its own line prefixed with \
             `VIOLATION: `. If there are none, say so.",
            render_errors(batch),
            truncate(&context.summary, PROMPT_CONTEXT_LIMIT),
            truncate(project_codebase, PROMPT_CONTEXT_LIMIT),
            truncate(project_standards, PROMPT_CONTEXT_LIMIT),
        );
        let request = GenerateRequest::new(&self.model, prompt).with_options(self.options);
        let output = gateway
            .generate(&request, ctx)
            .await
            .map_err(|source| match source {
                aires_adapters::GatewayError::Cancelled => PipelineError::Cancelled,
                source => PipelineError::PatternValidation { source },
            })?;

        let violations = collect_violations(&output.text);
        let finding = ModelFinding::new(&self.model, "Pattern Validation", &output.text);
        Ok(StageResult {
            value: PatternValidation::new(vec![finding], violations),
            retries: output.retries,
        })
    }
}

/// Stage 4: booklet synthesis (gemma2).
#[derive(Debug, Clone)]
pub struct Synthesizer {
    pub model: String,
    pub options: GenerateOptions,
}

impl Synthesizer {
    #[allow(clippy::too_many_arguments)]
    pub async fn run<G: LlmGateway>(
        &self,
        gateway: &G,
        batch: &ErrorBatch,
        doc: &DocAnalysis,
        context: &ContextAnalysis,
        validation: &PatternValidation,
        generated_at_ms: u64,
        ctx: &CancelToken,
    ) -> Result<StageResult<Booklet>, PipelineError> {
        let prompt = format!(
            "You are writing the final section of an error research booklet. \
             Synthesize the analyses below into concrete, ordered fix \
             recommendations.\n\nErrors:\n{}\n\nDocumentation research:\n{}\n\n\
             Context analysis:\n{}\n\nPattern validation:\n{}\n\n\
             Answer with numbered recommendations.",
            render_errors(batch),
            truncate(&doc.summary, PROMPT_CONTEXT_LIMIT),
            truncate(&context.summary, PROMPT_CONTEXT_LIMIT),
            if validation.overall_compliance {
                "compliant".to_string()
            } else {
                validation.critical_violations.join("; ")
            },
        );
        let request = GenerateRequest::new(&self.model, prompt).with_options(self.options);
        let output = gateway
            .generate(&request, ctx)
            .await
            .map_err(|source| match source {
                aires_adapters::GatewayError::Cancelled => PipelineError::Cancelled,
                source => PipelineError::Synthesis { source },
            })?;

        let title = booklet_title(batch);
        let mut booklet = Booklet::new(title, batch.clone(), generated_at_ms);
        booklet.add_section(BookletSection::new(
            1,
            "Documentation Analysis",
            section_body(&doc.summary, doc.findings.first()),
        ));
        booklet.add_section(BookletSection::new(
            2,
            "Context Analysis",
            context_section_body(context),
        ));
        booklet.add_section(BookletSection::new(
            3,
            "Pattern Validation",
            validation_section_body(validation),
        ));
        booklet.add_section(BookletSection::new(4, "Recommended Fixes", &output.text));

        booklet.findings.extend(doc.findings.iter().cloned());
        booklet.findings.extend(context.findings.iter().cloned());
        booklet.findings.extend(validation.findings.iter().cloned());
        booklet.findings.push(ModelFinding::new(
            &self.model,
            "Synthesis",
            &output.text,
        ));

        Ok(StageResult {
            value: booklet,
            retries: output.retries,
        })
    }
}

fn booklet_title(batch: &ErrorBatch) -> String {
    let stem = batch
        .source_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "build-output".to_string());
    format!("Error Research: {stem}")
}

fn section_body(summary: &str, finding: Option<&ModelFinding>) -> String {
    match finding {
        Some(finding) if finding.content != summary => {
            format!("{}\n\n{}", summary, finding.content)
        }
        _ => summary.to_string(),
    }
}

fn context_section_body(context: &ContextAnalysis) -> String {
    let mut body = context.summary.clone();
    if !context.pain_points.is_empty() {
        body.push_str("\n\nPain points:\n");
        for point in &context.pain_points {
            body.push_str(&format!("- {point}\n"));
        }
    }
    body
}

fn validation_section_body(validation: &PatternValidation) -> String {
    if validation.overall_compliance {
        "No critical violations found.".to_string()
    } else {
        let mut body = String::from("Critical violations:\n");
        for violation in &validation.critical_violations {
            body.push_str(&format!("- {violation}\n"));
        }
        body
    }
}

/// Render the error list for a prompt: one `code: message [location]` line each.
fn render_errors(batch: &ErrorBatch) -> String {
    batch
        .errors
        .iter()
        .map(|e| {
            if e.location.is_empty() {
                format!("{}: {}", e.code, e.message)
            } else {
                format!("{}: {} [{}]", e.code, e.message, e.location)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    // Back off to a char boundary.
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// URLs anywhere in the text become numbered references.
fn collect_references(text: &str) -> BTreeMap<String, String> {
    let mut refs = BTreeMap::new();
    let mut n = 1;
    for token in text.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '/' && c != ':');
        if token.starts_with("http://") || token.starts_with("https://") {
            refs.insert(format!("ref-{n}"), token.to_string());
            n += 1;
        }
    }
    refs
}

/// Bullet lines (`- ` or `* `) in document order.
fn collect_bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .map(str::to_string)
        })
        .collect()
}

/// `VIOLATION: <text>` lines, case-insensitive on the keyword.
fn collect_violations(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim().trim_start_matches("- ");
            let lower = trimmed.to_ascii_lowercase();
            lower
                .strip_prefix("violation:")
                .map(|_| trimmed[10..].trim().to_string())
        })
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
