// file: src/extraction/orchestrator.rs
// description: single-shot or section-by-section requirement extraction with merge and fallback
// reference: map-reduce style chunked llm extraction

use super::fallback::FallbackExtractor;
use super::prompt::{self, ExtractionAction, Prompt};
use super::schema::{ParsedResponse, parse_response};
use crate::config::ExtractionConfig;
use crate::error::{PipelineError, Result};
use crate::models::{
    AnalysisMethod, AnalysisResult, AnalysisSummary, DataFields, DraftSection, RequirementRow,
    requirement_id,
};
use crate::parser::sections::{FULL_DOCUMENT, Section, SectionSplitter};
use crate::services::LlmAdapter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info, warn};

/// Attempts per unit of work: the first call plus one retry.
const MAX_ATTEMPTS: usize = 2;

/// Everything one extraction run needs from the caller.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub text: &'a str,
    pub fields: &'a DataFields,
    pub action: ExtractionAction,
    pub kb_context: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    SingleShot,
    Chunked,
    Fallback,
}

/// A unit of work that failed every attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFailure {
    pub index: usize,
    pub header: String,
    pub attempts: usize,
    pub error: String,
}

/// Result of one prompt/parse unit after retries.
#[derive(Debug, Clone)]
pub enum UnitOutcome {
    Extracted(ParsedResponse),
    Failed(SectionFailure),
}

/// Running state of the left fold over sections.
#[derive(Debug, Clone)]
pub struct MergeState {
    pub rows: Vec<RequirementRow>,
    pub next_id: usize,
    pub critical_gaps: Vec<String>,
    pub data_sources_used: Vec<String>,
    pub failures: Vec<SectionFailure>,
    pub succeeded: usize,
    pub draft: Option<Vec<DraftSection>>,
}

impl MergeState {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            critical_gaps: Vec::new(),
            data_sources_used: Vec::new(),
            failures: Vec::new(),
            succeeded: 0,
            draft: None,
        }
    }

    /// Fold one unit into the state. Row ids are re-stamped from the running
    /// counter whatever the model returned.
    pub fn absorb(mut self, outcome: UnitOutcome) -> Self {
        match outcome {
            UnitOutcome::Failed(failure) => self.failures.push(failure),
            UnitOutcome::Extracted(parsed) => {
                self.succeeded += 1;

                let row_sources: Vec<String> = parsed
                    .rows
                    .iter()
                    .filter_map(|r| r.source_field.clone())
                    .collect();
                for source in parsed.data_sources_used.into_iter().chain(row_sources) {
                    if !self.data_sources_used.contains(&source) {
                        self.data_sources_used.push(source);
                    }
                }

                for mut row in parsed.rows {
                    row.id = requirement_id(self.next_id);
                    self.next_id += 1;
                    self.rows.push(row);
                }

                self.critical_gaps.extend(parsed.critical_gaps);
                if self.draft.is_none() {
                    self.draft = parsed.draft;
                }
            }
        }
        self
    }

    /// Close the fold into an llm result. `None` when nothing usable came back.
    pub fn finish(self, gaps_cap: usize) -> Option<AnalysisResult> {
        if self.succeeded == 0 || self.rows.is_empty() {
            return None;
        }

        let (met, not_met, unknown) = AnalysisSummary::count_statuses(&self.rows);
        let mut critical_gaps = self.critical_gaps;
        critical_gaps.truncate(gaps_cap);

        Some(AnalysisResult {
            requirements: self.rows,
            summary: AnalysisSummary {
                met,
                not_met,
                unknown,
                critical_gaps,
                data_sources_used: self.data_sources_used,
            },
            method: AnalysisMethod::Llm,
        })
    }
}

impl Default for MergeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold already-computed section outcomes in document order.
pub fn fold_sections<I>(outcomes: I) -> MergeState
where
    I: IntoIterator<Item = UnitOutcome>,
{
    outcomes
        .into_iter()
        .fold(MergeState::new(), MergeState::absorb)
}

#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub result: AnalysisResult,
    pub mode: ExtractionMode,
    pub section_failures: Vec<SectionFailure>,
    pub llm_draft: Option<Vec<DraftSection>>,
    pub deadline_hit: bool,
}

pub struct ExtractionOrchestrator {
    llm: Option<Arc<dyn LlmAdapter>>,
    splitter: SectionSplitter,
    fallback: FallbackExtractor,
    chunk_threshold_chars: usize,
    single_retry_delay: Duration,
    section_retry_delay: Duration,
    critical_gaps_cap: usize,
    deadline: Option<Duration>,
}

impl ExtractionOrchestrator {
    pub fn new(llm: Option<Arc<dyn LlmAdapter>>, config: &ExtractionConfig) -> Self {
        Self {
            llm,
            splitter: SectionSplitter::new(),
            fallback: FallbackExtractor::new(config.critical_gaps_cap),
            chunk_threshold_chars: config.chunk_threshold_chars,
            single_retry_delay: Duration::from_millis(config.single_retry_delay_ms),
            section_retry_delay: Duration::from_millis(config.section_retry_delay_ms),
            critical_gaps_cap: config.critical_gaps_cap,
            deadline: config.deadline_secs.map(Duration::from_secs),
        }
    }

    /// Overall budget for chunked extraction.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run extraction. Never fails: every failure path ends in the regex fallback.
    pub async fn extract(&self, request: ExtractionRequest<'_>) -> ExtractionOutcome {
        let Some(llm) = self.llm.as_deref() else {
            info!("no llm configured, using regex extraction");
            return self.fall_back(request, Vec::new(), false);
        };

        let char_count = request.text.chars().count();
        let (mode, mut state, deadline_hit) = if char_count > self.chunk_threshold_chars {
            let (state, deadline_hit) = self.run_chunked(llm, request).await;
            (ExtractionMode::Chunked, state, deadline_hit)
        } else {
            (ExtractionMode::SingleShot, self.run_single(llm, request).await, false)
        };

        let section_failures = std::mem::take(&mut state.failures);
        let llm_draft = state.draft.take();

        match state.finish(self.critical_gaps_cap) {
            Some(result) => {
                info!(
                    mode = ?mode,
                    requirements = result.requirements.len(),
                    met = result.summary.met,
                    not_met = result.summary.not_met,
                    unknown = result.summary.unknown,
                    failed_sections = section_failures.len(),
                    "llm extraction completed"
                );
                ExtractionOutcome {
                    result,
                    mode,
                    section_failures,
                    llm_draft,
                    deadline_hit,
                }
            }
            None => {
                warn!(mode = ?mode, "llm extraction produced no requirements, falling back to regex");
                self.fall_back(request, section_failures, deadline_hit)
            }
        }
    }

    async fn run_single(&self, llm: &dyn LlmAdapter, request: ExtractionRequest<'_>) -> MergeState {
        info!(chars = request.text.len(), "single-shot extraction");
        let prompt = prompt::single_shot(
            request.text,
            request.fields,
            request.action,
            request.kb_context,
        );
        let outcome = self
            .call_with_retry(llm, &prompt, FULL_DOCUMENT, self.single_retry_delay)
            .await;

        MergeState::new().absorb(into_unit(outcome, 0, FULL_DOCUMENT))
    }

    async fn run_chunked(
        &self,
        llm: &dyn LlmAdapter,
        request: ExtractionRequest<'_>,
    ) -> (MergeState, bool) {
        let sections = self.splitter.split(request.text);
        let deadline = self.deadline.map(|d| Instant::now() + d);
        info!(sections = sections.len(), "chunked extraction");

        let mut state = MergeState::new();
        for (index, section) in sections.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(
                    skipped = sections.len() - index,
                    "extraction deadline reached, skipping remaining sections"
                );
                return (state, true);
            }

            let call = self.run_section(llm, section, state.next_id, request);
            let outcome = match deadline {
                Some(d) => match timeout_at(d, call).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(
                            section = %section.header,
                            skipped = sections.len() - index,
                            "extraction deadline reached mid-section, skipping remaining sections"
                        );
                        return (state, true);
                    }
                },
                None => call.await,
            };

            state = state.absorb(into_unit(outcome, index, &section.header));
            if let Some(failure) = state.failures.last().filter(|f| f.index == index) {
                warn!(
                    section = %failure.header,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "section skipped after repeated failures"
                );
            }
        }

        (state, false)
    }

    async fn run_section(
        &self,
        llm: &dyn LlmAdapter,
        section: &Section,
        next_id: usize,
        request: ExtractionRequest<'_>,
    ) -> std::result::Result<ParsedResponse, (usize, PipelineError)> {
        debug!(section = %section.header, next_id, "extracting section");
        let prompt = prompt::section(
            &section.header,
            &section.body,
            request.fields,
            next_id,
            request.kb_context,
        );
        self.call_with_retry(llm, &prompt, &section.header, self.section_retry_delay)
            .await
    }

    /// One call plus at most one retry after `delay`, only for retryable errors.
    async fn call_with_retry(
        &self,
        llm: &dyn LlmAdapter,
        prompt: &Prompt,
        default_section: &str,
        delay: Duration,
    ) -> std::result::Result<ParsedResponse, (usize, PipelineError)> {
        let mut attempt = 1;
        loop {
            match attempt_once(llm, prompt, default_section).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(attempt, error = %e, section = default_section, "llm call failed, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err((attempt, e)),
            }
        }
    }

    fn fall_back(
        &self,
        request: ExtractionRequest<'_>,
        section_failures: Vec<SectionFailure>,
        deadline_hit: bool,
    ) -> ExtractionOutcome {
        ExtractionOutcome {
            result: self.fallback.analyze(request.text, request.fields),
            mode: ExtractionMode::Fallback,
            section_failures,
            llm_draft: None,
            deadline_hit,
        }
    }
}

async fn attempt_once(
    llm: &dyn LlmAdapter,
    prompt: &Prompt,
    default_section: &str,
) -> Result<ParsedResponse> {
    let raw = llm.complete(&prompt.system, &prompt.user).await?;
    parse_response(&raw, default_section)
}

fn into_unit(
    outcome: std::result::Result<ParsedResponse, (usize, PipelineError)>,
    index: usize,
    header: &str,
) -> UnitOutcome {
    match outcome {
        Ok(parsed) => UnitOutcome::Extracted(parsed),
        Err((attempts, error)) => UnitOutcome::Failed(SectionFailure {
            index,
            header: header.to_string(),
            attempts,
            error: error.to_string(),
        }),
    }
}
