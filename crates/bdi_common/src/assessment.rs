//! Assessment - runs the symptom analyzer over the whole catalog
//!
//! Entry points for a front-end:
//! - `Aggregator::analyze` blocks until the complete `AnalysisRun` is ready
//! - `Aggregator::stream` yields one `SymptomResult` at a time in catalog
//!   order and is closed with `SymptomStream::finish`
//!
//! Input is validated before any model call. After that nothing fails at run
//! level except cooperative cancellation, which is checked between symptoms.

use crate::analyzer::SymptomAnalyzer;
use crate::catalog::{SymptomDescriptor, BDI_SYMPTOMS};
use crate::error::{AnalysisError, ValidationError};
use crate::llm_client::LlmClient;
use crate::types::SymptomResult;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Overall interpretation of the total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityBand {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

impl SeverityBand {
    pub const ALL: [SeverityBand; 4] = [
        SeverityBand::Minimal,
        SeverityBand::Mild,
        SeverityBand::Moderate,
        SeverityBand::Severe,
    ];

    /// 0-9 Minimal, 10-19 Mild, 20-29 Moderate, 30+ Severe
    pub fn from_score(total_score: u32) -> Self {
        match total_score {
            0..=9 => SeverityBand::Minimal,
            10..=19 => SeverityBand::Mild,
            20..=29 => SeverityBand::Moderate,
            _ => SeverityBand::Severe,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityBand::Minimal => "Minimal",
            SeverityBand::Mild => "Mild",
            SeverityBand::Moderate => "Moderate",
            SeverityBand::Severe => "Severe",
        }
    }

    /// Score range for the interpretation guide
    pub fn range_label(self) -> &'static str {
        match self {
            SeverityBand::Minimal => "0-9",
            SeverityBand::Mild => "10-19",
            SeverityBand::Moderate => "20-29",
            SeverityBand::Severe => "30-63",
        }
    }
}

impl std::fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one complete analysis of one text
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    /// Log correlation only; never stored
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// One entry per catalog item, in catalog order
    pub results: Vec<SymptomResult>,
    pub total_score: u32,
    pub severity_band: SeverityBand,
    /// Results at level 2 or 3
    pub high_severity_count: usize,
}

impl AnalysisRun {
    /// Derive the aggregate from finished results
    pub fn from_results(results: Vec<SymptomResult>) -> Self {
        Self::assemble(Uuid::new_v4(), Utc::now(), 0, results)
    }

    fn assemble(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        elapsed_ms: u64,
        results: Vec<SymptomResult>,
    ) -> Self {
        let total_score = results.iter().map(|r| u32::from(r.level.value())).sum();
        let high_severity_count = results.iter().filter(|r| r.level.is_high()).count();

        Self {
            run_id,
            started_at,
            elapsed_ms,
            results,
            total_score,
            severity_band: SeverityBand::from_score(total_score),
            high_severity_count,
        }
    }

    /// Symptoms requiring attention (level 2 or 3), in catalog order
    pub fn concerning_symptoms(&self) -> impl Iterator<Item = &SymptomResult> {
        self.results.iter().filter(|r| r.level.is_high())
    }

    /// Results that are level-0 fallbacks rather than model judgements
    pub fn unassessed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.assessed).count()
    }

    /// No symptom could be assessed; the score says nothing about the text
    pub fn is_degraded(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| !r.assessed)
    }
}

/// Shared flag for cooperative cancellation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reject input before any work is done
pub fn validate_input(user_text: &str, consent: bool) -> Result<(), ValidationError> {
    if !consent {
        return Err(ValidationError::NoConsent);
    }
    if user_text.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    Ok(())
}

/// Bookkeeping shared by the sequential and parallel paths
struct RunContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    total: usize,
    span: tracing::Span,
}

impl RunContext {
    fn start(total: usize, user_text: &str) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis_run", run_id = %run_id);
        tracing::info!(parent: &span, symptoms = total, text_chars = user_text.chars().count(), "analysis started");
        Self {
            run_id,
            started_at: Utc::now(),
            started: Instant::now(),
            total,
            span,
        }
    }

    fn complete(self, results: Vec<SymptomResult>) -> Result<AnalysisRun, AnalysisError> {
        let _enter = self.span.enter();

        if results.len() < self.total {
            tracing::info!(completed = results.len(), total = self.total, "analysis cancelled");
            return Err(AnalysisError::Cancelled {
                completed: results.len(),
                total: self.total,
            });
        }

        let run = AnalysisRun::assemble(
            self.run_id,
            self.started_at,
            self.started.elapsed().as_millis() as u64,
            results,
        );

        if run.is_degraded() {
            tracing::warn!("no symptom could be assessed; model backend unreachable?");
        }
        tracing::info!(
            total_score = run.total_score,
            band = %run.severity_band,
            high = run.high_severity_count,
            unassessed = run.unassessed_count(),
            elapsed_ms = run.elapsed_ms,
            "analysis complete"
        );

        Ok(run)
    }
}

/// Drives the analyzer over a catalog
pub struct Aggregator<'a> {
    client: &'a dyn LlmClient,
    catalog: &'a [SymptomDescriptor],
    parallelism: usize,
    cancel: CancelToken,
}

impl<'a> Aggregator<'a> {
    /// Aggregator over the BDI catalog, sequential
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self {
            client,
            catalog: &BDI_SYMPTOMS,
            parallelism: 1,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: &'a [SymptomDescriptor]) -> Self {
        self.catalog = catalog;
        self
    }

    /// Concurrent model calls per run; 1 keeps the sequential path
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn catalog(&self) -> &'a [SymptomDescriptor] {
        self.catalog
    }

    /// Lazy per-symptom results in catalog order
    pub fn stream<'s>(
        &'s self,
        user_text: &'s str,
        consent: bool,
    ) -> Result<SymptomStream<'s>, ValidationError> {
        validate_input(user_text, consent)?;

        Ok(SymptomStream {
            analyzer: SymptomAnalyzer::new(self.client),
            catalog: self.catalog,
            user_text,
            cancel: self.cancel.clone(),
            results: Vec::with_capacity(self.catalog.len()),
            context: RunContext::start(self.catalog.len(), user_text),
        })
    }

    /// Run the whole catalog and return the aggregate
    pub fn analyze(&self, user_text: &str, consent: bool) -> Result<AnalysisRun, AnalysisError> {
        if self.parallelism > 1 {
            validate_input(user_text, consent)?;
            return self.analyze_parallel(user_text);
        }
        self.stream(user_text, consent)?.finish()
    }

    fn analyze_parallel(&self, user_text: &str) -> Result<AnalysisRun, AnalysisError> {
        let context = RunContext::start(self.catalog.len(), user_text);
        let analyzer = SymptomAnalyzer::new(self.client);
        let span = context.span.clone();

        let run_one = |symptom: &SymptomDescriptor| {
            let _enter = span.enter();
            if self.cancel.is_cancelled() {
                None
            } else {
                Some(analyzer.analyze(symptom, user_text))
            }
        };

        let outcomes: Vec<Option<SymptomResult>> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
        {
            Ok(pool) => pool.install(|| self.catalog.par_iter().map(run_one).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "thread pool unavailable, analyzing sequentially");
                self.catalog.iter().map(run_one).collect()
            }
        };

        // Skipped symptoms leave gaps; any gap makes the run cancelled
        let results: Vec<SymptomResult> = outcomes.into_iter().flatten().collect();

        context.complete(results)
    }
}

/// Incremental analysis; see `Aggregator::stream`
pub struct SymptomStream<'s> {
    analyzer: SymptomAnalyzer<'s>,
    catalog: &'s [SymptomDescriptor],
    user_text: &'s str,
    cancel: CancelToken,
    results: Vec<SymptomResult>,
    context: RunContext,
}

impl<'s> SymptomStream<'s> {
    /// Symptom the next call to `next` will analyze
    pub fn upcoming(&self) -> Option<&'s SymptomDescriptor> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.catalog.get(self.results.len())
    }

    /// (completed, total)
    pub fn progress(&self) -> (usize, usize) {
        (self.results.len(), self.catalog.len())
    }

    pub fn results(&self) -> &[SymptomResult] {
        &self.results
    }

    /// Analyze whatever is left and build the aggregate
    pub fn finish(mut self) -> Result<AnalysisRun, AnalysisError> {
        while self.next().is_some() {}
        self.context.complete(self.results)
    }
}

impl Iterator for SymptomStream<'_> {
    type Item = SymptomResult;

    fn next(&mut self) -> Option<Self::Item> {
        let symptom = self.upcoming()?;
        let _enter = self.context.span.enter();
        let result = self.analyzer.analyze(symptom, self.user_text);
        self.results.push(result.clone());
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.catalog.len() - self.results.len();
        (0, Some(remaining))
    }
}
