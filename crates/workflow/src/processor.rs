//! The per-row generation workflow.
//!
//! ```text
//! Pending ──(ineligible)──────────────────────────▶ Skipped
//!    │
//!    └──▶ Generating (meta, header, body, keywords) ──▶ Committed
//!                                                  └──▶ Failed
//! ```
//!
//! A row is either written in full (all four generations succeeded and the
//! eight-cell output span was updated in one call) or not written at all.

use std::sync::Arc;

use pipeline::{
    CellRange, GeneratedContent, GenerationError, GenerationTask, OutputTuple, Row, RowIndex,
    RowSelection, SheetError, TextGenerator, Worksheet,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::PacingPolicy;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row had no prompt or a terminal status; nothing was called or written.
    Skipped,
    /// All four texts were generated and written to `range`.
    Committed { range: CellRange },
    /// Nothing was written.
    Failed(RowFailure),
}

/// Why a row that was eligible did not get committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowFailure {
    /// A generation call failed. `task` is the first failing task in call order.
    #[error("generation task '{task}' failed: {error}")]
    Generation {
        task: GenerationTask,
        error: GenerationError,
    },

    /// Every generation succeeded but the write was rejected.
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Counters reported at the end of a full-sheet scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub examined: usize,
    pub committed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: &RowOutcome) {
        self.examined += 1;
        match outcome {
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Committed { .. } => self.committed += 1,
            RowOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// What the processor does with the remaining tasks once one has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Issue all four calls regardless, then decide.
    #[default]
    CompleteAll,
    /// Stop calling the generator after the first failure.
    StopEarly,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Drives the generation workflow against one worksheet and one generator.
///
/// Calls are strictly sequential: one row at a time, one generation at a
/// time.
pub struct RowProcessor<G: ?Sized, W: ?Sized> {
    generator: Arc<G>,
    sheet: Arc<W>,
    pacing: PacingPolicy,
    failure_policy: FailurePolicy,
}

impl<G, W> RowProcessor<G, W>
where
    G: TextGenerator + ?Sized,
    W: Worksheet + ?Sized,
{
    pub fn new(generator: Arc<G>, sheet: Arc<W>) -> Self {
        Self {
            generator,
            sheet,
            pacing: PacingPolicy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Processes every data row of the worksheet in order.
    ///
    /// Per-row failures are logged and counted; only a failure to read the
    /// worksheet itself is returned as an error.
    #[instrument(skip_all)]
    pub async fn run_scan(&self) -> Result<ScanSummary, SheetError> {
        let rows = RowSelection::Scan.load(self.sheet.as_ref()).await?;
        let mut summary = ScanSummary::default();

        for (index, row) in &rows {
            let outcome = self.process_row(*index, row).await;
            summary.record(&outcome);
            if matches!(outcome, RowOutcome::Committed { .. }) {
                self.pacing.pause().await;
            }
        }

        info!(
            examined = summary.examined,
            committed = summary.committed,
            skipped = summary.skipped,
            failed = summary.failed,
            "scan complete"
        );
        Ok(summary)
    }

    /// Processes exactly one row. No pacing is applied.
    #[instrument(skip_all, fields(row = %index))]
    pub async fn run_targeted(&self, index: RowIndex) -> Result<RowOutcome, SheetError> {
        let rows = RowSelection::Targeted(index)
            .load(self.sheet.as_ref())
            .await?;
        let mut outcome = RowOutcome::Skipped;
        for (index, row) in &rows {
            outcome = self.process_row(*index, row).await;
        }
        Ok(outcome)
    }

    /// Runs the eligibility check, the four generation calls, and the commit
    /// for one row.
    #[instrument(skip_all, fields(row = %index))]
    pub async fn process_row(&self, index: RowIndex, row: &Row) -> RowOutcome {
        if !row.is_eligible() {
            debug!(status = %row.status, "row not eligible, skipping");
            return RowOutcome::Skipped;
        }

        let content = match self.generate_content(row).await {
            Ok(content) => content,
            Err(failure) => return RowOutcome::Failed(failure),
        };

        let range = CellRange::output_span(index);
        match self.sheet.update(&range, &OutputTuple::from(content)).await {
            Ok(()) => {
                info!(range = %range, "row committed");
                RowOutcome::Committed { range }
            }
            Err(error) => {
                warn!(range = %range, error = %error, "failed to write generated content");
                RowOutcome::Failed(RowFailure::Sheet(error))
            }
        }
    }

    async fn generate_content(&self, row: &Row) -> Result<GeneratedContent, RowFailure> {
        let mut content = GeneratedContent::default();
        let mut first_failure = None;

        for task in GenerationTask::ORDER {
            let prompt = task.prompt_for(row);
            match self.generator.generate(&prompt).await {
                Ok(text) => content.set(task, text),
                Err(error) => {
                    warn!(task = %task, kind = error.kind(), error = %error, "generation failed");
                    if first_failure.is_none() {
                        first_failure = Some(RowFailure::Generation { task, error });
                    }
                    if self.failure_policy == FailurePolicy::StopEarly {
                        break;
                    }
                }
            }
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(content),
        }
    }
}
