//! Port traits implemented by the infrastructure crates.
//!
//! The orchestration layer depends only on these traits; `llm` and `sheets`
//! provide the production implementations and `workflow::test_support`
//! provides in-memory ones.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{CellRange, GenerationError, OutputTuple, RowIndex, SheetError};

/// Turns a natural-language prompt into generated text.
///
/// Implementations make exactly one attempt per call and report every
/// failure through [`GenerationError`]; they never panic on upstream errors.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// A single worksheet addressed by 1-based row numbers, with row 1 as header.
#[async_trait]
pub trait Worksheet: Send + Sync {
    /// Reads every data row as a record keyed by the header row's values.
    ///
    /// Record `i` corresponds to worksheet row `i + 2`.
    async fn records(&self) -> Result<Vec<HashMap<String, String>>, SheetError>;

    /// Reads the positional cell values of one row. Trailing empty cells may
    /// be omitted by the backend.
    async fn row_values(&self, row: RowIndex) -> Result<Vec<String>, SheetError>;

    /// Overwrites `range` with `values` in a single call.
    async fn update(&self, range: &CellRange, values: &OutputTuple) -> Result<(), SheetError>;
}
