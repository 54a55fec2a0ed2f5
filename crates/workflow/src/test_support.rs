//! In-memory doubles for the generator and worksheet ports.
//!
//! Enabled for this crate's own tests and, through the `test-support`
//! feature, for downstream crates that drive a [`crate::RowProcessor`]
//! without a network.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use pipeline::{
    CellRange, GenerationError, OutputTuple, RowIndex, SheetError, TextGenerator, Worksheet,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Generator that answers `"generated: {prompt}"` unless a failure was
/// scripted for a prompt containing a given fragment.
#[derive(Default)]
pub struct ScriptedGenerator {
    failures: Vec<(String, GenerationError)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every prompt containing `fragment` with `error`.
    pub fn failing_on(mut self, fragment: &str, error: GenerationError) -> Self {
        self.failures.push((fragment.to_string(), error));
        self
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// The text returned for a successful prompt.
    pub fn response_for(prompt: &str) -> String {
        format!("generated: {prompt}")
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        lock(&self.prompts).push(prompt.to_string());
        match self
            .failures
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
        {
            Some((_, error)) => Err(error.clone()),
            None => Ok(Self::response_for(prompt)),
        }
    }
}

// ---------------------------------------------------------------------------
// Worksheet
// ---------------------------------------------------------------------------

/// Worksheet held in memory as 1-based rows of cells.
///
/// Writes are applied to the stored cells and also recorded, so tests can
/// assert both on what was sent and on the resulting sheet state.
#[derive(Default)]
pub struct InMemoryWorksheet {
    cells: Mutex<BTreeMap<u32, Vec<String>>>,
    writes: Mutex<Vec<(String, Vec<String>)>>,
    reads: Mutex<usize>,
    write_error: Option<SheetError>,
    read_error: Option<SheetError>,
}

impl InMemoryWorksheet {
    /// Creates a worksheet whose row 1 holds `headers`.
    pub fn with_headers(headers: &[&str]) -> Self {
        let sheet = Self::default();
        lock(&sheet.cells).insert(1, headers.iter().map(|h| h.to_string()).collect());
        sheet
    }

    /// Worksheet with the usual blog layout: inputs in A..B, outputs in C..J
    /// and the status column at H, where the commit writes its marker.
    pub fn blog_layout() -> Self {
        Self::with_headers(&[
            "Title",
            "Prompt",
            "Meta Description",
            "Slug",
            "Header",
            "Body",
            "Image",
            "Status",
            "Notes",
            "Keywords",
        ])
    }

    /// Sets the cells of `row`, starting at column A.
    pub fn with_row(self, row: u32, cells: &[&str]) -> Self {
        lock(&self.cells).insert(row, cells.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn failing_writes(mut self, error: SheetError) -> Self {
        self.write_error = Some(error);
        self
    }

    pub fn failing_reads(mut self, error: SheetError) -> Self {
        self.read_error = Some(error);
        self
    }

    /// Every `(range, values)` pair written so far.
    pub fn writes(&self) -> Vec<(String, Vec<String>)> {
        lock(&self.writes).clone()
    }

    /// Number of read calls (`records` or `row_values`) served.
    pub fn read_count(&self) -> usize {
        *lock(&self.reads)
    }

    /// Current cells of `row`.
    pub fn row(&self, row: u32) -> Vec<String> {
        lock(&self.cells).get(&row).cloned().unwrap_or_default()
    }

    fn begin_read(&self) -> Result<(), SheetError> {
        *lock(&self.reads) += 1;
        match &self.read_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Worksheet for InMemoryWorksheet {
    async fn records(&self) -> Result<Vec<HashMap<String, String>>, SheetError> {
        self.begin_read()?;
        let cells = lock(&self.cells);
        let headers = cells.get(&1).cloned().unwrap_or_default();
        let last_row = cells.keys().next_back().copied().unwrap_or(1);
        Ok((2..=last_row)
            .map(|row| {
                let values = cells.get(&row).cloned().unwrap_or_default();
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, header)| (header.clone(), values.get(i).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect())
    }

    async fn row_values(&self, row: RowIndex) -> Result<Vec<String>, SheetError> {
        self.begin_read()?;
        Ok(self.row(row.as_u32()))
    }

    async fn update(&self, range: &CellRange, values: &OutputTuple) -> Result<(), SheetError> {
        if let Some(error) = &self.write_error {
            return Err(error.clone());
        }
        lock(&self.writes).push((range.to_string(), values.values().to_vec()));

        let first = (pipeline::OUTPUT_FIRST_COLUMN - 1) as usize;
        let mut cells = lock(&self.cells);
        let row = cells.entry(range.row().as_u32()).or_default();
        if row.len() < first + values.values().len() {
            row.resize(first + values.values().len(), String::new());
        }
        for (offset, value) in values.values().iter().enumerate() {
            row[first + offset] = value.clone();
        }
        Ok(())
    }
}
