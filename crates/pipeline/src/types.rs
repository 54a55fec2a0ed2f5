//! Value types for the per-row generation workflow.
//!
//! A [`Row`] is read from the worksheet, judged by [`Row::is_eligible`], fanned
//! out into one prompt per [`GenerationTask`], and when every task succeeds,
//! collapsed into an [`OutputTuple`] written to the row's [`CellRange`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::RowIndex;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Header names used when the worksheet is read as keyed records.
pub const TITLE_HEADER: &str = "Title";
pub const PROMPT_HEADER: &str = "Prompt";
pub const STATUS_HEADER: &str = "Status";

/// Status values (already lowercased) that mark a row as finished.
///
/// A row carrying one of these is never regenerated; this is the only thing
/// that makes repeated triggers idempotent.
pub const TERMINAL_STATUSES: [&str; 3] = ["done", "generated ✅", "completed"];

/// Status marker written into a row once its content has been generated.
pub const GENERATED_MARKER: &str = "Generated ✅";

/// The three input fields of a worksheet row.
///
/// All fields are stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub title: String,
    pub prompt: String,
    pub status: String,
}

impl Row {
    pub fn new(
        title: impl Into<String>,
        prompt: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into().trim().to_string(),
            prompt: prompt.into().trim().to_string(),
            status: status.into().trim().to_string(),
        }
    }

    /// Builds a row from a header-keyed record. Missing headers read as empty.
    pub fn from_record(record: &HashMap<String, String>) -> Self {
        let field = |name: &str| record.get(name).map(String::as_str).unwrap_or_default();
        Self::new(
            field(TITLE_HEADER),
            field(PROMPT_HEADER),
            field(STATUS_HEADER),
        )
    }

    /// Builds a row from the positional values of columns A, B, C.
    ///
    /// Short rows (the backend omits trailing empty cells) are padded so a
    /// row with only a title still yields a valid, ineligible [`Row`].
    pub fn from_positional(values: &[String]) -> Self {
        let cell = |i: usize| values.get(i).map(String::as_str).unwrap_or_default();
        Self::new(cell(0), cell(1), cell(2))
    }

    /// Lowercased, trimmed status used for the terminal-status comparison.
    pub fn normalized_status(&self) -> String {
        self.status.trim().to_lowercase()
    }

    /// Returns `true` if the row carries a terminal status.
    pub fn is_finished(&self) -> bool {
        TERMINAL_STATUSES.contains(&self.normalized_status().as_str())
    }

    /// A row is eligible when it has a prompt and has not been finished yet.
    pub fn is_eligible(&self) -> bool {
        !self.prompt.is_empty() && !self.is_finished()
    }
}

// ---------------------------------------------------------------------------
// Generation tasks
// ---------------------------------------------------------------------------

/// One of the four pieces of content generated per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    MetaDescription,
    Header,
    Body,
    Keywords,
}

impl GenerationTask {
    /// The order in which tasks are sent to the generator.
    pub const ORDER: [GenerationTask; 4] = [
        GenerationTask::MetaDescription,
        GenerationTask::Header,
        GenerationTask::Body,
        GenerationTask::Keywords,
    ];

    /// Builds the prompt sent for this task.
    ///
    /// The body task forwards the row's own prompt unmodified; the others are
    /// derived from the title.
    pub fn prompt_for(self, row: &Row) -> String {
        match self {
            Self::MetaDescription => format!("Write an SEO meta description for: {}", row.title),
            Self::Header => format!("Write a compelling blog header for: {}", row.title),
            Self::Body => row.prompt.clone(),
            Self::Keywords => format!("List 5 SEO keywords for: {}", row.title),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MetaDescription => "meta_description",
            Self::Header => "header",
            Self::Body => "body",
            Self::Keywords => "keywords",
        }
    }
}

impl std::fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The four generated texts for one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedContent {
    pub meta_description: String,
    pub header: String,
    pub body: String,
    pub keywords: String,
}

impl GeneratedContent {
    /// Stores the text produced for `task`.
    pub fn set(&mut self, task: GenerationTask, text: String) {
        let slot = match task {
            GenerationTask::MetaDescription => &mut self.meta_description,
            GenerationTask::Header => &mut self.header,
            GenerationTask::Body => &mut self.body,
            GenerationTask::Keywords => &mut self.keywords,
        };
        *slot = text;
    }
}

/// Number of cells written per row.
pub const OUTPUT_WIDTH: u32 = 8;

/// 1-based column where the output span begins (column C).
pub const OUTPUT_FIRST_COLUMN: u32 = 3;

/// The eight values committed to a row, in column order C..J.
///
/// Positions 1, 4 and 6 are blank placeholders owned by other (manual or
/// automated) processes; they are overwritten with empty strings on every
/// commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTuple([String; 8]);

impl OutputTuple {
    pub fn values(&self) -> &[String; 8] {
        &self.0
    }
}

impl From<GeneratedContent> for OutputTuple {
    fn from(content: GeneratedContent) -> Self {
        Self([
            content.meta_description,
            String::new(),
            content.header,
            content.body,
            String::new(),
            GENERATED_MARKER.to_string(),
            String::new(),
            content.keywords,
        ])
    }
}

/// A single-row span of cells in A1 notation, e.g. `C5:J5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    row: RowIndex,
    first_column: u32,
    width: u32,
}

impl CellRange {
    /// The fixed output span (columns C through J) of `row`.
    pub fn output_span(row: RowIndex) -> Self {
        Self {
            row,
            first_column: OUTPUT_FIRST_COLUMN,
            width: OUTPUT_WIDTH,
        }
    }

    pub fn row(&self) -> RowIndex {
        self.row
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last_column = self.first_column + self.width - 1;
        write!(
            f,
            "{}{}:{}{}",
            column_letters(self.first_column),
            self.row,
            column_letters(last_column),
            self.row
        )
    }
}

/// Converts a 1-based column number to spreadsheet letters (1 → A, 27 → AA).
pub fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}
