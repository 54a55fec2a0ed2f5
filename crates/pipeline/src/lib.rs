//! Domain model for blogsheet, the spreadsheet-driven blog content generator.
//!
//! This crate contains the row model, the eligibility rule that keeps
//! repeated triggers idempotent, the prompt templates, the output layout, and
//! the error types shared by every other crate. Infrastructure crates implement
//! the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RowIndex`, `RunId`, sheet names) |
//! | [`types`] | Row, generation tasks, output tuple, cell ranges |
//! | [`errors`] | Generation, spreadsheet, and input-validation errors |
//! | [`ports`] | `TextGenerator` and `Worksheet` traits |
//! | [`selection`] | Scan vs. targeted row selection |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod selection;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{GenerationError, InvalidRowIndex, SheetError};
pub use identifiers::{RowIndex, RunId, SpreadsheetName, WorksheetName};
pub use ports::{TextGenerator, Worksheet};
pub use selection::RowSelection;
pub use types::{
    column_letters, CellRange, GeneratedContent, GenerationTask, OutputTuple, Row,
    GENERATED_MARKER, OUTPUT_FIRST_COLUMN, OUTPUT_WIDTH, TERMINAL_STATUSES,
};
