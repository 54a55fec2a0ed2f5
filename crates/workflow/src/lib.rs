//! blogsheet row processor.
//!
//! Sequences the calls between the [`pipeline`] ports: reads rows through a
//! [`pipeline::Worksheet`], asks a [`pipeline::TextGenerator`] for the four
//! pieces of content, and commits them back in one write.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The processor contains no transport code and no
//! domain rules of its own; eligibility, prompts, and the output layout all
//! come from [`pipeline`].

pub mod pacing;
pub mod processor;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use pacing::PacingPolicy;
pub use processor::{FailurePolicy, RowFailure, RowOutcome, RowProcessor, ScanSummary};
