//! blogsheet text-generation adapter.
//!
//! Implements the [`pipeline::TextGenerator`] trait for the Hugging Face
//! serverless inference API. Other providers are added as new types in this
//! crate without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, bearer authentication, request
//! formatting, and response parsing live here. The [`pipeline`] crate sees
//! only [`pipeline::TextGenerator`] and [`pipeline::GenerationError`].
//!
//! ## Failure mapping
//!
//! Every call makes exactly one attempt. Nothing is retried and nothing
//! panics; each failure becomes a [`pipeline::GenerationError`] variant:
//!
//! | Condition | Variant |
//! |-----------|---------|
//! | HTTP status other than 200 | `Upstream { status, body }` |
//! | 200 but not `[{"generated_text": ...}, ...]` | `InvalidResponseFormat` |
//! | Timeout, with [`TimeoutReporting::Distinct`] | `TimedOut` |
//! | Any other transport or decoding error | `Transport { message }` |

mod client;
mod config;

pub use client::{parse_generated_text, HuggingFaceClient};
pub use config::{
    model_endpoint, InferenceConfig, SamplingParameters, TimeoutReporting, DEFAULT_ENDPOINT_BASE,
    DEFAULT_MODEL,
};

use thiserror::Error;

/// Errors raised while constructing a client. Per-call failures are
/// [`pipeline::GenerationError`]s instead.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No bearer token was configured.
    #[error("inference API token is empty")]
    MissingToken,

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}
