//! Error types shared across the generation workflow.
//!
//! [`GenerationError`] replaces the old convention of returning a
//! `"[Error ..."`-prefixed string from the generation call. Callers match on
//! the variant instead of searching for a prefix; the `Display` output still
//! renders the historical sentinel text so log lines and HTTP error payloads
//! keep their familiar shape.
//!
//! [`SheetError`] covers every failure of the spreadsheet backend. Both types
//! are produced by infrastructure crates and consumed by the orchestration
//! layer.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Generation errors
// ---------------------------------------------------------------------------

/// A single text-generation call did not yield usable text.
///
/// Never raised past the row it belongs to: the row processor records the
/// failure and leaves the row untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The inference service answered with a non-success HTTP status.
    #[error("[Error {status}]: {body}")]
    Upstream {
        /// Numeric HTTP status code.
        status: u16,
        /// Raw response body, as returned by the service.
        body: String,
    },

    /// The service answered 200 but the payload was not a list whose first
    /// element carries `generated_text`.
    #[error("[Error: Invalid response format]")]
    InvalidResponseFormat,

    /// The request exceeded the configured timeout.
    #[error("[Error: request timed out]")]
    TimedOut,

    /// Any other transport or decoding failure.
    #[error("[Error: {message}]")]
    Transport {
        /// Text of the underlying error.
        message: String,
    },
}

impl GenerationError {
    /// Prefix shared by the rendered form of every variant.
    pub const SENTINEL: &'static str = "[Error";

    /// Short machine-readable tag for logs and JSON payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream { .. } => "upstream",
            Self::InvalidResponseFormat => "invalid_response_format",
            Self::TimedOut => "timed_out",
            Self::Transport { .. } => "transport",
        }
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet errors
// ---------------------------------------------------------------------------

/// Failure talking to the spreadsheet backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// The service-account credential file could not be read or parsed.
    #[error("Invalid service account credentials: {message}")]
    Credentials {
        /// Description of the problem.
        message: String,
    },

    /// The OAuth token exchange failed.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Description returned by the token endpoint (or the signer).
        message: String,
    },

    /// The named spreadsheet or worksheet does not exist or is not shared
    /// with the service account.
    #[error("Spreadsheet not found: {name}")]
    NotFound {
        /// Name that failed to resolve.
        name: String,
    },

    /// The spreadsheet API answered with a non-success HTTP status.
    #[error("Spreadsheet API error {status}: {body}")]
    Upstream {
        /// Numeric HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The spreadsheet API returned a body that could not be interpreted.
    #[error("Malformed spreadsheet response: {message}")]
    MalformedResponse {
        /// Description of the decoding problem.
        message: String,
    },

    /// Network-level failure.
    #[error("Spreadsheet transport error: {message}")]
    Transport {
        /// Text of the underlying error.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// A row number supplied by a caller does not address a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid row number {value}: data rows start at 2")]
pub struct InvalidRowIndex {
    /// The rejected value.
    pub value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_generation_error_renders_with_sentinel_prefix() {
        let errors = [
            GenerationError::Upstream {
                status: 503,
                body: "model loading".to_string(),
            },
            GenerationError::InvalidResponseFormat,
            GenerationError::TimedOut,
            GenerationError::Transport {
                message: "connection reset".to_string(),
            },
        ];
        for err in errors {
            assert!(
                err.to_string().starts_with(GenerationError::SENTINEL),
                "{err}"
            );
        }
    }

    #[test]
    fn upstream_error_renders_status_and_body() {
        let err = GenerationError::Upstream {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "[Error 429]: rate limited");
    }

    #[test]
    fn timeout_renders_distinct_text() {
        assert_eq!(
            GenerationError::TimedOut.to_string(),
            "[Error: request timed out]"
        );
    }
}
