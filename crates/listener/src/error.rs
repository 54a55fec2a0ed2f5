//! Mapping of workflow failures onto HTTP responses.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipeline::{GenerationError, GenerationTask, SheetError};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use workflow::RowFailure;

/// Every non-success outcome of `POST /generate`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid or missing row number")]
    InvalidRow,

    #[error("One or more generation tasks failed")]
    GenerationFailed {
        task: GenerationTask,
        error: GenerationError,
    },

    #[error("{0}")]
    Sheet(#[from] SheetError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRow => StatusCode::BAD_REQUEST,
            Self::GenerationFailed { .. } | Self::Sheet(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RowFailure> for ApiError {
    fn from(failure: RowFailure) -> Self {
        match failure {
            RowFailure::Generation { task, error } => Self::GenerationFailed { task, error },
            RowFailure::Sheet(error) => Self::Sheet(error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::GenerationFailed { task, error } => json!({
                "error": self.to_string(),
                "task": task,
                "detail": error.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Converts a handler panic into a 500 JSON response.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(detail = %detail, "request handler panicked");
    ApiError::Internal(detail).into_response()
}
