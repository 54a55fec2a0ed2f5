//! Router and request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pipeline::{RowIndex, RunId, TextGenerator, Worksheet};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use workflow::{RowOutcome, RowProcessor};

use crate::error::{panic_response, ApiError};

/// The processor as held by the server: generator and worksheet behind trait
/// objects so the production adapters and test doubles are interchangeable.
pub type DynProcessor = RowProcessor<dyn TextGenerator, dyn Worksheet>;

/// Which rows one `POST /generate` processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Every eligible row of the worksheet; the body is ignored.
    Scan,
    /// The single row named by `{"row": n}` in the body.
    #[default]
    Targeted,
}

impl std::str::FromStr for TriggerMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scan" | "batch" => Ok(Self::Scan),
            "targeted" | "row" => Ok(Self::Targeted),
            other => Err(format!("unknown trigger mode '{other}' (expected scan or targeted)")),
        }
    }
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<DynProcessor>,
    pub mode: TriggerMode,
}

impl AppState {
    pub fn new(processor: Arc<DynProcessor>, mode: TriggerMode) -> Self {
        Self { processor, mode }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// POST /generate - runs the workflow for the configured mode.
async fn generate(State(state): State<AppState>, body: Bytes) -> Response {
    let run_id = RunId::new_random();
    let span = info_span!("generate", run_id = %run_id, mode = ?state.mode);
    let result = match state.mode {
        TriggerMode::Scan => run_scan(&state).instrument(span).await,
        TriggerMode::Targeted => run_targeted(&state, &body).instrument(span).await,
    };
    match result {
        Ok(response) => response,
        Err(err) => {
            warn!(run_id = %run_id, status = err.status().as_u16(), error = %err, "generate request failed");
            err.into_response()
        }
    }
}

async fn run_scan(state: &AppState) -> Result<Response, ApiError> {
    let summary = state.processor.run_scan().await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "examined": summary.examined,
            "committed": summary.committed,
            "skipped": summary.skipped,
            "failed": summary.failed,
        })),
    )
        .into_response())
}

async fn run_targeted(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    let row = parse_row(body)?;
    match state.processor.run_targeted(row).await? {
        RowOutcome::Committed { range } => {
            info!(range = %range, "row generated");
            Ok((StatusCode::OK, Json(json!({ "status": "success", "row": row.as_u32() })))
                .into_response())
        }
        RowOutcome::Skipped => Ok((
            StatusCode::OK,
            Json(json!({
                "message": format!(
                    "Row {row} already processed or has no prompt; no generation needed"
                ),
            })),
        )
            .into_response()),
        RowOutcome::Failed(failure) => Err(failure.into()),
    }
}

/// Extracts and validates `row` from a `{"row": <integer>}` body.
///
/// Runs before any spreadsheet or inference access.
fn parse_row(body: &[u8]) -> Result<RowIndex, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| ApiError::InvalidRow)?;
    let raw = payload
        .get("row")
        .and_then(Value::as_i64)
        .ok_or(ApiError::InvalidRow)?;
    RowIndex::new(raw).map_err(|_| ApiError::InvalidRow)
}

#[cfg(test)]
mod tests;
