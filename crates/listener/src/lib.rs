//! blogsheet trigger endpoint.
//!
//! Exposes the generation workflow over HTTP:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /generate` | Run the workflow in the configured [`TriggerMode`] |
//! | `GET /health` | Liveness probe |
//!
//! ## Responses for `POST /generate`
//!
//! | Mode | Situation | Status | Body |
//! |------|-----------|--------|------|
//! | scan | scan finished | 200 | `{"status":"success", examined, committed, skipped, failed}` |
//! | targeted | row committed | 200 | `{"status":"success","row":n}` |
//! | targeted | row finished or without prompt | 200 | `{"message": ...}` |
//! | targeted | `row` missing, not an integer, or < 2 | 400 | `{"error": ...}` |
//! | targeted | a generation task failed | 500 | `{"error": ..., "task": ..., "detail": ...}` |
//! | both | spreadsheet failure or panic | 500 | `{"error": ...}` |
//!
//! Requests are handled one at a time per connection but nothing serialises
//! requests across connections; two triggers for the same row race on the
//! same cells.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, payload validation, and status mapping live
//! here. The workflow itself is [`workflow::RowProcessor`].

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{router, AppState, DynProcessor, TriggerMode};
