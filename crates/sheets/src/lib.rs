//! blogsheet spreadsheet adapter.
//!
//! Implements [`pipeline::Worksheet`] on top of the Google Sheets v4 REST
//! API. The spreadsheet is located by name through the Drive v3 API (or by a
//! configured id), and every call is authorised with a service-account
//! access token.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. A1 range
//! syntax, OAuth, and the Sheets JSON shapes are handled here; the
//! [`pipeline`] crate never sees them.
//!
//! ## Writes
//!
//! [`pipeline::Worksheet::update`] is a single `values.update` call with
//! `valueInputOption=RAW`. There is no read-merge: whatever is in the span is
//! replaced, blanks included. Nothing guards against two triggers writing the
//! same row concurrently.

pub mod a1;
pub mod auth;
mod client;

pub use auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenSource};
pub use client::{
    records_from_rows, spreadsheet_query, GoogleSheetsClient, SheetsConfig,
    DEFAULT_DRIVE_API_BASE, DEFAULT_SHEETS_API_BASE,
};
