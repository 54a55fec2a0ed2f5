//! Google Sheets v4 client bound to one worksheet.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    CellRange, OutputTuple, RowIndex, SheetError, SpreadsheetName, Worksheet, WorksheetName,
};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::a1;
use crate::auth::{ServiceAccountKey, ServiceAccountTokenSource, TokenSource};

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Where the worksheet lives and how to authenticate.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Name of the spreadsheet document, resolved through Drive.
    pub spreadsheet: SpreadsheetName,
    /// Skips the Drive lookup when set.
    pub spreadsheet_id: Option<String>,
    pub worksheet: WorksheetName,
    /// Path of the service-account JSON key.
    pub credentials_path: PathBuf,
    pub sheets_api_base: String,
    pub drive_api_base: String,
    pub timeout: Duration,
}

impl SheetsConfig {
    pub fn new(
        spreadsheet: SpreadsheetName,
        worksheet: WorksheetName,
        credentials_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            spreadsheet,
            spreadsheet_id: None,
            worksheet,
            credentials_path: credentials_path.into(),
            sheets_api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            drive_api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [&'a [String; 8]; 1],
}

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

/// [`Worksheet`] backed by the Google Sheets REST API.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    sheets_api_base: Url,
    spreadsheet_id: String,
    worksheet: WorksheetName,
}

impl std::fmt::Debug for GoogleSheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet", &self.worksheet)
            .finish_non_exhaustive()
    }
}

impl GoogleSheetsClient {
    /// Loads the service-account key, authenticates, and resolves the
    /// spreadsheet id.
    pub async fn connect(config: SheetsConfig) -> Result<Self, SheetError> {
        let http = build_http(config.timeout)?;
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        let tokens = Arc::new(ServiceAccountTokenSource::new(key, http.clone())?);
        Self::connect_with(config, http, tokens).await
    }

    /// Like [`GoogleSheetsClient::connect`] with a caller-supplied token
    /// source.
    pub async fn connect_with(
        config: SheetsConfig,
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, SheetError> {
        let spreadsheet_id = match &config.spreadsheet_id {
            Some(id) => id.clone(),
            None => {
                find_spreadsheet_id(
                    &http,
                    tokens.as_ref(),
                    &config.drive_api_base,
                    &config.spreadsheet,
                )
                .await?
            }
        };
        info!(
            spreadsheet = %config.spreadsheet,
            spreadsheet_id = %spreadsheet_id,
            worksheet = %config.worksheet,
            "connected to spreadsheet"
        );
        Ok(Self {
            http,
            tokens,
            sheets_api_base: parse_base(&config.sheets_api_base)?,
            spreadsheet_id,
            worksheet: config.worksheet,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        let mut url = self.sheets_api_base.clone();
        url.path_segments_mut()
            .map_err(|()| SheetError::Transport {
                message: format!("cannot use {} as a base URL", self.sheets_api_base),
            })?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, SheetError> {
        let token = self.tokens.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let url = self.values_url(range)?;
        let request = self
            .request(Method::GET, url)
            .await?
            .query(&[("majorDimension", "ROWS")]);
        let body: ValueRange = send_json(request).await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

#[async_trait]
impl Worksheet for GoogleSheetsClient {
    #[instrument(skip_all, fields(worksheet = %self.worksheet))]
    async fn records(&self) -> Result<Vec<HashMap<String, String>>, SheetError> {
        let rows = self.get_values(&a1::whole_sheet(&self.worksheet)).await?;
        debug!(rows = rows.len(), "read worksheet");
        Ok(records_from_rows(rows))
    }

    #[instrument(skip_all, fields(worksheet = %self.worksheet, row = %row))]
    async fn row_values(&self, row: RowIndex) -> Result<Vec<String>, SheetError> {
        let rows = self.get_values(&a1::full_row(&self.worksheet, row)).await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    #[instrument(skip_all, fields(worksheet = %self.worksheet, range = %range))]
    async fn update(&self, range: &CellRange, values: &OutputTuple) -> Result<(), SheetError> {
        let a1_range = a1::span(&self.worksheet, range);
        let url = self.values_url(&a1_range)?;
        let body = ValueUpdate {
            range: &a1_range,
            major_dimension: "ROWS",
            values: [values.values()],
        };
        let request = self
            .request(Method::PUT, url)
            .await?
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        let _: Value = send_json(request).await?;
        Ok(())
    }
}

/// Converts header + data rows into header-keyed records.
///
/// Missing trailing cells read as empty strings. Blank header cells are
/// skipped; if a header repeats, the rightmost column wins.
pub fn records_from_rows(rows: Vec<Vec<String>>) -> Vec<HashMap<String, String>> {
    let mut rows = rows.into_iter();
    let Some(headers) = rows.next() else {
        return Vec::new();
    };
    rows.map(|row| {
        headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.trim().is_empty())
            .map(|(i, header)| {
                let value = row.get(i).cloned().unwrap_or_default();
                (header.trim().to_string(), value)
            })
            .collect()
    })
    .collect()
}

/// Builds the Drive `files.list` query matching a spreadsheet by exact name.
pub fn spreadsheet_query(name: &SpreadsheetName) -> String {
    let escaped = name.as_str().replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false")
}

async fn find_spreadsheet_id(
    http: &reqwest::Client,
    tokens: &dyn TokenSource,
    drive_api_base: &str,
    name: &SpreadsheetName,
) -> Result<String, SheetError> {
    let mut url = parse_base(drive_api_base)?;
    url.path_segments_mut()
        .map_err(|()| SheetError::Transport {
            message: format!("cannot use {drive_api_base} as a base URL"),
        })?
        .pop_if_empty()
        .push("files");
    let token = tokens.access_token().await?;
    let request = http.get(url).bearer_auth(token).query(&[
        ("q", spreadsheet_query(name).as_str()),
        ("fields", "files(id,name)"),
        ("supportsAllDrives", "true"),
        ("includeItemsFromAllDrives", "true"),
    ]);
    let list: DriveFileList = send_json(request).await?;
    list.files
        .into_iter()
        .next()
        .map(|file| file.id)
        .ok_or_else(|| SheetError::NotFound {
            name: name.to_string(),
        })
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, SheetError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(transport)
}

fn parse_base(base: &str) -> Result<Url, SheetError> {
    Url::parse(base).map_err(|err| SheetError::Transport {
        message: format!("invalid API base URL {base}: {err}"),
    })
}

fn transport(err: reqwest::Error) -> SheetError {
    SheetError::Transport {
        message: err.to_string(),
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SheetError> {
    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(SheetError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|err| SheetError::MalformedResponse {
        message: err.to_string(),
    })
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
