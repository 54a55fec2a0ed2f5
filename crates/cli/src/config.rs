//! Process configuration.
//!
//! Built once at startup from three layers, later layers winning:
//!
//! 1. an optional TOML file (`--config`); missing fields take defaults,
//! 2. environment variables (read once; nothing is reloaded),
//! 3. command-line flags.
//!
//! The inference API token is only ever taken from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use listener::TriggerMode;
use llm::{model_endpoint, InferenceConfig, SamplingParameters, TimeoutReporting};
use pipeline::{SpreadsheetName, WorksheetName};
use serde::{Deserialize, Serialize};
use sheets::SheetsConfig;
use thiserror::Error;
use workflow::{FailurePolicy, PacingPolicy};

pub const ENV_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_PORT: &str = "PORT";
pub const ENV_MODE: &str = "BLOGSHEET_MODE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("HF_API_TOKEN must be set")]
    MissingToken,

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    pub port: u16,
    pub mode: TriggerMode,
    pub failure_policy: FailurePolicy,
    pub inference: InferenceSection,
    pub sheet: SheetSection,
    pub pacing: PacingSection,

    #[serde(skip)]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSection {
    pub model: String,
    pub endpoint_base: String,
    pub timeout_secs: u64,
    pub timeout_reporting: TimeoutReporting,
    #[serde(flatten)]
    pub sampling: SamplingParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSection {
    pub spreadsheet_name: String,
    pub spreadsheet_id: Option<String>,
    pub worksheet: String,
    pub credentials_path: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSection {
    pub commits_per_interval: u32,
    pub interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 10000,
            mode: TriggerMode::default(),
            failure_policy: FailurePolicy::default(),
            inference: InferenceSection::default(),
            sheet: SheetSection::default(),
            pacing: PacingSection::default(),
            api_token: None,
        }
    }
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            model: llm::DEFAULT_MODEL.to_string(),
            endpoint_base: llm::DEFAULT_ENDPOINT_BASE.to_string(),
            timeout_secs: 60,
            timeout_reporting: TimeoutReporting::default(),
            sampling: SamplingParameters::default(),
        }
    }
}

impl Default for SheetSection {
    fn default() -> Self {
        Self {
            spreadsheet_name: "Automate Blog Posts".to_string(),
            spreadsheet_id: None,
            worksheet: "Basic".to_string(),
            credentials_path: PathBuf::from("credentials.json"),
            timeout_secs: 30,
        }
    }
}

impl Default for PacingSection {
    fn default() -> Self {
        Self {
            commits_per_interval: 1,
            interval_secs: 2,
        }
    }
}

impl AppConfig {
    /// Overlays environment variables, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(path) = lookup(ENV_CREDENTIALS).filter(|p| !p.trim().is_empty()) {
            self.sheet.credentials_path = PathBuf::from(path);
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(mode) = lookup(ENV_MODE) {
            self.mode = mode.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_MODE,
                value: mode.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.is_none() {
            return Err(ConfigError::MissingToken);
        }
        if self.inference.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "inference.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.inference.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "inference.model must not be empty".to_string(),
            ));
        }
        if self.sheet.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sheet.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.pacing.commits_per_interval == 0 {
            return Err(ConfigError::Invalid(
                "pacing.commits_per_interval must be > 0".to_string(),
            ));
        }
        self.spreadsheet_name()?;
        self.worksheet_name()?;
        Ok(())
    }

    pub fn inference_config(&self) -> Result<InferenceConfig, ConfigError> {
        let api_token = self.api_token.clone().ok_or(ConfigError::MissingToken)?;
        Ok(InferenceConfig {
            endpoint: model_endpoint(&self.inference.endpoint_base, &self.inference.model),
            api_token,
            sampling: self.inference.sampling,
            timeout: Duration::from_secs(self.inference.timeout_secs),
            timeout_reporting: self.inference.timeout_reporting,
        })
    }

    pub fn sheets_config(&self) -> Result<SheetsConfig, ConfigError> {
        let mut config = SheetsConfig::new(
            self.spreadsheet_name()?,
            self.worksheet_name()?,
            self.sheet.credentials_path.clone(),
        );
        config.spreadsheet_id = self
            .sheet
            .spreadsheet_id
            .clone()
            .filter(|id| !id.trim().is_empty());
        config.timeout = Duration::from_secs(self.sheet.timeout_secs);
        Ok(config)
    }

    pub fn pacing_policy(&self) -> PacingPolicy {
        PacingPolicy::new(
            self.pacing.commits_per_interval,
            Duration::from_secs(self.pacing.interval_secs),
        )
    }

    fn spreadsheet_name(&self) -> Result<SpreadsheetName, ConfigError> {
        SpreadsheetName::new(self.sheet.spreadsheet_name.clone()).ok_or_else(|| {
            ConfigError::Invalid("sheet.spreadsheet_name must not be empty".to_string())
        })
    }

    fn worksheet_name(&self) -> Result<WorksheetName, ConfigError> {
        WorksheetName::new(self.sheet.worksheet.clone())
            .ok_or_else(|| ConfigError::Invalid("sheet.worksheet must not be empty".to_string()))
    }
}

/// Loads the TOML file at `path`, or the defaults when no path is given.
///
/// Unlike an omitted `--config`, a path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
