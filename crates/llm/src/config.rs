//! Inference endpoint settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base URL of the Hugging Face serverless inference API.
pub const DEFAULT_ENDPOINT_BASE: &str = "https://api-inference.huggingface.co/models";

/// Model queried when none is configured.
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParameters {
    pub max_new_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub do_sample: bool,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            max_new_tokens: 300,
            temperature: 0.7,
            top_p: 0.9,
            do_sample: true,
        }
    }
}

/// How a request that exceeds its timeout is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutReporting {
    /// As [`pipeline::GenerationError::TimedOut`].
    #[default]
    Distinct,
    /// Folded into [`pipeline::GenerationError::Transport`] with the
    /// transport's own error text.
    Generic,
}

/// Everything needed to talk to one inference endpoint.
#[derive(Clone)]
pub struct InferenceConfig {
    /// Full URL the prompt is POSTed to.
    pub endpoint: String,
    /// Bearer token.
    pub api_token: String,
    pub sampling: SamplingParameters,
    /// Cap on one request, connection through body.
    pub timeout: Duration,
    pub timeout_reporting: TimeoutReporting,
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("endpoint", &self.endpoint)
            .field("sampling", &self.sampling)
            .field("timeout", &self.timeout)
            .field("timeout_reporting", &self.timeout_reporting)
            .finish_non_exhaustive()
    }
}

impl InferenceConfig {
    /// Settings for `model` under [`DEFAULT_ENDPOINT_BASE`] with default
    /// sampling and a 60 second timeout.
    pub fn for_model(model: &str, api_token: impl Into<String>) -> Self {
        Self {
            endpoint: model_endpoint(DEFAULT_ENDPOINT_BASE, model),
            api_token: api_token.into(),
            sampling: SamplingParameters::default(),
            timeout: Duration::from_secs(60),
            timeout_reporting: TimeoutReporting::default(),
        }
    }
}

/// Joins an endpoint base and a model name into the model's URL.
pub fn model_endpoint(base: &str, model: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), model.trim_start_matches('/'))
}
