//! HTTP client for the inference endpoint.

use async_trait::async_trait;
use pipeline::{GenerationError, TextGenerator};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{InferenceConfig, LlmError, SamplingParameters, TimeoutReporting};

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a SamplingParameters,
}

/// [`TextGenerator`] backed by a Hugging Face text-generation endpoint.
pub struct HuggingFaceClient {
    http: reqwest::Client,
    config: InferenceConfig,
}

impl HuggingFaceClient {
    pub fn new(config: InferenceConfig) -> Result<Self, LlmError> {
        if config.api_token.trim().is_empty() {
            return Err(LlmError::MissingToken);
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() && self.config.timeout_reporting == TimeoutReporting::Distinct {
            GenerationError::TimedOut
        } else {
            GenerationError::Transport {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = InferenceRequest {
            inputs: prompt,
            parameters: &self.config.sampling,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "inference endpoint returned an error");
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|err| GenerationError::Transport {
                message: err.to_string(),
            })?;
        let text = parse_generated_text(&payload)?;
        debug!(generated_len = text.len(), "generation succeeded");
        Ok(text)
    }
}

/// Extracts the trimmed `generated_text` of the first element of a
/// text-generation response.
pub fn parse_generated_text(payload: &Value) -> Result<String, GenerationError> {
    payload
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("generated_text"))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or(GenerationError::InvalidResponseFormat)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        format!("http://{addr}/models/test-model")
    }

    fn client(endpoint: String) -> HuggingFaceClient {
        let mut config = InferenceConfig::for_model("test-model", "secret-token");
        config.endpoint = endpoint;
        HuggingFaceClient::new(config).expect("client")
    }

    #[test]
    fn parse_accepts_list_with_generated_text() {
        let payload = json!([{ "generated_text": "  Hello there \n" }, { "generated_text": "x" }]);
        assert_eq!(parse_generated_text(&payload).unwrap(), "Hello there");
    }

    #[test]
    fn parse_rejects_unexpected_shapes() {
        for payload in [
            json!({ "generated_text": "not a list" }),
            json!([]),
            json!([{ "summary_text": "wrong key" }]),
            json!([{ "generated_text": 42 }]),
            json!("plain string"),
        ] {
            assert_eq!(
                parse_generated_text(&payload),
                Err(GenerationError::InvalidResponseFormat),
                "{payload}"
            );
        }
    }

    #[test]
    fn empty_token_is_rejected() {
        let config = InferenceConfig::for_model("test-model", "  ");
        assert!(matches!(
            HuggingFaceClient::new(config),
            Err(LlmError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn sends_prompt_parameters_and_bearer_token() {
        async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!([{
                "generated_text": format!(
                    "  {auth}|{}|{}|{}  ",
                    body["inputs"].as_str().unwrap_or_default(),
                    body["parameters"]["max_new_tokens"],
                    body["parameters"]["do_sample"],
                )
            }]))
        }
        let endpoint = spawn_stub(Router::new().route("/models/test-model", post(echo))).await;

        let text = client(endpoint).generate("Write about cats").await.unwrap();

        assert_eq!(text, "Bearer secret-token|Write about cats|300|true");
    }

    #[tokio::test]
    async fn non_200_status_carries_status_and_body() {
        let endpoint = spawn_stub(Router::new().route(
            "/models/test-model",
            post(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "model is loading") }),
        ))
        .await;

        let err = client(endpoint).generate("hi").await.unwrap_err();

        assert_eq!(
            err,
            GenerationError::Upstream {
                status: 503,
                body: "model is loading".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unexpected_payload_is_invalid_format() {
        let endpoint = spawn_stub(Router::new().route(
            "/models/test-model",
            post(|| async { Json(json!({ "error": "nope" })) }),
        ))
        .await;

        let err = client(endpoint).generate("hi").await.unwrap_err();

        assert_eq!(err, GenerationError::InvalidResponseFormat);
    }

    #[tokio::test]
    async fn non_json_body_is_transport_error() {
        let endpoint = spawn_stub(Router::new().route(
            "/models/test-model",
            post(|| async { "<html>gateway</html>" }),
        ))
        .await;

        let err = client(endpoint).generate("hi").await.unwrap_err();

        assert!(matches!(err, GenerationError::Transport { .. }), "{err:?}");
    }

    async fn slow_endpoint() -> String {
        spawn_stub(Router::new().route(
            "/models/test-model",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!([{ "generated_text": "too late" }]))
            }),
        ))
        .await
    }

    #[tokio::test]
    async fn timeout_is_distinct_by_default() {
        let mut config = InferenceConfig::for_model("test-model", "secret-token");
        config.endpoint = slow_endpoint().await;
        config.timeout = Duration::from_millis(200);
        let client = HuggingFaceClient::new(config).unwrap();

        let err = client.generate("hi").await.unwrap_err();

        assert_eq!(err, GenerationError::TimedOut);
        assert_eq!(err.to_string(), "[Error: request timed out]");
    }

    #[tokio::test]
    async fn timeout_can_be_reported_generically() {
        let mut config = InferenceConfig::for_model("test-model", "secret-token");
        config.endpoint = slow_endpoint().await;
        config.timeout = Duration::from_millis(200);
        config.timeout_reporting = TimeoutReporting::Generic;
        let client = HuggingFaceClient::new(config).unwrap();

        let err = client.generate("hi").await.unwrap_err();

        assert!(matches!(err, GenerationError::Transport { .. }), "{err:?}");
        assert!(err.to_string().starts_with(GenerationError::SENTINEL));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}/models/test-model"))
            .generate("hi")
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Transport { .. }), "{err:?}");
    }
}
