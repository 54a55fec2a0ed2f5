//! OAuth access tokens for the Google APIs.
//!
//! Production uses [`ServiceAccountTokenSource`]: a JWT assertion signed with
//! the service account's private key is exchanged at the key's `token_uri`
//! for a short-lived bearer token, which is cached until shortly before it
//! expires.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pipeline::SheetError;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

/// Scopes requested for the access token: read/write spreadsheets and look
/// spreadsheets up by name.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const ASSERTION_LIFETIME_SECS: i64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Reported token lifetimes are clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The fields of a service-account key file that authentication needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Reads and parses a service-account JSON key file.
    pub fn from_file(path: &Path) -> Result<Self, SheetError> {
        let contents = std::fs::read_to_string(path).map_err(|err| SheetError::Credentials {
            message: format!("read {}: {err}", path.display()),
        })?;
        Self::from_json(&contents).map_err(|err| SheetError::Credentials {
            message: format!("parse {}: {err}", path.display()),
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

// ---------------------------------------------------------------------------
// Token sources
// ---------------------------------------------------------------------------

/// Supplies bearer tokens for Google API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetError>;
}

/// A fixed, pre-issued token. Useful against emulators and stubs.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, SheetError> {
        Ok(self.0.clone())
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    token: String,
    refresh_after: DateTime<Utc>,
}

/// Exchanges signed JWT assertions for access tokens (two-legged OAuth).
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, SheetError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|err| {
            SheetError::Credentials {
                message: format!("private key: {err}"),
            }
        })?;
        Ok(Self {
            key,
            encoding_key,
            http,
            cached: Mutex::new(None),
        })
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SCOPES.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key).map_err(
            |err| SheetError::Auth {
                message: format!("sign assertion: {err}"),
            },
        )
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken, SheetError> {
        let assertion = self.sign_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|err| SheetError::Auth {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Auth {
                message: format!("token endpoint returned {}: {body}", status.as_u16()),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|err| SheetError::Auth {
            message: format!("decode token response: {err}"),
        })?;
        debug!(expires_in = token.expires_in, "obtained access token");
        Ok(CachedToken {
            token: token.access_token,
            refresh_after: refresh_deadline(now, token.expires_in)?,
        })
    }
}

/// When a token issued at `now` with the reported `expires_in` must be
/// replaced. Out-of-range lifetimes are clamped rather than trusted.
fn refresh_deadline(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, SheetError> {
    let lifetime = expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS) - EXPIRY_MARGIN_SECS;
    TimeDelta::try_seconds(lifetime)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| SheetError::Auth {
            message: format!("token lifetime out of range: {expires_in}s"),
        })
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, SheetError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| now < t.refresh_after) {
            return Ok(token.token.clone());
        }
        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::{json, Value};

    use super::*;

    fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/service-account.json")
    }

    #[test]
    fn key_file_is_parsed() {
        let key = ServiceAccountKey::from_file(&fixture_path()).unwrap();
        assert_eq!(
            key.client_email,
            "blogsheet@blogsheet-test.iam.gserviceaccount.com"
        );
        assert!(!format!("{key:?}").contains("PRIVATE KEY"));
    }

    #[test]
    fn missing_key_file_is_credentials_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceAccountKey::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SheetError::Credentials { .. }));
    }

    #[test]
    fn garbage_private_key_is_rejected() {
        let key = ServiceAccountKey {
            client_email: "a@b".to_string(),
            private_key: "not a key".to_string(),
            token_uri: "http://localhost/token".to_string(),
        };
        let err = ServiceAccountTokenSource::new(key, reqwest::Client::new()).err();
        assert!(matches!(err, Some(SheetError::Credentials { .. })));
    }

    #[derive(Clone)]
    struct TokenEndpoint {
        exchanges: Arc<AtomicUsize>,
        expires_in: i64,
    }

    impl TokenEndpoint {
        fn lasting(expires_in: i64) -> Self {
            Self {
                exchanges: Arc::new(AtomicUsize::new(0)),
                expires_in,
            }
        }
    }

    async fn issue_token(
        State(state): State<TokenEndpoint>,
        Form(form): Form<std::collections::HashMap<String, String>>,
    ) -> Json<Value> {
        assert_eq!(form.get("grant_type").map(String::as_str), Some(JWT_BEARER_GRANT));
        let assertion = form.get("assertion").cloned().unwrap_or_default();
        let header = jsonwebtoken::decode_header(&assertion).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        let n = state.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({
            "access_token": format!("token-{n}"),
            "expires_in": state.expires_in,
            "token_type": "Bearer"
        }))
    }

    async fn token_source(state: TokenEndpoint) -> ServiceAccountTokenSource {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new()
            .route("/token", post(issue_token))
            .with_state(state);
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let mut key = ServiceAccountKey::from_file(&fixture_path()).unwrap();
        key.token_uri = format!("http://{addr}/token");
        ServiceAccountTokenSource::new(key, reqwest::Client::new()).unwrap()
    }

    #[tokio::test]
    async fn token_is_exchanged_once_and_cached() {
        let state = TokenEndpoint::lasting(3600);
        let source = token_source(state.clone()).await;

        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(state.exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_inside_refresh_margin_is_exchanged_again() {
        let state = TokenEndpoint::lasting(30);
        let source = token_source(state.clone()).await;

        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(source.access_token().await.unwrap(), "token-2");
        assert_eq!(state.exchanges.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oversized_lifetime_is_clamped_and_cached() {
        let state = TokenEndpoint::lasting(i64::MAX);
        let source = token_source(state.clone()).await;

        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(state.exchanges.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn refresh_deadline_stays_within_bounds() {
        let now = Utc::now();

        let longest = refresh_deadline(now, i64::MAX).unwrap();
        assert_eq!(longest - now, TimeDelta::seconds(86_400 - 60));

        let negative = refresh_deadline(now, i64::MIN).unwrap();
        assert!(negative < now);

        let normal = refresh_deadline(now, 3600).unwrap();
        assert_eq!(normal - now, TimeDelta::seconds(3540));
    }

    #[tokio::test]
    async fn assertion_carries_issuer_scopes_and_audience() {
        let source = token_source(TokenEndpoint::lasting(3600)).await;
        let now = Utc::now();
        let assertion = source.sign_assertion(now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.set_audience(&[source.key.token_uri.as_str()]);
        let claims = jsonwebtoken::decode::<Value>(
            &assertion,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(claims["iss"], source.key.client_email.as_str());
        assert_eq!(claims["scope"], SCOPES.join(" "));
        assert_eq!(claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(), 3600);
    }
}
