//! Google Indexing API adapter
//!
//! Service-account flow:
//! 1. sign an RS256 JWT assertion with the key's private key
//! 2. exchange it for an access token at the key's token endpoint
//! 3. publish a `URL_UPDATED` notification with the bearer token
//!
//! Access tokens are cached per service account until shortly before expiry.

use crate::client::{join_url, transport_error};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use indexer_core::domain::{Credential, SearchEngine};
use indexer_core::port::{
    SubmissionAdapter, SubmissionError, SubmissionReceipt, SubmissionRequest, TimeProvider,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const INDEXING_SCOPE: &str = "https://www.googleapis.com/auth/indexing";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const PUBLISH_PATH: &str = "/v3/urlNotifications:publish";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh this long before the provider's expiry
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Serialize)]
struct PublishBody<'a> {
    url: &'a str,
    #[serde(rename = "type")]
    notification_type: &'static str,
}

struct CachedToken {
    access_token: String,
    expires_at_secs: i64,
}

pub struct GoogleIndexingAdapter {
    client: reqwest::Client,
    publish_url: String,
    default_token_url: String,
    time_provider: Arc<dyn TimeProvider>,
    tokens: Mutex<HashMap<String, CachedToken>>,
}

impl GoogleIndexingAdapter {
    pub fn new(
        client: reqwest::Client,
        config: &ProviderConfig,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            client,
            publish_url: join_url(&config.google_indexing_base_url, PUBLISH_PATH),
            default_token_url: config.google_token_url.clone(),
            time_provider,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn now_secs(&self) -> i64 {
        self.time_provider.now_millis() / 1000
    }

    fn parse_key(credential: &Credential) -> Result<ServiceAccountKey, SubmissionError> {
        match credential {
            Credential::GoogleServiceAccount(value) => {
                serde_json::from_value(value.clone()).map_err(|e| {
                    SubmissionError::InvalidCredential(format!(
                        "Malformed service account key: {}",
                        e
                    ))
                })
            }
            _ => Err(SubmissionError::InvalidCredential(
                "Google adapter requires a service account key".to_string(),
            )),
        }
    }

    fn sign_assertion(&self, key: &ServiceAccountKey, token_url: &str) -> Result<String, SubmissionError> {
        let iat = self.now_secs();
        let claims = AssertionClaims {
            iss: key.client_email.clone(),
            scope: INDEXING_SCOPE.to_string(),
            aud: token_url.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            SubmissionError::InvalidCredential(format!("Invalid service account private key: {}", e))
        })?;

        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).map_err(|e| {
            SubmissionError::InvalidCredential(format!("Failed to sign assertion: {}", e))
        })
    }

    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String, SubmissionError> {
        let now = self.now_secs();
        if let Some(cached) = self.tokens.lock().await.get(&key.client_email) {
            if cached.expires_at_secs - TOKEN_EXPIRY_MARGIN_SECS > now {
                return Ok(cached.access_token.clone());
            }
        }

        let token_url = key
            .token_uri
            .as_deref()
            .unwrap_or(&self.default_token_url)
            .to_string();
        let assertion = self.sign_assertion(key, &token_url)?;

        let response = self
            .client
            .post(&token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorBody>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or(body);
            return Err(SubmissionError::Unauthorized(message));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            SubmissionError::Unauthorized(format!("Malformed token response: {}", e))
        })?;

        debug!(client_email = %key.client_email, "Obtained Google access token");

        let expires_in = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        self.tokens.lock().await.insert(
            key.client_email.clone(),
            CachedToken {
                access_token: token.access_token.clone(),
                expires_at_secs: now + expires_in,
            },
        );

        Ok(token.access_token)
    }
}

#[async_trait]
impl SubmissionAdapter for GoogleIndexingAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Google
    }

    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let key = Self::parse_key(&request.credential)?;
        let access_token = self.access_token(&key).await?;

        let response = self
            .client
            .post(&self.publish_url)
            .bearer_auth(&access_token)
            .json(&PublishBody {
                url: &request.url,
                notification_type: "URL_UPDATED",
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.lock().await.remove(&key.client_email);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!(url = %request.url, "Google URL notification published");

        Ok(SubmissionReceipt {
            status_code: status.as_u16(),
            body: serde_json::from_str(&body).ok(),
        })
    }
}
