//! Bing Webmaster API adapter
//!
//! API-key flow: one `SubmitUrl` call per item, key in the query string.

use crate::client::{join_url, transport_error};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use indexer_core::domain::{Credential, SearchEngine};
use indexer_core::port::{SubmissionAdapter, SubmissionError, SubmissionReceipt, SubmissionRequest};
use serde::Serialize;
use tracing::debug;

const SUBMIT_URL_PATH: &str = "/webmaster/api.svc/json/SubmitUrl";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitUrlBody<'a> {
    site_url: &'a str,
    url: &'a str,
}

pub struct BingWebmasterAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl BingWebmasterAdapter {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            endpoint: join_url(&config.bing_base_url, SUBMIT_URL_PATH),
        }
    }
}

#[async_trait]
impl SubmissionAdapter for BingWebmasterAdapter {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Bing
    }

    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let api_key = match &request.credential {
            Credential::BingApiKey(key) => key,
            _ => {
                return Err(SubmissionError::InvalidCredential(
                    "Bing adapter requires an API key".to_string(),
                ))
            }
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("apikey", api_key.as_str())])
            .json(&SubmitUrlBody {
                site_url: &request.site_url,
                url: &request.url,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(status = %status, url = %request.url, "Bing response received");

        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: format!("Bing API error: {}", body),
            });
        }

        // Bing answers {"d": null} on success; anything else is kept as-is
        Ok(SubmissionReceipt {
            status_code: status.as_u16(),
            body: serde_json::from_str(&body).ok(),
        })
    }
}
