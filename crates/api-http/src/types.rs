//! Request/response bodies

use indexer_core::application::RunSummary;
use indexer_core::domain::{Domain, DomainCredentials};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub message: String,
    pub summary: RunSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub ids: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Body of `PUT /domains/{id}`
#[derive(Debug, Deserialize)]
pub struct DomainBody {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub auto_index: bool,
    #[serde(default)]
    pub credentials: DomainCredentials,
}

impl DomainBody {
    pub fn into_domain(self, id: String) -> Domain {
        Domain {
            id,
            name: self.name,
            url: self.url,
            enabled: self.enabled,
            auto_index: self.auto_index,
            credentials: self.credentials,
        }
    }
}

/// Domain as returned to callers: secrets reduced to presence flags
#[derive(Debug, Serialize, Deserialize)]
pub struct DomainView {
    pub id: String,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub auto_index: bool,
    pub has_google_credentials: bool,
    pub has_bing_credentials: bool,
}

impl From<&Domain> for DomainView {
    fn from(domain: &Domain) -> Self {
        use indexer_core::domain::SearchEngine;
        Self {
            id: domain.id.clone(),
            name: domain.name.clone(),
            url: domain.url.clone(),
            enabled: domain.enabled,
            auto_index: domain.auto_index,
            has_google_credentials: domain.credential_for(SearchEngine::Google).is_some(),
            has_bing_credentials: domain.credential_for(SearchEngine::Bing).is_some(),
        }
    }
}
