// Domain (tenant site) Model

use crate::domain::error::{DomainError, Result};
use crate::domain::queue_item::SearchEngine;
use serde::{Deserialize, Serialize};

/// Domain ID (UUID v4)
pub type DomainId = String;

/// Provider secrets stored with a domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCredentials {
    /// Google service-account key file contents
    #[serde(default)]
    pub google_service_account: Option<serde_json::Value>,
    #[serde(default)]
    pub bing_api_key: Option<String>,
}

/// Credential handed to a submission adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    GoogleServiceAccount(serde_json::Value),
    BingApiKey(String),
}

/// A tenant's registered site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub auto_index: bool,
    #[serde(default)]
    pub credentials: DomainCredentials,
}

impl Domain {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            enabled: true,
            auto_index: true,
            credentials: DomainCredentials::default(),
        }
    }

    /// Both the master switch and the auto-index opt-in are on
    pub fn is_dispatchable(&self) -> bool {
        self.enabled && self.auto_index
    }

    /// Credential required by `engine`, if the domain has one
    pub fn credential_for(&self, engine: SearchEngine) -> Option<Credential> {
        match engine {
            SearchEngine::Google => self
                .credentials
                .google_service_account
                .as_ref()
                .filter(|v| !v.is_null())
                .map(|v| Credential::GoogleServiceAccount(v.clone())),
            SearchEngine::Bing => self
                .credentials
                .bing_api_key
                .as_ref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| Credential::BingApiKey(k.clone())),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Domain name cannot be empty".to_string(),
            ));
        }
        let parsed = url::Url::parse(&self.url).map_err(|e| {
            DomainError::ValidationError(format!("Invalid domain url '{}': {}", self.url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomainError::ValidationError(format!(
                "Domain url must be http(s): {}",
                self.url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatchable_requires_both_flags() {
        let mut domain = Domain::new("d1", "Example", "https://example.com");
        assert!(domain.is_dispatchable());

        domain.auto_index = false;
        assert!(!domain.is_dispatchable());

        domain.auto_index = true;
        domain.enabled = false;
        assert!(!domain.is_dispatchable());
    }

    #[test]
    fn test_credential_lookup() {
        let mut domain = Domain::new("d1", "Example", "https://example.com");
        assert!(domain.credential_for(SearchEngine::Google).is_none());
        assert!(domain.credential_for(SearchEngine::Bing).is_none());

        domain.credentials.bing_api_key = Some("   ".to_string());
        assert!(domain.credential_for(SearchEngine::Bing).is_none());

        domain.credentials.bing_api_key = Some("key-123".to_string());
        assert_eq!(
            domain.credential_for(SearchEngine::Bing),
            Some(Credential::BingApiKey("key-123".to_string()))
        );

        domain.credentials.google_service_account = Some(serde_json::Value::Null);
        assert!(domain.credential_for(SearchEngine::Google).is_none());

        let key = serde_json::json!({"client_email": "bot@example.iam.gserviceaccount.com"});
        domain.credentials.google_service_account = Some(key.clone());
        assert_eq!(
            domain.credential_for(SearchEngine::Google),
            Some(Credential::GoogleServiceAccount(key))
        );
    }

    #[test]
    fn test_validate() {
        assert!(Domain::new("d1", "Example", "https://example.com")
            .validate()
            .is_ok());
        assert!(Domain::new("d1", "", "https://example.com")
            .validate()
            .is_err());
        assert!(Domain::new("d1", "Example", "not a url").validate().is_err());
        assert!(Domain::new("d1", "Example", "ftp://example.com")
            .validate()
            .is_err());
    }
}
