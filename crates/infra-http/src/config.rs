// Provider endpoints and client settings

use std::time::Duration;

pub const DEFAULT_GOOGLE_INDEXING_BASE_URL: &str = "https://indexing.googleapis.com";
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_BING_BASE_URL: &str = "https://ssl.bing.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the adapters send requests
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub google_indexing_base_url: String,
    /// Used when a service account key has no `token_uri`
    pub google_token_url: String,
    pub bing_base_url: String,
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            google_indexing_base_url: DEFAULT_GOOGLE_INDEXING_BASE_URL.to_string(),
            google_token_url: DEFAULT_GOOGLE_TOKEN_URL.to_string(),
            bing_base_url: DEFAULT_BING_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
