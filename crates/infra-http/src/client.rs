// Shared HTTP client

use indexer_core::error::{AppError, Result};
use indexer_core::port::SubmissionError;
use std::time::Duration;

/// Build the reqwest client shared by all adapters
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("seo-indexer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn transport_error(err: reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        SubmissionError::Transport(format!("Request timed out: {}", err))
    } else {
        SubmissionError::Transport(err.to_string())
    }
}

/// Trailing slashes in configured base URLs are tolerated
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://ssl.bing.com/", "/webmaster"),
            "https://ssl.bing.com/webmaster"
        );
        assert_eq!(join_url("http://127.0.0.1:9", "/v3"), "http://127.0.0.1:9/v3");
    }
}
