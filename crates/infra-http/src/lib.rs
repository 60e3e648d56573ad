// SEO Indexer Infrastructure - Search Engine Adapters
// Implements: SubmissionAdapter (Google Indexing API, Bing Webmaster API)

mod bing;
mod client;
mod config;
mod google;

pub use bing::BingWebmasterAdapter;
pub use client::build_http_client;
pub use config::ProviderConfig;
pub use google::GoogleIndexingAdapter;

use indexer_core::error::Result;
use indexer_core::port::{AdapterRegistry, TimeProvider};
use std::sync::Arc;

/// Registry with both production adapters sharing one HTTP client
pub fn build_registry(
    config: &ProviderConfig,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<AdapterRegistry> {
    let client = build_http_client(config.request_timeout)?;

    Ok(AdapterRegistry::new()
        .register(Arc::new(GoogleIndexingAdapter::new(
            client.clone(),
            config,
            time_provider,
        )))
        .register(Arc::new(BingWebmasterAdapter::new(client, config))))
}
