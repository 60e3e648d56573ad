//! Shared fixtures: SQLite-backed repositories and a wiremock'd provider stack

#![allow(dead_code)]

use indexer_core::application::{ProcessorConfig, QueueProcessor};
use indexer_core::domain::{Domain, QueueItem, SearchEngine};
use indexer_core::port::time_provider::mocks::MockTimeProvider;
use indexer_core::port::{AdapterRegistry, DomainRepository, QueueRepository, TimeProvider};
use indexer_infra_http::{build_registry, ProviderConfig};
use indexer_infra_sqlite::{
    create_pool, run_migrations, SqliteDomainRepository, SqliteQueueRepository,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NOW: i64 = 1_700_000_000_000;
pub const BING_PATH: &str = "/webmaster/api.svc/json/SubmitUrl";
pub const GOOGLE_PUBLISH_PATH: &str = "/v3/urlNotifications:publish";
pub const PRIVATE_KEY: &str = include_str!("../../../infra-http/tests/fixtures/test_rsa_private.pem");

pub struct Store {
    pub pool: SqlitePool,
    pub queue: Arc<SqliteQueueRepository>,
    pub domains: Arc<SqliteDomainRepository>,
    pub time: Arc<MockTimeProvider>,
}

pub async fn memory_store() -> Store {
    store_at("sqlite::memory:").await
}

pub async fn store_at(url: &str) -> Store {
    let pool = create_pool(url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let time = Arc::new(MockTimeProvider::new(NOW));

    Store {
        queue: Arc::new(SqliteQueueRepository::new(pool.clone())),
        domains: Arc::new(SqliteDomainRepository::new(pool.clone(), time.clone())),
        pool,
        time,
    }
}

pub fn domain_with_credentials(id: &str, token_url: &str) -> Domain {
    let mut domain = Domain::new(id, "Example", "https://x.com");
    domain.credentials.bing_api_key = Some("bing-key".to_string());
    domain.credentials.google_service_account = Some(serde_json::json!({
        "type": "service_account",
        "client_email": "indexer@example.iam.gserviceaccount.com",
        "private_key": PRIVATE_KEY,
        "token_uri": token_url,
    }));
    domain
}

pub fn pending(id: &str, created_at: i64, domain_id: &str, engine: SearchEngine) -> QueueItem {
    QueueItem::new(
        id,
        created_at,
        domain_id,
        format!("https://x.com/{}", id),
        engine,
    )
}

pub fn provider_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        google_indexing_base_url: server.uri(),
        google_token_url: format!("{}/token", server.uri()),
        bing_base_url: server.uri(),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn real_adapters(server: &MockServer, time: Arc<dyn TimeProvider>) -> AdapterRegistry {
    build_registry(&provider_config(server), time).unwrap()
}

pub async fn mount_google_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.integration",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

pub fn processor(
    queue: Arc<dyn QueueRepository>,
    domains: Arc<dyn DomainRepository>,
    adapters: AdapterRegistry,
    time: Arc<dyn TimeProvider>,
) -> QueueProcessor {
    QueueProcessor::new(
        queue,
        domains,
        adapters,
        time,
        ProcessorConfig {
            item_delay: Duration::ZERO,
            ..Default::default()
        },
    )
}
