//! HTTP Server
//!
//! Router construction and the listener loop with graceful shutdown.

use crate::handler;
use axum::routing::{get, put};
use axum::Router;
use indexer_core::application::{QueueProcessor, QueueService, ShutdownToken};
use indexer_core::error::{AppError, Result};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<QueueProcessor>,
    pub queue_service: Arc<QueueService>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handler::health)
                .post(handler::trigger)
                .fallback(handler::method_not_allowed),
        )
        .route("/queue", axum::routing::post(handler::enqueue))
        .route("/queue/stats", get(handler::stats))
        .route("/queue/:id", get(handler::get_item))
        .route("/domains", get(handler::list_domains))
        .route("/domains/:id", put(handler::put_domain))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until `shutdown` fires; in-flight requests are allowed to finish
    pub async fn serve(self, mut shutdown: ShutdownToken) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;

        info!(address = %addr, "HTTP server listening");

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .map_err(|e| AppError::Internal(format!("HTTP server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use indexer_core::application::ProcessorConfig;
    use indexer_core::domain::{Domain, QueueItem, QueueStatus, SearchEngine};
    use indexer_core::port::domain_repository::mocks::InMemoryDomainRepository;
    use indexer_core::port::id_provider::mocks::SequentialIdProvider;
    use indexer_core::port::queue_repository::mocks::InMemoryQueueRepository;
    use indexer_core::port::submission::mocks::MockSubmissionAdapter;
    use indexer_core::port::time_provider::mocks::MockTimeProvider;
    use indexer_core::port::AdapterRegistry;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        queue: Arc<InMemoryQueueRepository>,
    }

    fn app() -> TestApp {
        let queue = Arc::new(InMemoryQueueRepository::new());
        let mut domain = Domain::new("d1", "Example", "https://x.com");
        domain.credentials.bing_api_key = Some("key".to_string());
        let domains = Arc::new(InMemoryDomainRepository::with_domains(vec![domain]));
        let time = Arc::new(MockTimeProvider::new(1_000));

        let processor = Arc::new(QueueProcessor::new(
            queue.clone(),
            domains.clone(),
            AdapterRegistry::new().register(Arc::new(MockSubmissionAdapter::new_success(
                SearchEngine::Bing,
            ))),
            time.clone(),
            ProcessorConfig {
                item_delay: Duration::ZERO,
                ..Default::default()
            },
        ));
        let queue_service = Arc::new(QueueService::new(
            queue.clone(),
            domains,
            Arc::new(SequentialIdProvider::new("item")),
            time,
        ));

        TestApp {
            router: build_router(AppState {
                processor,
                queue_service,
            }),
            queue,
        }
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app.router, Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(&body),
            json!({"status": "OK", "message": "Auto-indexing service is running"})
        );
    }

    #[tokio::test]
    async fn test_trigger_runs_batch() {
        let app = app();
        app.queue.put(QueueItem::new("a", 1, "d1", "https://x.com/a", SearchEngine::Bing));

        let (status, body) = send(&app.router, Method::POST, "/", Some(json!({"anything": 1}))).await;

        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["message"], "Indexing queue processed");
        assert_eq!(body["summary"]["processed"], 1);
        assert_eq!(body["summary"]["indexed"], 1);
        assert_eq!(app.queue.get("a").unwrap().status, QueueStatus::Indexed);
    }

    #[tokio::test]
    async fn test_trigger_on_empty_queue() {
        let app = app();
        let (status, body) = send(&app.router, Method::POST, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["summary"]["processed"], 0);
    }

    #[tokio::test]
    async fn test_trigger_fetch_failure_is_500() {
        let app = app();
        app.queue.set_fail_fetch(true);

        let (status, body) = send(&app.router, Method::POST, "/", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(&body)["error"].as_str().unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let app = app();
        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            let (status, body) = send(&app.router, method, "/", None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, b"Method not allowed");
        }
    }

    #[tokio::test]
    async fn test_enqueue_then_get_and_stats() {
        let app = app();
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/queue",
            Some(json!({
                "domain_id": "d1",
                "search_engine": "bing",
                "urls": ["https://x.com/a", "https://x.com/b"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json_body(&body), json!({"ids": ["item-1", "item-2"]}));

        let (status, body) = send(&app.router, Method::GET, "/queue/item-1", None).await;
        assert_eq!(status, StatusCode::OK);
        let item = json_body(&body);
        assert_eq!(item["status"], "pending");
        assert_eq!(item["retry_count"], 0);

        let (status, body) = send(&app.router, Method::GET, "/queue/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(&body),
            json!({"pending": 2, "crawling": 0, "indexed": 0, "failed": 0})
        );
    }

    #[tokio::test]
    async fn test_enqueue_errors() {
        let app = app();

        let (status, _) = send(
            &app.router,
            Method::POST,
            "/queue",
            Some(json!({"domain_id": "nope", "search_engine": "bing", "urls": ["https://x.com/a"]})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app.router,
            Method::POST,
            "/queue",
            Some(json!({"domain_id": "d1", "search_engine": "bing", "urls": ["ftp://x.com/a"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/queue",
            Some(json!({"domain_id": "d1", "search_engine": "yahoo", "urls": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_body(&body)["error"].is_string());
    }

    #[tokio::test]
    async fn test_get_missing_item() {
        let app = app();
        let (status, _) = send(&app.router, Method::GET, "/queue/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_domain_hides_secrets() {
        let app = app();
        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/domains/d2",
            Some(json!({
                "name": "Second",
                "url": "https://second.example",
                "auto_index": false,
                "credentials": {"bing_api_key": "secret"}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let view = json_body(&body);
        assert_eq!(view["id"], "d2");
        assert_eq!(view["enabled"], true);
        assert_eq!(view["auto_index"], false);
        assert_eq!(view["has_bing_credentials"], true);
        assert!(!body.windows(6).any(|w| w == b"secret"));

        let (status, body) = send(&app.router, Method::GET, "/domains", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body).as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_put_invalid_domain() {
        let app = app();
        let (status, _) = send(
            &app.router,
            Method::PUT,
            "/domains/d3",
            Some(json!({"name": "Bad", "url": "not a url"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
