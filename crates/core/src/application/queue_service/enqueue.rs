// Enqueue Use Case

use crate::application::constants::MAX_ENQUEUE_URLS;
use crate::domain::{DomainId, QueueItem, QueueItemId, SearchEngine};
use crate::error::{AppError, Result};
use crate::port::{DomainRepository, IdProvider, QueueRepository, TimeProvider};
use serde::{Deserialize, Serialize};

/// Enqueue request: one or more URLs of a domain for one engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub domain_id: DomainId,
    pub search_engine: SearchEngine,
    pub urls: Vec<String>,
}

/// Reject empty, oversized, or non-http(s) URL lists before touching storage
pub fn validate_request(req: &EnqueueRequest) -> Result<()> {
    if req.domain_id.trim().is_empty() {
        return Err(AppError::Validation("domain_id cannot be empty".to_string()));
    }
    if req.urls.is_empty() {
        return Err(AppError::Validation("urls cannot be empty".to_string()));
    }
    if req.urls.len() > MAX_ENQUEUE_URLS {
        return Err(AppError::Validation(format!(
            "At most {} urls per request, got {}",
            MAX_ENQUEUE_URLS,
            req.urls.len()
        )));
    }

    for raw in &req.urls {
        let parsed = url::Url::parse(raw)
            .map_err(|e| AppError::Validation(format!("Invalid url '{}': {}", raw, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "Url must be http(s): {}",
                raw
            )));
        }
    }

    Ok(())
}

/// Execute enqueue use case
///
/// All URLs are inserted in one batch so a failure leaves nothing behind.
/// Returns the new item IDs in request order.
pub async fn execute(
    queue_repo: &dyn QueueRepository,
    domain_repo: &dyn DomainRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: EnqueueRequest,
) -> Result<Vec<QueueItemId>> {
    validate_request(&req)?;

    if domain_repo.find_by_id(&req.domain_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Domain {} not found",
            req.domain_id
        )));
    }

    // Offset by position so the batch drains in request order
    let created_at = time_provider.now_millis();
    let items: Vec<QueueItem> = req
        .urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| {
            QueueItem::new(
                id_provider.generate_id(),
                created_at + i as i64,
                req.domain_id.clone(),
                url,
                req.search_engine,
            )
        })
        .collect();

    queue_repo.insert_batch(&items).await?;

    Ok(items.into_iter().map(|item| item.id).collect())
}
