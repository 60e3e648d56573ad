// Queue Service - operator-facing use cases

pub mod enqueue;

pub use enqueue::EnqueueRequest;

use crate::domain::{Domain, QueueItem, QueueItemId, QueueStatus};
use crate::error::{AppError, Result};
use crate::port::{DomainRepository, IdProvider, QueueRepository, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Item counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub crawling: i64,
    pub indexed: i64,
    pub failed: i64,
}

pub struct QueueService {
    queue_repo: Arc<dyn QueueRepository>,
    domain_repo: Arc<dyn DomainRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        domain_repo: Arc<dyn DomainRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue_repo,
            domain_repo,
            id_provider,
            time_provider,
        }
    }

    /// Enqueue URLs for submission
    pub async fn enqueue(&self, req: EnqueueRequest) -> Result<Vec<QueueItemId>> {
        let domain_id = req.domain_id.clone();
        let engine = req.search_engine;
        let ids = enqueue::execute(
            self.queue_repo.as_ref(),
            self.domain_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await?;

        info!(
            domain_id = %domain_id,
            search_engine = %engine,
            count = ids.len(),
            "URLs enqueued for indexing"
        );
        Ok(ids)
    }

    pub async fn get_item(&self, id: &QueueItemId) -> Result<QueueItem> {
        self.queue_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Queue item {} not found", id)))
    }

    pub async fn stats(&self) -> Result<QueueStats> {
        let mut stats = QueueStats::default();
        for status in QueueStatus::ALL {
            let count = self.queue_repo.count_by_status(status).await?;
            match status {
                QueueStatus::Pending => stats.pending = count,
                QueueStatus::Crawling => stats.crawling = count,
                QueueStatus::Indexed => stats.indexed = count,
                QueueStatus::Failed => stats.failed = count,
            }
        }
        Ok(stats)
    }

    /// Register or replace a domain after validating it
    pub async fn upsert_domain(&self, domain: Domain) -> Result<Domain> {
        domain.validate()?;
        self.domain_repo.upsert(&domain).await?;
        info!(
            domain_id = %domain.id,
            enabled = domain.enabled,
            auto_index = domain.auto_index,
            "Domain saved"
        );
        Ok(domain)
    }

    pub async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.domain_repo.list().await
    }
}
