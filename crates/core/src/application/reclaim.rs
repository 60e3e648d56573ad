//! Reclaim Service - recovers items stranded in crawling
//!
//! An item stays in crawling only while a batch-drain owns it. If the process
//! dies mid-attempt the row keeps that status forever. This sweep treats such
//! an attempt as a failed one and routes it through the normal retry rules.

use crate::application::constants::INTERRUPTED_ATTEMPT_MESSAGE;
use crate::application::retry::RetryPolicy;
use crate::error::{AppError, Result};
use crate::port::{QueueRepository, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct ReclaimService {
    queue_repo: Arc<dyn QueueRepository>,
    time_provider: Arc<dyn TimeProvider>,
    retry_policy: RetryPolicy,
    stale_after: Duration,
}

impl ReclaimService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        time_provider: Arc<dyn TimeProvider>,
        retry_policy: RetryPolicy,
        stale_after: Duration,
    ) -> Self {
        Self {
            queue_repo,
            time_provider,
            retry_policy,
            stale_after,
        }
    }

    /// Reclaim every crawling item whose attempt started more than
    /// `stale_after` ago. Returns how many were reclaimed.
    pub async fn reclaim_stale(&self) -> Result<usize> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.stale_after.as_millis() as i64;

        let stale = self.queue_repo.find_stale_crawling(cutoff).await?;
        if stale.is_empty() {
            debug!("No stale crawling items");
            return Ok(0);
        }

        warn!(count = stale.len(), "Found stale crawling items, reclaiming");

        let mut reclaimed = 0;
        for mut item in stale {
            if let Err(e) =
                self.retry_policy
                    .apply_failure(&mut item, INTERRUPTED_ATTEMPT_MESSAGE, now)
            {
                error!(item_id = %item.id, error = %e, "Cannot reclaim item");
                continue;
            }

            match self.queue_repo.save_outcome(&item).await {
                Ok(()) => reclaimed += 1,
                // Finished by its owner between the scan and the write
                Err(AppError::Conflict(_)) => {
                    debug!(item_id = %item.id, "Item no longer crawling, skipping");
                }
                Err(e) => {
                    error!(item_id = %item.id, error = %e, "Failed to reclaim item");
                }
            }
        }

        info!(reclaimed, "Stale crawling items reclaimed");
        Ok(reclaimed)
    }
}
