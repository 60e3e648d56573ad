//! Queue Processor - drains pending queue items into search-engine adapters
//!
//! One batch-drain:
//! 1. fetch up to `batch_size` pending items, oldest first
//! 2. per item, sequentially: resolve domain -> policy check -> claim (CAS
//!    pending -> crawling) -> credential check -> submit -> persist outcome
//! 3. pause `item_delay` between dispatched items
//!
//! Only the batch fetch can fail a run. Everything that goes wrong with a
//! single item is logged and the batch moves on.

use crate::application::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_ITEM_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_STALE_AFTER,
};
use crate::application::retry::RetryPolicy;
use crate::domain::{QueueItem, RetryDecision};
use crate::error::Result;
use crate::port::{
    AdapterRegistry, DomainRepository, QueueRepository, SubmissionRequest, TimeProvider,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Processor configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub batch_size: u32,
    pub max_retries: i32,
    pub item_delay: Duration,
    /// How long an item may sit in crawling before the sweep reclaims it
    pub stale_after: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            item_delay: DEFAULT_ITEM_DELAY,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

/// Counters for one batch-drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Pending items returned by the fetch
    pub fetched: usize,
    /// Items this run moved out of pending
    pub processed: usize,
    pub indexed: usize,
    pub requeued: usize,
    pub failed: usize,
    /// Items left untouched (domain missing/disabled, claimed elsewhere)
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Skipped => {
                self.skipped += 1;
                return;
            }
            ItemOutcome::Indexed => self.indexed += 1,
            ItemOutcome::Requeued => self.requeued += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
            ItemOutcome::Unrecorded { .. } => {}
        }
        self.processed += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Skipped,
    Indexed,
    Requeued,
    Failed { dispatched: bool },
    /// Claimed, but the outcome could not be written
    Unrecorded { dispatched: bool },
}

impl ItemOutcome {
    fn dispatched(&self) -> bool {
        match self {
            ItemOutcome::Skipped => false,
            ItemOutcome::Indexed | ItemOutcome::Requeued => true,
            ItemOutcome::Failed { dispatched } | ItemOutcome::Unrecorded { dispatched } => {
                *dispatched
            }
        }
    }
}

/// Indexing queue processor
pub struct QueueProcessor {
    queue_repo: Arc<dyn QueueRepository>,
    domain_repo: Arc<dyn DomainRepository>,
    adapters: AdapterRegistry,
    time_provider: Arc<dyn TimeProvider>,
    retry_policy: RetryPolicy,
    config: ProcessorConfig,
    // Serializes overlapping batch-drains within this process
    run_lock: Mutex<()>,
}

impl QueueProcessor {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        domain_repo: Arc<dyn DomainRepository>,
        adapters: AdapterRegistry,
        time_provider: Arc<dyn TimeProvider>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            queue_repo,
            domain_repo,
            adapters,
            time_provider,
            retry_policy: RetryPolicy::new(config.max_retries),
            config,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Run one batch-drain
    ///
    /// # Errors
    /// Only when the pending items cannot be listed; nothing has been
    /// mutated at that point.
    pub async fn run_batch(&self) -> Result<RunSummary> {
        let _guard = self.run_lock.lock().await;

        let items = match self.queue_repo.fetch_pending(self.config.batch_size).await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Failed to fetch pending queue items");
                return Err(e);
            }
        };

        let mut summary = RunSummary {
            fetched: items.len(),
            ..Default::default()
        };

        if items.is_empty() {
            debug!("No pending URLs in queue");
            return Ok(summary);
        }

        info!(count = items.len(), "Processing indexing queue batch");

        let total = items.len();
        for (index, item) in items.into_iter().enumerate() {
            let outcome = self.process_item(item).await;
            summary.record(outcome);

            let more_to_go = index + 1 < total;
            if outcome.dispatched() && more_to_go && !self.config.item_delay.is_zero() {
                sleep(self.config.item_delay).await;
            }
        }

        info!(
            fetched = summary.fetched,
            processed = summary.processed,
            indexed = summary.indexed,
            requeued = summary.requeued,
            failed = summary.failed,
            skipped = summary.skipped,
            "Queue processing complete"
        );

        Ok(summary)
    }

    async fn process_item(&self, mut item: QueueItem) -> ItemOutcome {
        // 1. Resolve owning domain
        let domain = match self.domain_repo.find_by_id(&item.domain_id).await {
            Ok(Some(domain)) => domain,
            Ok(None) => {
                warn!(
                    item_id = %item.id,
                    domain_id = %item.domain_id,
                    "Domain not found for queue item, leaving it pending"
                );
                return ItemOutcome::Skipped;
            }
            Err(e) => {
                error!(
                    item_id = %item.id,
                    domain_id = %item.domain_id,
                    error = %e,
                    "Domain lookup failed, leaving item pending"
                );
                return ItemOutcome::Skipped;
            }
        };

        // 2. Policy flags
        if !domain.is_dispatchable() {
            info!(
                item_id = %item.id,
                url = %item.url,
                enabled = domain.enabled,
                auto_index = domain.auto_index,
                "Skipping item: domain not enabled or auto-index off"
            );
            return ItemOutcome::Skipped;
        }

        // 3. Claim (durable before any network call)
        let now = self.time_provider.now_millis();
        if let Err(e) = item.claim(now) {
            warn!(item_id = %item.id, error = %e, "Fetched item is not claimable");
            return ItemOutcome::Skipped;
        }
        match self.queue_repo.try_claim(&item.id, now).await {
            Ok(true) => {}
            Ok(false) => {
                info!(item_id = %item.id, "Item already claimed by another run");
                return ItemOutcome::Skipped;
            }
            Err(e) => {
                error!(item_id = %item.id, error = %e, "Failed to claim queue item");
                return ItemOutcome::Skipped;
            }
        }

        // 4. Credential + adapter selection
        let engine = item.search_engine;
        let credential = match domain.credential_for(engine) {
            Some(credential) => credential,
            None => {
                let message = format!("Missing {} API credentials", engine);
                warn!(item_id = %item.id, search_engine = %engine, "{}", message);
                return self.fail_configuration(item, message).await;
            }
        };
        let adapter = match self.adapters.get(engine) {
            Some(adapter) => adapter,
            None => {
                let message = format!("No submission adapter registered for {}", engine);
                warn!(item_id = %item.id, search_engine = %engine, "{}", message);
                return self.fail_configuration(item, message).await;
            }
        };

        // 5. Submit on a separate task so an adapter panic stays contained
        let request = SubmissionRequest {
            url: item.url.clone(),
            site_url: domain.url.clone(),
            credential,
        };
        let handle = tokio::task::spawn(async move { adapter.submit(&request).await });
        let result = handle.await;

        let now = self.time_provider.now_millis();
        match result {
            // 6. Success
            Ok(Ok(receipt)) => {
                if let Err(e) = item.mark_indexed(now) {
                    error!(item_id = %item.id, error = %e, "Invalid transition to indexed");
                    return ItemOutcome::Unrecorded { dispatched: true };
                }
                info!(
                    item_id = %item.id,
                    url = %item.url,
                    search_engine = %engine,
                    status_code = receipt.status_code,
                    "URL submitted for indexing"
                );
                self.persist(&item, ItemOutcome::Indexed, true).await
            }
            // 7. Failure
            Ok(Err(e)) => {
                warn!(
                    item_id = %item.id,
                    url = %item.url,
                    search_engine = %engine,
                    error = %e,
                    "Submission failed"
                );
                self.record_failure(item, e.to_string(), now).await
            }
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    format!(
                        "Submission adapter panicked: {}",
                        panic_message(join_err.into_panic())
                    )
                } else {
                    "Submission task cancelled".to_string()
                };
                error!(item_id = %item.id, url = %item.url, "{}", message);
                self.record_failure(item, message, now).await
            }
        }
    }

    async fn record_failure(&self, mut item: QueueItem, message: String, now: i64) -> ItemOutcome {
        match self.retry_policy.apply_failure(&mut item, message, now) {
            Ok(RetryDecision::Requeue) => self.persist(&item, ItemOutcome::Requeued, true).await,
            Ok(RetryDecision::Exhausted) => {
                self.persist(&item, ItemOutcome::Failed { dispatched: true }, true)
                    .await
            }
            Err(e) => {
                error!(item_id = %item.id, error = %e, "Invalid transition after failure");
                ItemOutcome::Unrecorded { dispatched: true }
            }
        }
    }

    async fn fail_configuration(&self, mut item: QueueItem, message: String) -> ItemOutcome {
        let now = self.time_provider.now_millis();
        if let Err(e) = item.fail_configuration(message, now) {
            error!(item_id = %item.id, error = %e, "Invalid transition to failed");
            return ItemOutcome::Unrecorded { dispatched: false };
        }
        self.persist(&item, ItemOutcome::Failed { dispatched: false }, false)
            .await
    }

    async fn persist(&self, item: &QueueItem, outcome: ItemOutcome, dispatched: bool) -> ItemOutcome {
        match self.queue_repo.save_outcome(item).await {
            Ok(()) => outcome,
            Err(e) => {
                error!(
                    item_id = %item.id,
                    status = %item.status,
                    error = %e,
                    "Failed to record queue item outcome"
                );
                ItemOutcome::Unrecorded { dispatched }
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
