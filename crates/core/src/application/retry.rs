// Retry logic
use crate::domain::error::Result;
use crate::domain::{QueueItem, RetryDecision};
use tracing::{info, warn};

/// Bounded retry policy
///
/// Every failed attempt spends one retry; at `max_retries` the item fails.
/// There is no in-run backoff: a re-queued item waits for the next batch.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: i32,
}

impl RetryPolicy {
    pub fn new(max_retries: i32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> i32 {
        self.max_retries
    }

    /// Record a failed attempt on a crawling item
    pub fn apply_failure(
        &self,
        item: &mut QueueItem,
        message: impl Into<String>,
        now_millis: i64,
    ) -> Result<RetryDecision> {
        let decision = item.record_failure(message, self.max_retries, now_millis)?;

        match decision {
            RetryDecision::Requeue => info!(
                item_id = %item.id,
                url = %item.url,
                retry_count = item.retry_count,
                max_retries = self.max_retries,
                "Submission failed, re-queued for next run"
            ),
            RetryDecision::Exhausted => warn!(
                item_id = %item.id,
                url = %item.url,
                retry_count = item.retry_count,
                max_retries = self.max_retries,
                error = ?item.error_message,
                "Max retry attempts reached, item failed"
            ),
        }

        Ok(decision)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::application::constants::DEFAULT_MAX_RETRIES)
    }
}
