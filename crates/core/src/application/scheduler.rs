// Indexing Scheduler
// Timer trigger for batch-drains

use crate::application::processor::{QueueProcessor, RunSummary};
use crate::application::reclaim::ReclaimService;
use crate::application::shutdown::ShutdownToken;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Indexing scheduler
///
/// Runs the stale-item sweep followed by one batch-drain on every tick.
/// The first tick fires immediately.
pub struct IndexingScheduler {
    processor: Arc<QueueProcessor>,
    reclaim: Arc<ReclaimService>,
    interval: Duration,
}

impl IndexingScheduler {
    pub fn new(
        processor: Arc<QueueProcessor>,
        reclaim: Arc<ReclaimService>,
        interval: Duration,
    ) -> Self {
        Self {
            processor,
            reclaim,
            interval,
        }
    }

    /// Run the trigger loop until shutdown (spawn in tokio::spawn)
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Indexing scheduler started"
        );

        let mut tick = interval(self.interval);
        // A slow drain pushes the next tick back instead of bursting
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Scheduled queue processing failed");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Indexing scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// One sweep + batch-drain
    pub async fn run_once(&self) -> Result<RunSummary> {
        if let Err(e) = self.reclaim.reclaim_stale().await {
            error!(error = %e, "Stale item sweep failed");
        }
        self.processor.run_batch().await
    }
}
