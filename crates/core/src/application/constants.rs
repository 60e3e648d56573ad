// Processing constants (no magic values)
use std::time::Duration;

/// Pending items drained per batch (oldest first)
pub const DEFAULT_BATCH_SIZE: u32 = 50;

/// Failed attempts before an item is failed for good
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Pause between dispatched items to respect provider rate limits (1s)
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_secs(1);

/// Crawling items older than this are reclaimed by the sweep (15 minutes)
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(15 * 60);

/// Timer trigger cadence (5 minutes)
pub const DEFAULT_TRIGGER_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on URLs accepted by one enqueue call
pub const MAX_ENQUEUE_URLS: usize = 500;

/// Error recorded on items reclaimed from an interrupted attempt
pub const INTERRUPTED_ATTEMPT_MESSAGE: &str = "Submission attempt interrupted before completion";
