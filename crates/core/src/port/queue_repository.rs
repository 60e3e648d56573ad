// Queue Repository Port (Interface)

use crate::domain::{QueueItem, QueueItemId, QueueStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for queue item persistence
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert a new item
    async fn insert(&self, item: &QueueItem) -> Result<()>;

    /// Insert several items atomically (all or nothing)
    async fn insert_batch(&self, items: &[QueueItem]) -> Result<()>;

    /// Find item by ID
    async fn find_by_id(&self, id: &QueueItemId) -> Result<Option<QueueItem>>;

    /// Oldest pending items first (created_at ASC, id ASC), at most `limit`
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<QueueItem>>;

    /// Atomically move an item from pending to crawling
    ///
    /// Returns false when the item is no longer pending (another run won it).
    async fn try_claim(&self, id: &QueueItemId, attempted_at: i64) -> Result<bool>;

    /// Persist the outcome of an attempt (status, retry_count, error, indexed_at)
    ///
    /// Only applies while the row is still crawling under the same
    /// `attempted_at` as `item`; otherwise `AppError::Conflict`.
    async fn save_outcome(&self, item: &QueueItem) -> Result<()>;

    /// Items in crawling whose attempt started before `cutoff_millis`
    async fn find_stale_crawling(&self, cutoff_millis: i64) -> Result<Vec<QueueItem>>;

    /// Count items by status
    async fn count_by_status(&self, status: QueueStatus) -> Result<i64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory queue store with the same conditional-update rules as SQLite
    #[derive(Default)]
    pub struct InMemoryQueueRepository {
        items: Mutex<HashMap<QueueItemId, QueueItem>>,
        fail_fetch: AtomicBool,
        writes: AtomicUsize,
    }

    impl InMemoryQueueRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_items(items: Vec<QueueItem>) -> Self {
            let repo = Self::new();
            {
                let mut map = repo.items.lock().unwrap();
                for item in items {
                    map.insert(item.id.clone(), item);
                }
            }
            repo
        }

        /// Make `fetch_pending` fail like an unreachable store
        pub fn set_fail_fetch(&self, fail: bool) {
            self.fail_fetch.store(fail, Ordering::SeqCst);
        }

        /// Number of mutating calls that changed a row
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn get(&self, id: &str) -> Option<QueueItem> {
            self.items.lock().unwrap().get(id).cloned()
        }

        /// Overwrite an item directly (test setup, bypasses write counting)
        pub fn put(&self, item: QueueItem) {
            self.items.lock().unwrap().insert(item.id.clone(), item);
        }
    }

    #[async_trait]
    impl QueueRepository for InMemoryQueueRepository {
        async fn insert(&self, item: &QueueItem) -> Result<()> {
            let mut items = self.items.lock().unwrap();
            if items.contains_key(&item.id) {
                return Err(AppError::Database(format!(
                    "Unique constraint violation: {}",
                    item.id
                )));
            }
            items.insert(item.id.clone(), item.clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn insert_batch(&self, batch: &[QueueItem]) -> Result<()> {
            let mut items = self.items.lock().unwrap();
            if let Some(dup) = batch.iter().find(|i| items.contains_key(&i.id)) {
                return Err(AppError::Database(format!(
                    "Unique constraint violation: {}",
                    dup.id
                )));
            }
            for item in batch {
                items.insert(item.id.clone(), item.clone());
            }
            self.writes.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(())
        }

        async fn find_by_id(&self, id: &QueueItemId) -> Result<Option<QueueItem>> {
            Ok(self.items.lock().unwrap().get(id).cloned())
        }

        async fn fetch_pending(&self, limit: u32) -> Result<Vec<QueueItem>> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(AppError::Database("Queue store unreachable".to_string()));
            }
            let items = self.items.lock().unwrap();
            let mut pending: Vec<QueueItem> = items
                .values()
                .filter(|i| i.status == QueueStatus::Pending)
                .cloned()
                .collect();
            pending.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
            pending.truncate(limit as usize);
            Ok(pending)
        }

        async fn try_claim(&self, id: &QueueItemId, attempted_at: i64) -> Result<bool> {
            let mut items = self.items.lock().unwrap();
            match items.get_mut(id) {
                Some(item) if item.status == QueueStatus::Pending => {
                    item.status = QueueStatus::Crawling;
                    item.attempted_at = Some(attempted_at);
                    item.updated_at = attempted_at;
                    self.writes.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn save_outcome(&self, item: &QueueItem) -> Result<()> {
            let mut items = self.items.lock().unwrap();
            match items.get_mut(&item.id) {
                Some(stored)
                    if stored.status == QueueStatus::Crawling
                        && stored.attempted_at == item.attempted_at =>
                {
                    stored.status = item.status;
                    stored.retry_count = item.retry_count;
                    stored.error_message = item.error_message.clone();
                    stored.indexed_at = item.indexed_at;
                    stored.updated_at = item.updated_at;
                    self.writes.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                Some(stored) if stored.status == QueueStatus::Crawling => Err(
                    AppError::Conflict(format!("Queue item {} is owned by a newer attempt", item.id)),
                ),
                Some(stored) => Err(AppError::Conflict(format!(
                    "Queue item {} is {}, not crawling",
                    item.id, stored.status
                ))),
                None => Err(AppError::NotFound(format!(
                    "Queue item {} not found",
                    item.id
                ))),
            }
        }

        async fn find_stale_crawling(&self, cutoff_millis: i64) -> Result<Vec<QueueItem>> {
            let items = self.items.lock().unwrap();
            let mut stale: Vec<QueueItem> = items
                .values()
                .filter(|i| {
                    i.status == QueueStatus::Crawling
                        && i.attempted_at.map_or(true, |at| at < cutoff_millis)
                })
                .cloned()
                .collect();
            stale.sort_by_key(|i| i.created_at);
            Ok(stale)
        }

        async fn count_by_status(&self, status: QueueStatus) -> Result<i64> {
            let items = self.items.lock().unwrap();
            Ok(items.values().filter(|i| i.status == status).count() as i64)
        }
    }
}
