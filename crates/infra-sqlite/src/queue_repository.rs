// SQLite QueueRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use indexer_core::domain::{QueueItem, QueueItemId, QueueStatus};
use indexer_core::error::{AppError, Result};
use indexer_core::port::QueueRepository;
use sqlx::{Sqlite, SqlitePool};

const SELECT_COLUMNS: &str = "SELECT id, domain_id, url, search_engine, status, retry_count, \
     error_message, created_at, updated_at, attempted_at, indexed_at FROM indexing_queue";

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_with<'e, E>(executor: E, item: &QueueItem) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO indexing_queue (
            id, domain_id, url, search_engine, status, retry_count,
            error_message, created_at, updated_at, attempted_at, indexed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.domain_id)
    .bind(&item.url)
    .bind(item.search_engine.as_str())
    .bind(item.status.as_str())
    .bind(item.retry_count)
    .bind(&item.error_message)
    .bind(item.created_at)
    .bind(item.updated_at)
    .bind(item.attempted_at)
    .bind(item.indexed_at)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn insert(&self, item: &QueueItem) -> Result<()> {
        insert_with(&self.pool, item).await
    }

    async fn insert_batch(&self, items: &[QueueItem]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for item in items {
            insert_with(&mut *tx, item).await?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &QueueItemId) -> Result<Option<QueueItem>> {
        let row = sqlx::query_as::<_, QueueItemRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(QueueItem::try_from).transpose()
    }

    async fn fetch_pending(&self, limit: u32) -> Result<Vec<QueueItem>> {
        let rows: Vec<QueueItemRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'pending' ORDER BY created_at ASC, id ASC LIMIT ?",
            SELECT_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(QueueItem::try_from).collect()
    }

    async fn try_claim(&self, id: &QueueItemId, attempted_at: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE indexing_queue
            SET status = 'crawling', attempted_at = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(attempted_at)
        .bind(attempted_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn save_outcome(&self, item: &QueueItem) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE indexing_queue
            SET status = ?, retry_count = ?, error_message = ?, indexed_at = ?, updated_at = ?
            WHERE id = ? AND status = 'crawling' AND attempted_at IS ?
            "#,
        )
        .bind(item.status.as_str())
        .bind(item.retry_count)
        .bind(&item.error_message)
        .bind(item.indexed_at)
        .bind(item.updated_at)
        .bind(&item.id)
        .bind(item.attempted_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.find_by_id(&item.id).await? {
            Some(stored) if stored.status == QueueStatus::Crawling => {
                Err(AppError::Conflict(format!(
                    "Queue item {} is owned by a newer attempt",
                    item.id
                )))
            }
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
        let rows: Vec<QueueItemRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'crawling' AND (attempted_at IS NULL OR attempted_at < ?) \
             ORDER BY created_at ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(cutoff_millis)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(QueueItem::try_from).collect()
    }

    async fn count_by_status(&self, status: QueueStatus) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM indexing_queue WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QueueItemRow {
    id: String,
    domain_id: String,
    url: String,
    search_engine: String,
    status: String,
    retry_count: i32,
    error_message: Option<String>,
    created_at: i64,
    updated_at: i64,
    attempted_at: Option<i64>,
    indexed_at: Option<i64>,
}

impl TryFrom<QueueItemRow> for QueueItem {
    type Error = AppError;

    fn try_from(row: QueueItemRow) -> Result<Self> {
        Ok(QueueItem {
            search_engine: row.search_engine.parse()?,
            status: row.status.parse()?,
            id: row.id,
            domain_id: row.domain_id,
            url: row.url,
            retry_count: row.retry_count,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
            attempted_at: row.attempted_at,
            indexed_at: row.indexed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use indexer_core::domain::SearchEngine;

    async fn repo() -> SqliteQueueRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteQueueRepository::new(pool)
    }

    fn item(id: &str, created_at: i64) -> QueueItem {
        QueueItem::new(
            id,
            created_at,
            "d1",
            format!("https://x.com/{}", id),
            SearchEngine::Google,
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = repo().await;
        repo.insert(&item("a", 10)).await.unwrap();

        let found = repo.find_by_id(&"a".to_string()).await.unwrap().unwrap();
        assert_eq!(found, item("a", 10));
        assert!(repo.find_by_id(&"zzz".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let repo = repo().await;
        repo.insert(&item("a", 10)).await.unwrap();

        let err = repo.insert(&item("a", 11)).await.unwrap_err();
        assert!(err.to_string().contains("Unique constraint"));
    }

    #[tokio::test]
    async fn test_insert_batch_is_all_or_nothing() {
        let repo = repo().await;
        repo.insert(&item("b", 1)).await.unwrap();

        let result = repo
            .insert_batch(&[item("a", 2), item("b", 3), item("c", 4)])
            .await;

        assert!(result.is_err());
        assert!(repo.find_by_id(&"a".to_string()).await.unwrap().is_none());
        assert_eq!(repo.count_by_status(QueueStatus::Pending).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_pending_order_and_limit() {
        let repo = repo().await;
        repo.insert_batch(&[item("c", 30), item("b", 10), item("a", 10), item("d", 40)])
            .await
            .unwrap();
        let mut done = item("e", 1);
        done.status = QueueStatus::Indexed;
        repo.insert(&done).await.unwrap();

        let pending = repo.fetch_pending(3).await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|i| i.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_try_claim_only_once() {
        let repo = repo().await;
        repo.insert(&item("a", 1)).await.unwrap();

        assert!(repo.try_claim(&"a".to_string(), 500).await.unwrap());
        assert!(!repo.try_claim(&"a".to_string(), 600).await.unwrap());

        let claimed = repo.find_by_id(&"a".to_string()).await.unwrap().unwrap();
        assert_eq!(claimed.status, QueueStatus::Crawling);
        assert_eq!(claimed.attempted_at, Some(500));
    }

    #[tokio::test]
    async fn test_save_outcome_requires_crawling() {
        let repo = repo().await;
        let mut pending = item("a", 1);
        repo.insert(&pending).await.unwrap();

        // Not claimed yet
        pending.claim(100).unwrap();
        pending.mark_indexed(200).unwrap();
        assert!(matches!(
            repo.save_outcome(&pending).await,
            Err(AppError::Conflict(_))
        ));

        repo.try_claim(&"a".to_string(), 100).await.unwrap();
        repo.save_outcome(&pending).await.unwrap();

        let stored = repo.find_by_id(&"a".to_string()).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Indexed);
        assert_eq!(stored.indexed_at, Some(200));

        let mut ghost = item("ghost", 1);
        ghost.claim(1).unwrap();
        assert!(matches!(
            repo.save_outcome(&ghost).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_outcome_roundtrip() {
        let repo = repo().await;
        let mut it = item("a", 1);
        repo.insert(&it).await.unwrap();
        it.claim(100).unwrap();
        repo.try_claim(&it.id, 100).await.unwrap();
        it.record_failure("Bing API error: nope", 3, 150).unwrap();
        repo.save_outcome(&it).await.unwrap();

        let stored = repo.find_by_id(&it.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Pending);
        assert_eq!(stored.retry_count, 1);
        assert_eq!(stored.error_message.as_deref(), Some("Bing API error: nope"));
        assert_eq!(stored.updated_at, 150);
    }

    #[tokio::test]
    async fn test_late_outcome_from_reclaimed_attempt_is_rejected() {
        let repo = repo().await;
        let id = "a".to_string();
        repo.insert(&item("a", 1)).await.unwrap();

        // First attempt claims, then stalls
        let mut first = item("a", 1);
        first.claim(100).unwrap();
        assert!(repo.try_claim(&id, 100).await.unwrap());

        // Sweep requeues it, a second attempt claims it again
        let mut reclaimed = repo.find_stale_crawling(200).await.unwrap().remove(0);
        reclaimed.record_failure("interrupted", 3, 200).unwrap();
        repo.save_outcome(&reclaimed).await.unwrap();
        let mut second = repo.find_by_id(&id).await.unwrap().unwrap();
        second.claim(300).unwrap();
        assert!(repo.try_claim(&id, 300).await.unwrap());

        // The stalled attempt finally reports back
        first.record_failure("late failure", 3, 400).unwrap();
        assert!(matches!(
            repo.save_outcome(&first).await,
            Err(AppError::Conflict(_))
        ));
        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Crawling);
        assert_eq!(stored.attempted_at, Some(300));
        assert_eq!(stored.retry_count, 1);

        second.mark_indexed(500).unwrap();
        repo.save_outcome(&second).await.unwrap();
        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Indexed);
        assert_eq!(stored.retry_count, 1);
        assert!(stored.error_message.is_none());
    }

    #[tokio::test]
    async fn test_find_stale_crawling() {
        let repo = repo().await;
        repo.insert_batch(&[item("old", 1), item("new", 2), item("idle", 3)])
            .await
            .unwrap();
        repo.try_claim(&"old".to_string(), 1_000).await.unwrap();
        repo.try_claim(&"new".to_string(), 9_000).await.unwrap();

        let stale = repo.find_stale_crawling(5_000).await.unwrap();

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, "old");
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let repo = repo().await;
        repo.insert_batch(&[item("a", 1), item("b", 2)]).await.unwrap();
        repo.try_claim(&"a".to_string(), 5).await.unwrap();

        assert_eq!(repo.count_by_status(QueueStatus::Pending).await.unwrap(), 1);
        assert_eq!(repo.count_by_status(QueueStatus::Crawling).await.unwrap(), 1);
        assert_eq!(repo.count_by_status(QueueStatus::Failed).await.unwrap(), 0);
    }
}
