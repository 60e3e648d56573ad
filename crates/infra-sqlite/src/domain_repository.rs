// SQLite DomainRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use indexer_core::domain::{Domain, DomainCredentials, DomainId};
use indexer_core::error::{AppError, Result};
use indexer_core::port::{DomainRepository, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteDomainRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteDomainRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl DomainRepository for SqliteDomainRepository {
    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>> {
        let row = sqlx::query_as::<_, DomainRow>(
            r#"
            SELECT id, name, url, enabled, auto_index, google_service_account, bing_api_key
            FROM domains WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Domain::try_from).transpose()
    }

    async fn upsert(&self, domain: &Domain) -> Result<()> {
        let now = self.time_provider.now_millis();
        let service_account = domain
            .credentials
            .google_service_account
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO domains (
                id, name, url, enabled, auto_index,
                google_service_account, bing_api_key, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                url = excluded.url,
                enabled = excluded.enabled,
                auto_index = excluded.auto_index,
                google_service_account = excluded.google_service_account,
                bing_api_key = excluded.bing_api_key,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&domain.id)
        .bind(&domain.name)
        .bind(&domain.url)
        .bind(domain.enabled)
        .bind(domain.auto_index)
        .bind(service_account)
        .bind(&domain.credentials.bing_api_key)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Domain>> {
        let rows: Vec<DomainRow> = sqlx::query_as(
            r#"
            SELECT id, name, url, enabled, auto_index, google_service_account, bing_api_key
            FROM domains ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(Domain::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DomainRow {
    id: String,
    name: String,
    url: String,
    enabled: bool,
    auto_index: bool,
    google_service_account: Option<String>,
    bing_api_key: Option<String>,
}

impl TryFrom<DomainRow> for Domain {
    type Error = AppError;

    fn try_from(row: DomainRow) -> Result<Self> {
        let google_service_account = row
            .google_service_account
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Domain {
            id: row.id,
            name: row.name,
            url: row.url,
            enabled: row.enabled,
            auto_index: row.auto_index,
            credentials: DomainCredentials {
                google_service_account,
                bing_api_key: row.bing_api_key,
            },
        })
    }
}
