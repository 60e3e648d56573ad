// Queue Item Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::site::DomainId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Queue item ID (UUID v4)
pub type QueueItemId = String;

/// Search engine a queue item is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    Google,
    Bing,
}

impl SearchEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::Bing => "bing",
        }
    }
}

impl std::fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchEngine {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "google" => Ok(SearchEngine::Google),
            "bing" => Ok(SearchEngine::Bing),
            other => Err(DomainError::UnknownSearchEngine(other.to_string())),
        }
    }
}

/// Delivery status of a queue item
///
/// `Indexed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Crawling,
    Indexed,
    Failed,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 4] = [
        QueueStatus::Pending,
        QueueStatus::Crawling,
        QueueStatus::Indexed,
        QueueStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Crawling => "crawling",
            QueueStatus::Indexed => "indexed",
            QueueStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Indexed | QueueStatus::Failed)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "crawling" => Ok(QueueStatus::Crawling),
            "indexed" => Ok(QueueStatus::Indexed),
            "failed" => Ok(QueueStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Outcome of recording a failed submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back to pending for the next batch
    Requeue,
    /// Retry budget spent, item is now failed
    Exhausted,
}

/// Queue Item Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub domain_id: DomainId,
    pub url: String,
    pub search_engine: SearchEngine,
    pub status: QueueStatus,
    pub retry_count: i32,
    pub error_message: Option<String>,

    pub created_at: i64, // epoch ms, immutable
    pub updated_at: i64,
    pub attempted_at: Option<i64>, // set when claimed into crawling
    pub indexed_at: Option<i64>,
}

impl QueueItem {
    /// Create a new pending item
    ///
    /// ID and creation time are injected (see `IdProvider` / `TimeProvider`).
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        domain_id: impl Into<String>,
        url: impl Into<String>,
        search_engine: SearchEngine,
    ) -> Self {
        Self {
            id: id.into(),
            domain_id: domain_id.into(),
            url: url.into(),
            search_engine,
            status: QueueStatus::Pending,
            retry_count: 0,
            error_message: None,
            created_at,
            updated_at: created_at,
            attempted_at: None,
            indexed_at: None,
        }
    }

    fn expect_status(&self, expected: QueueStatus, to: QueueStatus) -> Result<()> {
        if self.status != expected {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    /// pending -> crawling
    pub fn claim(&mut self, now_millis: i64) -> Result<()> {
        self.expect_status(QueueStatus::Pending, QueueStatus::Crawling)?;
        self.status = QueueStatus::Crawling;
        self.attempted_at = Some(now_millis);
        self.updated_at = now_millis;
        Ok(())
    }

    /// crawling -> indexed
    pub fn mark_indexed(&mut self, now_millis: i64) -> Result<()> {
        self.expect_status(QueueStatus::Crawling, QueueStatus::Indexed)?;
        self.status = QueueStatus::Indexed;
        self.indexed_at = Some(now_millis);
        self.error_message = None;
        self.updated_at = now_millis;
        Ok(())
    }

    /// crawling -> pending | failed
    ///
    /// Spends one unit of the retry budget. Once `retry_count` reaches
    /// `max_retries` the item is failed for good.
    pub fn record_failure(
        &mut self,
        message: impl Into<String>,
        max_retries: i32,
        now_millis: i64,
    ) -> Result<RetryDecision> {
        if self.status != QueueStatus::Crawling {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "pending|failed".to_string(),
            });
        }

        self.retry_count += 1;
        self.error_message = Some(message.into());
        self.updated_at = now_millis;

        if self.retry_count >= max_retries {
            self.status = QueueStatus::Failed;
            Ok(RetryDecision::Exhausted)
        } else {
            self.status = QueueStatus::Pending;
            Ok(RetryDecision::Requeue)
        }
    }

    /// crawling -> failed, without touching the retry budget
    pub fn fail_configuration(&mut self, message: impl Into<String>, now_millis: i64) -> Result<()> {
        self.expect_status(QueueStatus::Crawling, QueueStatus::Failed)?;
        self.status = QueueStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = now_millis;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_item() -> QueueItem {
        QueueItem::new(
            "item-1",
            1_000,
            "domain-1",
            "https://x.com/a",
            SearchEngine::Google,
        )
    }

    #[test]
    fn test_new_item_is_pending() {
        let item = pending_item();
        assert_eq!(item.status, QueueStatus::Pending);
        assert_eq!(item.retry_count, 0);
        assert_eq!(item.updated_at, item.created_at);
        assert!(item.attempted_at.is_none());
        assert!(item.indexed_at.is_none());
    }

    #[test]
    fn test_success_lifecycle() {
        let mut item = pending_item();
        item.error_message = Some("previous failure".to_string());

        item.claim(2_000).unwrap();
        assert_eq!(item.status, QueueStatus::Crawling);
        assert_eq!(item.attempted_at, Some(2_000));

        item.mark_indexed(3_000).unwrap();
        assert_eq!(item.status, QueueStatus::Indexed);
        assert_eq!(item.indexed_at, Some(3_000));
        assert!(item.error_message.is_none());
        assert_eq!(item.created_at, 1_000);
    }

    #[test]
    fn test_failure_requeues_until_budget_spent() {
        let mut item = pending_item();

        for attempt in 1..3 {
            item.claim(attempt * 10).unwrap();
            let decision = item.record_failure("boom", 3, attempt * 10 + 1).unwrap();
            assert_eq!(decision, RetryDecision::Requeue);
            assert_eq!(item.status, QueueStatus::Pending);
            assert_eq!(item.retry_count, attempt as i32);
        }

        item.claim(100).unwrap();
        let decision = item.record_failure("boom", 3, 101).unwrap();
        assert_eq!(decision, RetryDecision::Exhausted);
        assert_eq!(item.status, QueueStatus::Failed);
        assert_eq!(item.retry_count, 3);
        assert_eq!(item.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_configuration_failure_keeps_retry_count() {
        let mut item = pending_item();
        item.claim(2_000).unwrap();
        item.fail_configuration("Missing bing API credentials", 2_001)
            .unwrap();

        assert_eq!(item.status, QueueStatus::Failed);
        assert_eq!(item.retry_count, 0);
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut item = pending_item();
        item.claim(1).unwrap();
        item.mark_indexed(2).unwrap();

        assert!(item.claim(3).is_err());
        assert!(item.record_failure("late", 3, 4).is_err());
        assert!(item.fail_configuration("late", 5).is_err());
        assert_eq!(item.status, QueueStatus::Indexed);
    }

    #[test]
    fn test_outcome_requires_crawling() {
        let mut item = pending_item();
        let err = item.mark_indexed(1).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "pending".to_string(),
                to: "indexed".to_string(),
            }
        );
        assert!(item.record_failure("x", 3, 1).is_err());
        assert_eq!(item.retry_count, 0);
    }

    #[test]
    fn test_enum_string_forms() {
        assert_eq!("bing".parse::<SearchEngine>().unwrap(), SearchEngine::Bing);
        assert!("yahoo".parse::<SearchEngine>().is_err());
        assert_eq!(
            "crawling".parse::<QueueStatus>().unwrap(),
            QueueStatus::Crawling
        );
        assert!(QueueStatus::Failed.is_terminal());
        assert!(!QueueStatus::Pending.is_terminal());
        assert_eq!(
            serde_json::to_value(SearchEngine::Google).unwrap(),
            serde_json::json!("google")
        );
    }
}
