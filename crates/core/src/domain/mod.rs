// Domain Layer - Pure business logic and entities

pub mod error;
pub mod queue_item;
pub mod site;

// Re-exports
pub use error::DomainError;
pub use queue_item::{QueueItem, QueueItemId, QueueStatus, RetryDecision, SearchEngine};
pub use site::{Credential, Domain, DomainCredentials, DomainId};
