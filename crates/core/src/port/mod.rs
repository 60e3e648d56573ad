// Port Layer - Interfaces for external dependencies

pub mod domain_repository;
pub mod id_provider; // For deterministic testing
pub mod queue_repository;
pub mod submission;
pub mod time_provider;

// Re-exports
pub use domain_repository::DomainRepository;
pub use id_provider::IdProvider;
pub use queue_repository::QueueRepository;
pub use submission::{
    AdapterRegistry, SubmissionAdapter, SubmissionError, SubmissionReceipt, SubmissionRequest,
};
pub use time_provider::TimeProvider;
