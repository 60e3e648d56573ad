// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod processor;
pub mod queue_service;
pub mod reclaim;
pub mod retry;
pub mod scheduler;
pub mod shutdown;

// Re-exports
pub use processor::{ProcessorConfig, QueueProcessor, RunSummary};
pub use queue_service::{EnqueueRequest, QueueService, QueueStats};
pub use reclaim::ReclaimService;
pub use retry::RetryPolicy;
pub use scheduler::IndexingScheduler;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
