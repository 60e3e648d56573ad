// SEO Indexer Infrastructure - SQLite Adapter
// Implements: QueueRepository, DomainRepository

mod connection;
mod domain_repository;
mod error;
mod migration;
mod queue_repository;

pub use connection::create_pool;
pub use domain_repository::SqliteDomainRepository;
pub use migration::run_migrations;
pub use queue_repository::SqliteQueueRepository;

// sqlx::Error -> AppError goes through error::map_sqlx_error
// (orphan rules: From<sqlx::Error> for AppError cannot live here)
