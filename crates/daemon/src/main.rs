//! SEO Indexer - Daemon Entry Point
//!
//! Wires the SQLite store, the provider adapters, the queue processor, the
//! timer trigger and the HTTP surface, then waits for Ctrl+C.

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use config::Settings;
use indexer_api_http::{ApiServer, AppState};
use indexer_core::application::{
    shutdown_channel, IndexingScheduler, QueueProcessor, QueueService, ReclaimService, RetryPolicy,
};
use indexer_core::port::id_provider::UuidProvider;
use indexer_core::port::time_provider::SystemTimeProvider;
use indexer_core::port::{DomainRepository, QueueRepository, TimeProvider};
use indexer_infra_http::build_registry;
use indexer_infra_sqlite::{
    create_pool, run_migrations, SqliteDomainRepository, SqliteQueueRepository,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "seo-indexer", version, about = "SEO indexing queue processor")]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, short, env = "INDEXER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration + logging
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let _log_guard = logging::init(&settings.log)?;

    info!(version = indexer_core::VERSION, "SEO indexer starting...");

    // 2. Database
    if let Some(dir) = settings.database_dir() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }
    let database_url = settings.resolved_database_url();
    info!(database_url = %database_url, "Initializing database...");

    let pool = create_pool(&database_url)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 3. Dependency wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let queue_repo: Arc<dyn QueueRepository> = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let domain_repo: Arc<dyn DomainRepository> = Arc::new(SqliteDomainRepository::new(
        pool.clone(),
        time_provider.clone(),
    ));
    let adapters = build_registry(&settings.provider_config(), time_provider.clone())
        .context("Failed to build submission adapters")?;

    let processor_config = settings.processor_config();
    let reclaim = Arc::new(ReclaimService::new(
        queue_repo.clone(),
        time_provider.clone(),
        RetryPolicy::new(processor_config.max_retries),
        processor_config.stale_after,
    ));
    let processor = Arc::new(QueueProcessor::new(
        queue_repo.clone(),
        domain_repo.clone(),
        adapters,
        time_provider.clone(),
        processor_config,
    ));
    let queue_service = Arc::new(QueueService::new(
        queue_repo,
        domain_repo,
        Arc::new(UuidProvider),
        time_provider,
    ));

    // 4. Recover attempts interrupted by a previous crash
    match reclaim.reclaim_stale().await {
        Ok(count) => info!(reclaimed = count, "Startup reclaim completed"),
        Err(e) => error!(error = %e, "Startup reclaim failed"),
    }

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    // 5. Timer trigger
    let scheduler_handle = if settings.scheduler.enabled {
        let scheduler =
            IndexingScheduler::new(processor.clone(), reclaim, settings.scheduler_interval());
        Some(tokio::spawn(scheduler.run(shutdown_rx.clone())))
    } else {
        warn!("Timer trigger disabled; queue is processed only on POST /");
        None
    };

    // 6. HTTP trigger + operator API
    let server = ApiServer::new(
        settings.server_config(),
        AppState {
            processor,
            queue_service,
        },
    );
    let mut server_handle = tokio::spawn(server.serve(shutdown_rx));

    info!("System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal (or an early server exit)
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received. Exiting gracefully...");
        }
        result = &mut server_handle => {
            shutdown_tx.shutdown();
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
            return Ok(());
        }
    }

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, server_handle).await.is_err() {
        warn!("HTTP server did not stop within the grace period");
    }
    if let Some(handle) = scheduler_handle {
        if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
            warn!("Scheduler did not stop within the grace period");
        }
    }
    pool.close().await;

    info!("Shutdown complete.");
    Ok(())
}
