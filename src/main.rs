//! Main entry point for the Launch Guard verification worker

use anyhow::Result;
use launch_guard::observability::{init_logging, WorkerMetrics};
use launch_guard::{InMemoryLaunchStore, ShutdownCoordinator, VerificationWorker, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;

const CONFIG_PATH: &str = "launch-guard.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config = if std::path::Path::new(CONFIG_PATH).exists() {
        WorkerConfig::from_toml_file(CONFIG_PATH)?
    } else {
        WorkerConfig::from_env()?
    };

    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("Starting Launch Guard worker");
    tracing::info!("Program ID: {}", config.program_id);

    let store = Arc::new(InMemoryLaunchStore::new());
    match store.load_snapshot_file(&config.snapshot_path).await {
        Ok(count) => tracing::info!("{} launches queued for verification", count),
        Err(e) => tracing::warn!("No launches loaded: {:#}", e),
    }

    let metrics = WorkerMetrics::new()?;
    let worker = VerificationWorker::new(config.clone(), store.clone(), store, metrics.clone());

    let mut shutdown = ShutdownCoordinator::new();
    let token = shutdown.token();
    shutdown.add_handle(tokio::spawn(async move {
        worker.run(token).await;
    }));

    tracing::info!("Worker started - awaiting shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down gracefully");
    shutdown
        .shutdown(Duration::from_secs(config.shutdown_grace_secs))
        .await;

    tracing::debug!("Final metrics:\n{}", metrics.render());
    Ok(())
}
