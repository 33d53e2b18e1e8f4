//! Worker configuration and shutdown coordination
//!
//! This module provides configuration management and graceful shutdown
//! coordination for the verification worker.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Main configuration for the verification worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Program attesting the reports (`verified_by`)
    pub program_id: String,
    /// JSON file with the launch snapshots to verify
    pub snapshot_path: String,
    pub poll_interval_secs: u64,
    /// Reports older than this are regenerated
    pub staleness_hours: i64,
    /// Launches evaluated per cycle
    pub batch_size: usize,
    pub shutdown_grace_secs: u64,
    pub log_level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program_id: "11111111111111111111111111111111".to_string(),
            snapshot_path: "launches.json".to_string(),
            poll_interval_secs: 10,
            staleness_hours: 24,
            batch_size: 10,
            shutdown_grace_secs: 5,
            log_level: "info".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: WorkerConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a config file
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(program_id) = std::env::var("PROGRAM_ID") {
            self.program_id = program_id;
        }
        if let Ok(snapshot_path) = std::env::var("SNAPSHOT_PATH") {
            self.snapshot_path = snapshot_path;
        }
        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        crate::security::validate_program_id(&self.program_id)?;

        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        if self.staleness_hours <= 0 {
            anyhow::bail!("staleness_hours must be positive");
        }
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be positive");
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::hours(self.staleness_hours)
    }
}

/// Coordinates graceful shutdown of the worker tasks
pub struct ShutdownCoordinator {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Token tasks watch to learn about shutdown
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn add_handle(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Cancel every task and wait up to `grace` for them, aborting stragglers
    pub async fn shutdown(self, grace: Duration) {
        tracing::info!(
            "Initiating graceful shutdown of {} components",
            self.handles.len()
        );
        self.token.cancel();

        let deadline = tokio::time::Instant::now() + grace;
        for mut handle in self.handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Component ended abnormally: {}", e),
                Err(_) => {
                    tracing::warn!("Component did not stop within grace period, aborting");
                    handle.abort();
                }
            }
        }
        tracing::info!("All components shut down");
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
