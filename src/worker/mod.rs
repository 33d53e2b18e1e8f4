//! Verification Worker
//!
//! Periodically picks up launches whose report is missing or stale, runs the
//! rules engine over their latest snapshot and hands the report (plus launch
//! statistics) to a sink.
//!
//! ## Flow
//! 1. `LaunchSource::pending_launches` returns up to `batch_size` snapshots
//! 2. Each snapshot is evaluated with [`generate_verification_report_at`]
//! 3. `ReportSink::store_report` persists the result
//!
//! A failing launch is logged, counted and reported to the sink through
//! `ReportSink::record_failure`; the rest of the batch continues.

pub mod store;

pub use store::{InMemoryLaunchStore, StoredReport};

use crate::observability::WorkerMetrics;
use crate::orchestrator::WorkerConfig;
use crate::rules::{
    calculate_launch_stats, generate_verification_report_at, LaunchConfig, LaunchStats,
    RulesError, TokenAuthorities, UserPurchase, VerificationReport, VerificationStatus,
};
use crate::security::sanitize_for_logging;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Everything the engine needs to evaluate one launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSnapshot {
    pub launch_id: String,
    pub config: LaunchConfig,
    #[serde(default)]
    pub purchases: Vec<UserPurchase>,
    /// Latest authority snapshot, if one has been read from chain
    #[serde(default)]
    pub authorities: Option<TokenAuthorities>,
}

/// Where launches awaiting verification come from
#[async_trait]
pub trait LaunchSource: Send + Sync {
    /// Launches with no report, or with a report generated before `stale_before`
    async fn pending_launches(
        &self,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LaunchSnapshot>>;
}

/// Where finished reports go
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Insert or replace the report for `report.launch_id`
    async fn store_report(
        &self,
        report: VerificationReport,
        stats: Option<LaunchStats>,
    ) -> Result<()>;

    /// Note a failed evaluation so the launch waits out the staleness period
    /// instead of being retried every cycle
    async fn record_failure(&self, _launch_id: &str, _attempted_at: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
}

/// Outcome counts of one worker cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub examined: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    /// Launches that could not be evaluated or stored
    pub errors: usize,
}

impl CycleSummary {
    fn record(&mut self, status: VerificationStatus) {
        match status {
            VerificationStatus::Pass => self.passed += 1,
            VerificationStatus::Warn => self.warned += 1,
            VerificationStatus::Fail => self.failed += 1,
        }
    }

    pub fn reports(&self) -> usize {
        self.passed + self.warned + self.failed
    }
}

pub struct VerificationWorker {
    config: WorkerConfig,
    source: Arc<dyn LaunchSource>,
    sink: Arc<dyn ReportSink>,
    metrics: WorkerMetrics,
}

impl VerificationWorker {
    pub fn new(
        config: WorkerConfig,
        source: Arc<dyn LaunchSource>,
        sink: Arc<dyn ReportSink>,
        metrics: WorkerMetrics,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            metrics,
        }
    }

    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// Evaluate one batch of pending launches
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let started = Instant::now();
        let now = Utc::now();
        let stale_before = now - self.config.staleness();

        let launches = self
            .source
            .pending_launches(stale_before, self.config.batch_size)
            .await
            .context("Failed to fetch pending launches")?;

        let mut summary = CycleSummary {
            examined: launches.len(),
            ..Default::default()
        };

        for snapshot in &launches {
            match self.verify_launch(snapshot, now).await {
                Ok(status) => {
                    summary.record(status);
                    self.metrics.record_report(status);
                }
                Err(e) => {
                    summary.errors += 1;
                    self.metrics.record_failure();
                    log_launch_failure(&snapshot.launch_id, &e);

                    if let Err(e) = self.sink.record_failure(&snapshot.launch_id, now).await {
                        debug!(
                            launch_id = %snapshot.launch_id,
                            "Failed to record failed attempt: {}",
                            sanitize_for_logging(&format!("{:#}", e))
                        );
                    }
                }
            }
        }

        self.metrics
            .record_cycle(launches.len(), started.elapsed().as_secs_f64());

        if summary.examined > 0 {
            info!(
                "Cycle complete: {} examined, {} pass, {} warn, {} fail, {} errors",
                summary.examined, summary.passed, summary.warned, summary.failed, summary.errors
            );
        } else {
            debug!("Cycle complete: nothing pending");
        }

        Ok(summary)
    }

    async fn verify_launch(
        &self,
        snapshot: &LaunchSnapshot,
        now: DateTime<Utc>,
    ) -> Result<VerificationStatus> {
        // No snapshot yet: revoked-looking but unverified
        let authorities = snapshot
            .authorities
            .clone()
            .unwrap_or_else(|| TokenAuthorities::unverified(now));

        let report = generate_verification_report_at(
            &snapshot.launch_id,
            &snapshot.config,
            &snapshot.purchases,
            &authorities,
            &self.config.program_id,
            now,
        )?;

        let stats = if snapshot.purchases.is_empty() {
            None
        } else {
            Some(calculate_launch_stats(
                &snapshot.purchases,
                snapshot.config.usd1_config.total_supply,
            )?)
        };

        let status = report.overall_status;
        self.sink
            .store_report(report, stats)
            .await
            .with_context(|| format!("Failed to store report for {}", snapshot.launch_id))?;

        Ok(status)
    }

    /// Run cycles every poll interval until `token` is cancelled
    pub async fn run(&self, token: CancellationToken) {
        info!(
            "Verification worker started (poll: {}s, staleness: {}h, batch: {})",
            self.config.poll_interval_secs, self.config.staleness_hours, self.config.batch_size
        );

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Verification worker stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!("Worker cycle failed: {}", sanitize_for_logging(&format!("{:#}", e)));
                    }
                }
            }
        }
    }
}

/// Rules errors carry public on-chain identifiers and are logged as fields.
/// Anything else may embed connection details and goes through the redactor.
fn log_launch_failure(launch_id: &str, error: &anyhow::Error) {
    match error.downcast_ref::<RulesError>() {
        Some(RulesError::InvalidPurchaseAmount {
            wallet,
            tx_signature,
            amount,
        }) => warn!(
            launch_id,
            wallet = %wallet,
            tx_signature = %tx_signature,
            amount,
            "Verification rejected: invalid purchase amount"
        ),
        Some(RulesError::ForeignPurchase {
            tx_signature,
            expected,
            found,
        }) => warn!(
            launch_id,
            tx_signature = %tx_signature,
            expected = %expected,
            found = %found,
            "Verification rejected: purchase belongs to another launch"
        ),
        Some(rules_error) => warn!(launch_id, error = %rules_error, "Verification rejected"),
        None => warn!(
            launch_id,
            "Verification failed: {}",
            sanitize_for_logging(&format!("{:#}", error))
        ),
    }
}
