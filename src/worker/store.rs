//! In-memory launch store
//!
//! Holds launch snapshots, their latest reports and their latest failed
//! attempts. Serves as both the worker's [`LaunchSource`] and its
//! [`ReportSink`].
//!
//! A launch is pending while its last attempt, successful or not, is older
//! than the staleness cutoff. Pending launches are handed out least recently
//! attempted first, so launches that keep failing cannot starve the rest.

use super::{LaunchSnapshot, LaunchSource, ReportSink};
use crate::rules::{LaunchStats, VerificationReport};
use crate::security::validate_identifier;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Latest report of a launch and the stats computed with it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
    pub report: VerificationReport,
    pub stats: Option<LaunchStats>,
}

/// Locks are always taken in field order
#[derive(Default)]
pub struct InMemoryLaunchStore {
    /// Insertion order breaks ties between equally old launches
    launches: RwLock<Vec<LaunchSnapshot>>,
    reports: RwLock<HashMap<String, StoredReport>>,
    failures: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryLaunchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a launch, replacing any snapshot with the same id
    pub async fn insert_launch(&self, snapshot: LaunchSnapshot) -> Result<()> {
        validate_identifier("launch id", &snapshot.launch_id)?;

        let mut launches = self.launches.write().await;
        match launches
            .iter_mut()
            .find(|l| l.launch_id == snapshot.launch_id)
        {
            Some(existing) => {
                // New data deserves a fresh attempt
                self.failures.write().await.remove(&snapshot.launch_id);
                *existing = snapshot;
            }
            None => launches.push(snapshot),
        }
        Ok(())
    }

    /// Load a JSON array of launch snapshots, returning how many were read
    pub async fn load_snapshot_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
        let snapshots: Vec<LaunchSnapshot> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot file {}", path.display()))?;

        let count = snapshots.len();
        for snapshot in snapshots {
            self.insert_launch(snapshot).await?;
        }

        info!("Loaded {} launch snapshots from {}", count, path.display());
        Ok(count)
    }

    pub async fn report(&self, launch_id: &str) -> Option<StoredReport> {
        self.reports.read().await.get(launch_id).cloned()
    }

    /// When the launch last failed evaluation, if its latest attempt failed
    pub async fn last_failure(&self, launch_id: &str) -> Option<DateTime<Utc>> {
        self.failures.read().await.get(launch_id).copied()
    }

    pub async fn launch_count(&self) -> usize {
        self.launches.read().await.len()
    }

    pub async fn report_count(&self) -> usize {
        self.reports.read().await.len()
    }
}

#[async_trait]
impl LaunchSource for InMemoryLaunchStore {
    async fn pending_launches(
        &self,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LaunchSnapshot>> {
        let launches = self.launches.read().await;
        let reports = self.reports.read().await;
        let failures = self.failures.read().await;

        let last_attempt = |id: &str| -> Option<DateTime<Utc>> {
            let reported = reports.get(id).map(|r| r.report.generated_at);
            let failed = failures.get(id).copied();
            reported.max(failed)
        };

        let mut candidates: Vec<(Option<DateTime<Utc>>, &LaunchSnapshot)> = launches
            .iter()
            .map(|l| (last_attempt(&l.launch_id), l))
            .filter(|(attempt, _)| attempt.map_or(true, |at| at < stale_before))
            .collect();

        // Never attempted first, then oldest attempt; stable for ties
        candidates.sort_by_key(|(attempt, _)| *attempt);

        let pending: Vec<LaunchSnapshot> = candidates
            .into_iter()
            .take(limit)
            .map(|(_, l)| l.clone())
            .collect();

        debug!("{} launches pending verification", pending.len());
        Ok(pending)
    }
}

#[async_trait]
impl ReportSink for InMemoryLaunchStore {
    async fn store_report(
        &self,
        report: VerificationReport,
        stats: Option<LaunchStats>,
    ) -> Result<()> {
        let launch_id = report.launch_id.clone();
        self.reports
            .write()
            .await
            .insert(launch_id.clone(), StoredReport { report, stats });
        self.failures.write().await.remove(&launch_id);
        Ok(())
    }

    async fn record_failure(&self, launch_id: &str, attempted_at: DateTime<Utc>) -> Result<()> {
        self.failures
            .write()
            .await
            .insert(launch_id.to_string(), attempted_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{generate_verification_report_at, LaunchConfig, TokenAuthorities};
    use chrono::Duration;

    fn snapshot(id: &str) -> LaunchSnapshot {
        LaunchSnapshot {
            launch_id: id.to_string(),
            config: LaunchConfig::default(),
            purchases: Vec::new(),
            authorities: None,
        }
    }

    fn report_at(id: &str, at: DateTime<Utc>) -> VerificationReport {
        generate_verification_report_at(
            id,
            &LaunchConfig::default(),
            &[],
            &TokenAuthorities::unverified(at),
            "verifier",
            at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_replaces_same_id() {
        let store = InMemoryLaunchStore::new();
        store.insert_launch(snapshot("a")).await.unwrap();
        let mut updated = snapshot("a");
        updated.config.anti_snipe.max_buy_per_wallet = 5.0;
        store.insert_launch(updated).await.unwrap();

        assert_eq!(store.launch_count().await, 1);
        let pending = store.pending_launches(Utc::now(), 10).await.unwrap();
        assert_eq!(pending[0].config.anti_snipe.max_buy_per_wallet, 5.0);
    }

    #[tokio::test]
    async fn test_insert_rejects_bad_id() {
        let store = InMemoryLaunchStore::new();
        assert!(store.insert_launch(snapshot("")).await.is_err());
        assert!(store.insert_launch(snapshot("two words")).await.is_err());
    }

    #[tokio::test]
    async fn test_pending_respects_staleness() {
        let store = InMemoryLaunchStore::new();
        let now = Utc::now();
        store.insert_launch(snapshot("fresh")).await.unwrap();
        store.insert_launch(snapshot("stale")).await.unwrap();
        store.insert_launch(snapshot("never")).await.unwrap();

        store
            .store_report(report_at("fresh", now), None)
            .await
            .unwrap();
        store
            .store_report(report_at("stale", now - Duration::hours(25)), None)
            .await
            .unwrap();

        let pending = store
            .pending_launches(now - Duration::hours(24), 10)
            .await
            .unwrap();
        let ids: Vec<&str> = pending.iter().map(|l| l.launch_id.as_str()).collect();
        assert_eq!(ids, vec!["never", "stale"]);
    }

    #[tokio::test]
    async fn test_recent_failure_is_not_pending() {
        let store = InMemoryLaunchStore::new();
        let now = Utc::now();
        store.insert_launch(snapshot("failed")).await.unwrap();
        store.insert_launch(snapshot("old-failure")).await.unwrap();
        store.insert_launch(snapshot("stale")).await.unwrap();

        store.record_failure("failed", now).await.unwrap();
        store
            .record_failure("old-failure", now - Duration::hours(30))
            .await
            .unwrap();
        store
            .store_report(report_at("stale", now - Duration::hours(25)), None)
            .await
            .unwrap();

        // Oldest attempt first, whatever its outcome
        let pending = store
            .pending_launches(now - Duration::hours(24), 10)
            .await
            .unwrap();
        let ids: Vec<&str> = pending.iter().map(|l| l.launch_id.as_str()).collect();
        assert_eq!(ids, vec!["old-failure", "stale"]);

        // A stored report supersedes the failure
        store.store_report(report_at("failed", now), None).await.unwrap();
        assert!(store.last_failure("failed").await.is_none());
    }

    #[tokio::test]
    async fn test_load_snapshot_file() {
        let path = std::env::temp_dir().join(format!(
            "launch_guard_snapshots_{}.json",
            std::process::id()
        ));
        let json = r#"[
            {
                "launchId": "launch-1",
                "config": {
                    "antiSnipe": {"maxBuyPerWallet": 1000, "phasedUnlock": false},
                    "antiBundle": {"detectBundles": true, "maxWalletConcentration": 10, "oneActionPerTx": true},
                    "antiRug": {"fixedSupply": true, "revokeMintAuthority": true, "revokeFreezeAuthority": true},
                    "usd1Config": {"initialPrice": 1, "totalSupply": 10000, "liquidityAmount": 100, "creatorAllocation": 0}
                },
                "purchases": [
                    {"wallet": "w1", "launchId": "launch-1", "amount": 10, "timestamp": "2024-01-01T00:00:00Z", "txSignature": "s1"}
                ]
            },
            {
                "launchId": "launch-2",
                "config": {
                    "antiSnipe": {"maxBuyPerWallet": 1000, "phasedUnlock": false},
                    "antiBundle": {"detectBundles": true, "maxWalletConcentration": 10, "oneActionPerTx": true},
                    "antiRug": {"fixedSupply": true, "revokeMintAuthority": true, "revokeFreezeAuthority": true},
                    "usd1Config": {"initialPrice": 1, "totalSupply": 10000, "liquidityAmount": 100, "creatorAllocation": 0}
                }
            }
        ]"#;
        tokio::fs::write(&path, json).await.unwrap();

        let store = InMemoryLaunchStore::new();
        let count = store.load_snapshot_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(count, 2);
        let pending = store.pending_launches(Utc::now(), 10).await.unwrap();
        assert_eq!(pending[0].purchases.len(), 1);
        assert!(pending[1].purchases.is_empty());
        assert!(pending[1].authorities.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let store = InMemoryLaunchStore::new();
        let err = store
            .load_snapshot_file("/nonexistent/launches.json")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read snapshot file"));
    }
}
