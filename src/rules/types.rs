//! Value types shared by the validators, analyzers and verifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recommended maximum buy per wallet (tokens)
pub const DEFAULT_MAX_BUY_PER_WALLET: f64 = 1_000_000.0;

/// Recommended maximum wallet concentration (percent of supply)
pub const DEFAULT_MAX_WALLET_CONCENTRATION: f64 = 10.0;

/// Recommended LP lock duration (30 days, seconds)
pub const DEFAULT_LP_LOCK_DURATION: i64 = 30 * SECONDS_PER_DAY;

/// Recommended delay between trading enablement and open buying (seconds)
pub const DEFAULT_FAIR_LAUNCH_DELAY: i64 = 300;

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Complete policy configuration for one launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Token mint address
    #[serde(default)]
    pub token_mint: String,
    /// Launch creator wallet
    #[serde(default)]
    pub creator: String,
    pub anti_snipe: AntiSnipeConfig,
    pub anti_bundle: AntiBundleConfig,
    pub anti_rug: AntiRugConfig,
    pub usd1_config: Usd1LaunchConfig,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            token_mint: String::new(),
            creator: String::new(),
            anti_snipe: AntiSnipeConfig::default(),
            anti_bundle: AntiBundleConfig::default(),
            anti_rug: AntiRugConfig::default(),
            usd1_config: Usd1LaunchConfig::default(),
        }
    }
}

/// Anti-snipe policy: per-wallet caps and launch pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiSnipeConfig {
    /// Maximum cumulative amount a single wallet may buy
    pub max_buy_per_wallet: f64,
    /// Whether buy limits unlock gradually
    pub phased_unlock: bool,
    /// Unlock duration in seconds (required when `phased_unlock`)
    #[serde(default)]
    pub unlock_duration: Option<i64>,
    /// Delay in seconds between trading enablement and open buying
    #[serde(default)]
    pub fair_launch_delay: Option<i64>,
}

impl Default for AntiSnipeConfig {
    fn default() -> Self {
        Self {
            max_buy_per_wallet: DEFAULT_MAX_BUY_PER_WALLET,
            phased_unlock: false,
            unlock_duration: None,
            fair_launch_delay: Some(DEFAULT_FAIR_LAUNCH_DELAY),
        }
    }
}

/// Anti-bundle policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiBundleConfig {
    pub detect_bundles: bool,
    /// Maximum share of supply a single wallet may hold (0-100)
    pub max_wallet_concentration: f64,
    pub one_action_per_tx: bool,
}

impl Default for AntiBundleConfig {
    fn default() -> Self {
        Self {
            detect_bundles: true,
            max_wallet_concentration: DEFAULT_MAX_WALLET_CONCENTRATION,
            one_action_per_tx: true,
        }
    }
}

/// Anti-rug policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiRugConfig {
    pub fixed_supply: bool,
    pub revoke_mint_authority: bool,
    pub revoke_freeze_authority: bool,
    /// LP lock duration in seconds
    #[serde(default)]
    pub lp_lock_duration: Option<i64>,
}

impl Default for AntiRugConfig {
    fn default() -> Self {
        Self {
            fixed_supply: true,
            revoke_mint_authority: true,
            revoke_freeze_authority: true,
            lp_lock_duration: Some(DEFAULT_LP_LOCK_DURATION),
        }
    }
}

/// Pricing and supply parameters of a USD1-denominated launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usd1LaunchConfig {
    pub initial_price: f64,
    /// Total token supply, the denominator of every concentration figure
    pub total_supply: f64,
    pub liquidity_amount: f64,
    pub creator_allocation: f64,
}

impl Default for Usd1LaunchConfig {
    fn default() -> Self {
        Self {
            initial_price: 1.0,
            total_supply: 1_000_000_000.0,
            liquidity_amount: 100_000.0,
            creator_allocation: 0.0,
        }
    }
}

/// A single observed purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPurchase {
    pub wallet: String,
    pub launch_id: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub tx_signature: String,
}

/// Snapshot of the token's mint and freeze authorities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAuthorities {
    /// `None` when revoked
    pub mint_authority: Option<String>,
    /// `None` when revoked
    pub freeze_authority: Option<String>,
    /// Whether the snapshot was confirmed against the ledger
    pub verified: bool,
    pub checked_at: DateTime<Utc>,
}

impl TokenAuthorities {
    /// Snapshot used when nothing has been read from chain yet
    pub fn unverified(checked_at: DateTime<Utc>) -> Self {
        Self {
            mint_authority: None,
            freeze_authority: None,
            verified: false,
            checked_at,
        }
    }
}

/// Verdict of a category or of a whole report.
///
/// Variants are ordered by severity, so the most restrictive of several
/// statuses is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Pass,
    Warn,
    Fail,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named assertion in a category checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

impl VerificationCheck {
    pub fn new(name: &str, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            message: message.into(),
        }
    }
}

/// Checklist and derived status for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub status: VerificationStatus,
    pub checks: Vec<VerificationCheck>,
}

impl CategoryResult {
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Looks up a check by name
    pub fn check(&self, name: &str) -> Option<&VerificationCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &VerificationCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Full verification report for one launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub launch_id: String,
    pub anti_snipe: CategoryResult,
    pub anti_bundle: CategoryResult,
    pub anti_rug: CategoryResult,
    pub overall_status: VerificationStatus,
    pub generated_at: DateTime<Utc>,
    /// Program or authority attesting the report
    pub verified_by: String,
}

/// Outcome of a config validation or a purchase check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
        }
    }

    pub fn add_violation(&mut self, violation: impl Into<String>) {
        self.valid = false;
        self.violations.push(violation.into());
    }

    /// Appends another result's violations, preserving order
    pub fn merge(&mut self, other: ValidationResult) {
        for violation in other.violations {
            self.add_violation(violation);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of the pre-launch minimum standards gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardsAssessment {
    pub meets: bool,
    pub violations: Vec<String>,
}

/// How a bundle was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BundleKind {
    /// Several purchases carried by one transaction
    SameTransaction,
    /// Purchases from different wallets landing inside the time window
    CoordinatedTiming,
}

/// A group of wallets flagged as bundled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedBundle {
    pub kind: BundleKind,
    pub wallets: Vec<String>,
}

/// Activity summary of a launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchStats {
    pub total_participants: usize,
    pub total_volume: f64,
    pub average_purchase: f64,
    /// Share of total supply held by the largest buyer (0-100)
    pub top_holder_percentage: f64,
    /// Inequality of per-wallet holdings (0 = equal, 1 = one holder)
    pub gini_coefficient: f64,
    pub distribution: Vec<DistributionBucket>,
}

/// Number of wallets whose share of supply falls in `range`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub range: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering_is_by_severity() {
        assert!(VerificationStatus::Fail > VerificationStatus::Warn);
        assert!(VerificationStatus::Warn > VerificationStatus::Pass);
        let worst = [VerificationStatus::Warn, VerificationStatus::Pass]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(worst, VerificationStatus::Warn);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&VerificationStatus::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");
        let parsed: VerificationStatus = serde_json::from_str("\"FAIL\"").unwrap();
        assert_eq!(parsed, VerificationStatus::Fail);
    }

    #[test]
    fn test_validation_result_accumulates() {
        let mut result = ValidationResult::new();
        assert!(result.is_valid());
        result.add_violation("first");
        result.add_violation("second".to_string());
        assert!(!result.is_valid());
        assert_eq!(result.violations, vec!["first", "second"]);
    }

    #[test]
    fn test_config_defaults() {
        let config = LaunchConfig::default();
        assert_eq!(config.anti_snipe.max_buy_per_wallet, 1_000_000.0);
        assert_eq!(config.anti_snipe.fair_launch_delay, Some(300));
        assert_eq!(config.anti_bundle.max_wallet_concentration, 10.0);
        assert_eq!(config.anti_rug.lp_lock_duration, Some(30 * 24 * 60 * 60));
    }

    #[test]
    fn test_config_reads_camel_case_json() {
        let json = r#"{
            "antiSnipe": {"maxBuyPerWallet": 500, "phasedUnlock": true, "unlockDuration": 120},
            "antiBundle": {"detectBundles": true, "maxWalletConcentration": 5, "oneActionPerTx": false},
            "antiRug": {"fixedSupply": true, "revokeMintAuthority": true, "revokeFreezeAuthority": false},
            "usd1Config": {"initialPrice": 0.01, "totalSupply": 1000000, "liquidityAmount": 5000, "creatorAllocation": 0}
        }"#;
        let config: LaunchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.anti_snipe.unlock_duration, Some(120));
        assert_eq!(config.anti_snipe.fair_launch_delay, None);
        assert!(!config.anti_bundle.one_action_per_tx);
        assert_eq!(config.anti_rug.lp_lock_duration, None);
        assert!(config.token_mint.is_empty());
    }
}
