//! Anti-Bundle Rules
//!
//! Detects purchases bundled into one transaction or coordinated in time, and
//! measures how much of the supply each wallet holds.
//!
//! # Detection modes
//! - Same transaction: one signature carrying several purchases
//! - Coordinated timing: consecutive purchases from different wallets landing
//!   within the time window
//!
//! Both modes run independently and their results are concatenated, so one
//! pair of wallets may be reported twice. Each bundle carries its
//! [`BundleKind`] for consumers that want to deduplicate.

use super::anti_snipe::wallet_totals;
use super::error::{ensure_positive_supply, RulesResult};
use super::types::*;
use super::Category;
use std::collections::HashMap;
use tracing::debug;

/// Default coordination window between consecutive purchases (milliseconds)
pub const DEFAULT_BUNDLE_WINDOW_MS: u64 = 5000;

/// Concentration ceiling the verifier accepts as reasonable (percent)
pub const MAX_REASONABLE_CONCENTRATION: f64 = 15.0;

/// Validate anti-bundle configuration
pub fn validate_anti_bundle_config(config: &AntiBundleConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if !(0.0..=100.0).contains(&config.max_wallet_concentration) {
        result.add_violation("Max wallet concentration must be between 0 and 100");
    }

    result
}

/// Detect bundled purchases.
///
/// `time_window_ms` is an exclusive bound: purchases exactly one window apart
/// are not coordinated.
pub fn detect_bundled_transactions(
    purchases: &[UserPurchase],
    time_window_ms: u64,
) -> Vec<DetectedBundle> {
    let mut bundles = Vec::new();

    // Group by signature, keeping first-appearance order
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&UserPurchase>> = Vec::new();
    for p in purchases {
        match index.get(p.tx_signature.as_str()) {
            Some(&i) => groups[i].push(p),
            None => {
                index.insert(p.tx_signature.as_str(), groups.len());
                groups.push(vec![p]);
            }
        }
    }

    for group in groups.iter().filter(|g| g.len() > 1) {
        bundles.push(DetectedBundle {
            kind: BundleKind::SameTransaction,
            wallets: group.iter().map(|p| p.wallet.clone()).collect(),
        });
    }

    // Stable sort keeps input order for equal timestamps
    let mut sorted: Vec<&UserPurchase> = purchases.iter().collect();
    sorted.sort_by_key(|p| p.timestamp);

    let window = i64::try_from(time_window_ms).unwrap_or(i64::MAX);
    for pair in sorted.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        let gap_ms = (second.timestamp - first.timestamp).num_milliseconds();

        if gap_ms < window && first.wallet != second.wallet {
            bundles.push(DetectedBundle {
                kind: BundleKind::CoordinatedTiming,
                wallets: vec![first.wallet.clone(), second.wallet.clone()],
            });
        }
    }

    debug!(
        "Detected {} bundles across {} purchases",
        bundles.len(),
        purchases.len()
    );
    bundles
}

/// Share of total supply bought by each wallet, in percent.
///
/// Wallets without purchases are absent from the map.
pub fn calculate_wallet_concentration(
    purchases: &[UserPurchase],
    total_supply: f64,
) -> RulesResult<HashMap<String, f64>> {
    ensure_positive_supply(total_supply)?;

    Ok(wallet_totals(purchases)
        .into_iter()
        .map(|(wallet, amount)| (wallet.to_string(), amount / total_supply * 100.0))
        .collect())
}

/// Build the anti-bundle checklist
pub fn verify_anti_bundle(
    config: &AntiBundleConfig,
    purchases: &[UserPurchase],
    total_supply: f64,
) -> CategoryResult {
    let mut checks = Vec::with_capacity(5);

    checks.push(VerificationCheck::new(
        "Bundle Detection Enabled",
        config.detect_bundles,
        if config.detect_bundles {
            "Bundle detection is active"
        } else {
            "Bundle detection is not enabled"
        },
    ));

    checks.push(VerificationCheck::new(
        "One Action Per Transaction",
        config.one_action_per_tx,
        if config.one_action_per_tx {
            "Single action per transaction enforced"
        } else {
            "Multiple actions per transaction allowed"
        },
    ));

    checks.push(VerificationCheck::new(
        "Reasonable Concentration Limit",
        config.max_wallet_concentration <= MAX_REASONABLE_CONCENTRATION,
        format!("Max wallet concentration: {}%", config.max_wallet_concentration),
    ));

    if !purchases.is_empty() {
        let bundles = detect_bundled_transactions(purchases, DEFAULT_BUNDLE_WINDOW_MS);
        checks.push(VerificationCheck::new(
            "No Bundle Violations",
            bundles.is_empty(),
            if bundles.is_empty() {
                "No bundled transactions detected".to_string()
            } else {
                format!("{} bundles detected", bundles.len())
            },
        ));

        let concentration_check = match calculate_wallet_concentration(purchases, total_supply) {
            Ok(concentrations) => {
                let over_limit = concentrations
                    .values()
                    .filter(|pct| **pct > config.max_wallet_concentration)
                    .count();
                VerificationCheck::new(
                    "Concentration Limits Respected",
                    over_limit == 0,
                    if over_limit == 0 {
                        "All wallets within concentration limits".to_string()
                    } else {
                        format!("{} wallets exceed concentration limit", over_limit)
                    },
                )
            }
            Err(e) => VerificationCheck::new("Concentration Limits Respected", false, e.to_string()),
        };
        checks.push(concentration_check);
    }

    Category::AntiBundle.conclude(checks)
}
