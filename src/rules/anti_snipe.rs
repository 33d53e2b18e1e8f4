//! Anti-Snipe Rules
//!
//! Per-wallet buy caps, phased unlock and fair-launch pacing.

use super::types::*;
use super::Category;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Buy limits at or above this are treated as no limit at all
pub const MAX_REASONABLE_BUY_LIMIT: f64 = 10_000_000.0;

/// Shortest unlock period accepted for phased unlock (seconds)
pub const MIN_UNLOCK_DURATION: i64 = 60;

/// Fair-launch delay needed to pass the verifier check (seconds)
pub const MIN_FAIR_LAUNCH_DELAY: i64 = 300;

/// Validate anti-snipe configuration
pub fn validate_anti_snipe_config(config: &AntiSnipeConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    // `!(x > 0)` also rejects NaN
    if !(config.max_buy_per_wallet > 0.0) {
        result.add_violation("Max buy per wallet must be positive");
    }

    if config.phased_unlock && config.unlock_duration.is_none() {
        result.add_violation("Phased unlock requires unlock duration");
    }

    if let Some(duration) = config.unlock_duration {
        if duration < MIN_UNLOCK_DURATION {
            result.add_violation("Unlock duration must be at least 60 seconds");
        }
    }

    if let Some(delay) = config.fair_launch_delay {
        if delay < 0 {
            result.add_violation("Fair launch delay cannot be negative");
        }
    }

    result
}

/// Check whether a purchase respects the wallet cap and the fair-launch delay.
///
/// The cap is inclusive: a purchase bringing the wallet exactly to
/// `max_buy_per_wallet` is allowed. The delay gate only applies when the
/// trading start time is known and the config sets a delay.
pub fn check_purchase_limit(
    purchase: &UserPurchase,
    existing_purchases: &[UserPurchase],
    config: &AntiSnipeConfig,
    trading_enabled_at: Option<DateTime<Utc>>,
    current_time: DateTime<Utc>,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    let total_purchased: f64 = existing_purchases
        .iter()
        .filter(|p| p.wallet == purchase.wallet)
        .map(|p| p.amount)
        .sum();

    let new_total = total_purchased + purchase.amount;

    if new_total > config.max_buy_per_wallet {
        result.add_violation(format!(
            "Purchase would exceed max buy limit. Current: {}, Attempting: {}, Limit: {}",
            total_purchased, purchase.amount, config.max_buy_per_wallet
        ));
    }

    if let (Some(opened_at), Some(delay)) = (trading_enabled_at, config.fair_launch_delay) {
        // Compare in seconds so an oversized delay cannot overflow a timestamp
        let elapsed = (current_time - opened_at).num_seconds();
        let remaining = delay.max(0).saturating_sub(elapsed);
        if remaining > 0 {
            result.add_violation(format!(
                "Fair launch delay not elapsed: {}s remaining",
                remaining
            ));
        }
    }

    if !result.is_valid() {
        debug!(
            "Purchase {} from {} rejected: {:?}",
            purchase.tx_signature, purchase.wallet, result.violations
        );
    }

    result
}

/// Sum purchased amounts per wallet
pub(crate) fn wallet_totals(purchases: &[UserPurchase]) -> HashMap<&str, f64> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for p in purchases {
        *totals.entry(p.wallet.as_str()).or_insert(0.0) += p.amount;
    }
    totals
}

/// Build the anti-snipe checklist
///
/// "Phased Unlock Configured" is always present and passes when phased unlock is off,
/// so the status ratio does not shift with that setting.
pub fn verify_anti_snipe(config: &AntiSnipeConfig, purchases: &[UserPurchase]) -> CategoryResult {
    let mut checks = Vec::with_capacity(4);

    let reasonable_limit =
        config.max_buy_per_wallet > 0.0 && config.max_buy_per_wallet < MAX_REASONABLE_BUY_LIMIT;
    checks.push(VerificationCheck::new(
        "Reasonable Buy Limit",
        reasonable_limit,
        if reasonable_limit {
            format!("Max buy per wallet: {}", config.max_buy_per_wallet)
        } else {
            "Buy limit is not within reasonable range".to_string()
        },
    ));

    if config.phased_unlock {
        let valid_unlock = config
            .unlock_duration
            .map_or(false, |d| d >= MIN_UNLOCK_DURATION);
        checks.push(VerificationCheck::new(
            "Phased Unlock Configured",
            valid_unlock,
            match (valid_unlock, config.unlock_duration) {
                (true, Some(d)) => format!("Unlock duration: {}s", d),
                _ => "Phased unlock improperly configured".to_string(),
            },
        ));
    } else {
        checks.push(VerificationCheck::new(
            "Phased Unlock Configured",
            true,
            "Phased unlock not used",
        ));
    }

    let fair_delay = config
        .fair_launch_delay
        .filter(|d| *d >= MIN_FAIR_LAUNCH_DELAY);
    checks.push(VerificationCheck::new(
        "Fair Launch Delay",
        fair_delay.is_some(),
        match fair_delay {
            Some(d) => format!("Fair launch delay: {}s", d),
            None => "No or insufficient fair launch delay".to_string(),
        },
    ));

    // Activity checks are skipped until there is activity
    if !purchases.is_empty() {
        let violating_wallets = wallet_totals(purchases)
            .values()
            .filter(|total| **total > config.max_buy_per_wallet)
            .count();

        checks.push(VerificationCheck::new(
            "No Limit Violations",
            violating_wallets == 0,
            if violating_wallets == 0 {
                "All purchases within limits".to_string()
            } else {
                format!("{} wallets exceeded limits", violating_wallets)
            },
        ));
    }

    Category::AntiSnipe.conclude(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn purchase(wallet: &str, amount: f64, sig: &str) -> UserPurchase {
        UserPurchase {
            wallet: wallet.to_string(),
            launch_id: "launch1".to_string(),
            amount,
            timestamp: Utc::now(),
            tx_signature: sig.to_string(),
        }
    }

    fn base_config() -> AntiSnipeConfig {
        AntiSnipeConfig {
            max_buy_per_wallet: 1_000_000.0,
            phased_unlock: false,
            unlock_duration: None,
            fair_launch_delay: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = AntiSnipeConfig {
            max_buy_per_wallet: 1_000_000.0,
            phased_unlock: true,
            unlock_duration: Some(300),
            fair_launch_delay: Some(600),
        };
        let result = validate_anti_snipe_config(&config);
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_negative_max_buy() {
        let config = AntiSnipeConfig {
            max_buy_per_wallet: -100.0,
            ..base_config()
        };
        let result = validate_anti_snipe_config(&config);
        assert!(!result.valid);
        assert_eq!(result.violations, vec!["Max buy per wallet must be positive"]);
    }

    #[test]
    fn test_phased_unlock_requires_duration() {
        let config = AntiSnipeConfig {
            phased_unlock: true,
            ..base_config()
        };
        let result = validate_anti_snipe_config(&config);
        assert_eq!(result.violations, vec!["Phased unlock requires unlock duration"]);
    }

    #[test]
    fn test_short_unlock_and_negative_delay_accumulate() {
        let config = AntiSnipeConfig {
            max_buy_per_wallet: 0.0,
            phased_unlock: true,
            unlock_duration: Some(30),
            fair_launch_delay: Some(-1),
        };
        let result = validate_anti_snipe_config(&config);
        assert_eq!(
            result.violations,
            vec![
                "Max buy per wallet must be positive",
                "Unlock duration must be at least 60 seconds",
                "Fair launch delay cannot be negative",
            ]
        );
    }

    #[test]
    fn test_purchase_within_limit() {
        let result = check_purchase_limit(
            &purchase("wallet1", 500_000.0, "sig1"),
            &[],
            &base_config(),
            None,
            Utc::now(),
        );
        assert!(result.valid);
    }

    #[test]
    fn test_purchase_exceeding_limit() {
        let existing = vec![purchase("wallet1", 800_000.0, "sig1")];
        let result = check_purchase_limit(
            &purchase("wallet1", 300_000.0, "sig2"),
            &existing,
            &base_config(),
            None,
            Utc::now(),
        );
        assert!(!result.valid);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].contains("Current: 800000"));
        assert!(result.violations[0].contains("Attempting: 300000"));
        assert!(result.violations[0].contains("Limit: 1000000"));
    }

    #[test]
    fn test_purchase_limit_boundary_inclusive() {
        let existing = vec![purchase("wallet1", 600_000.0, "sig1")];
        let result = check_purchase_limit(
            &purchase("wallet1", 400_000.0, "sig2"),
            &existing,
            &base_config(),
            None,
            Utc::now(),
        );
        assert!(result.valid);
    }

    #[test]
    fn test_other_wallets_do_not_count() {
        let existing = vec![purchase("wallet2", 900_000.0, "sig1")];
        let result = check_purchase_limit(
            &purchase("wallet1", 900_000.0, "sig2"),
            &existing,
            &base_config(),
            None,
            Utc::now(),
        );
        assert!(result.valid);
    }

    #[test]
    fn test_fair_launch_delay_gate() {
        let opened = Utc::now();
        let config = AntiSnipeConfig {
            fair_launch_delay: Some(300),
            ..base_config()
        };
        let p = purchase("wallet1", 10.0, "sig1");

        let early = check_purchase_limit(&p, &[], &config, Some(opened), opened + Duration::seconds(100));
        assert!(!early.valid);
        assert_eq!(early.violations, vec!["Fair launch delay not elapsed: 200s remaining"]);

        let on_time = check_purchase_limit(&p, &[], &config, Some(opened), opened + Duration::seconds(300));
        assert!(on_time.valid);

        // Unknown trading start: gate not applied
        let unknown = check_purchase_limit(&p, &[], &config, None, opened);
        assert!(unknown.valid);
    }

    #[test]
    fn test_huge_fair_launch_delay_stays_gated() {
        let opened = Utc::now();
        let config = AntiSnipeConfig {
            fair_launch_delay: Some(10_000_000_000_000),
            ..base_config()
        };
        assert!(validate_anti_snipe_config(&config).valid);

        let p = purchase("wallet1", 10.0, "sig1");
        let result = check_purchase_limit(&p, &[], &config, Some(opened), opened);
        assert_eq!(
            result.violations,
            vec!["Fair launch delay not elapsed: 10000000000000s remaining"]
        );

        let result = check_purchase_limit(&p, &[], &config, Some(opened), opened + Duration::days(365));
        assert!(!result.valid);
    }

    #[test]
    fn test_verify_without_purchases_skips_activity_check() {
        let result = verify_anti_snipe(&base_config(), &[]);
        assert_eq!(result.checks.len(), 3);
        assert!(result.check("No Limit Violations").is_none());
    }

    #[test]
    fn test_verify_counts_violating_wallets() {
        let config = AntiSnipeConfig {
            max_buy_per_wallet: 100.0,
            fair_launch_delay: Some(300),
            ..base_config()
        };
        let purchases = vec![
            purchase("a", 60.0, "s1"),
            purchase("a", 60.0, "s2"),
            purchase("b", 150.0, "s3"),
            purchase("c", 100.0, "s4"),
        ];
        let result = verify_anti_snipe(&config, &purchases);
        let check = result.check("No Limit Violations").unwrap();
        assert!(!check.passed);
        assert_eq!(check.message, "2 wallets exceeded limits");
        // 3/4 passed
        assert_eq!(result.status, VerificationStatus::Warn);
    }

    #[test]
    fn test_improper_phased_unlock_fails_check() {
        let config = AntiSnipeConfig {
            phased_unlock: true,
            unlock_duration: Some(10),
            fair_launch_delay: Some(300),
            ..base_config()
        };
        let result = verify_anti_snipe(&config, &[]);
        let check = result.check("Phased Unlock Configured").unwrap();
        assert!(!check.passed);
        assert_eq!(check.message, "Phased unlock improperly configured");
    }
}
