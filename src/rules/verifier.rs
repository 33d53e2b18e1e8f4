//! Report aggregation and pre-launch gates

use super::anti_bundle::{validate_anti_bundle_config, verify_anti_bundle};
use super::anti_rug::{validate_anti_rug_config, verify_anti_rug};
use super::anti_snipe::{validate_anti_snipe_config, verify_anti_snipe};
use super::error::{ensure_positive_supply, RulesError, RulesResult};
use super::most_restrictive;
use super::types::*;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

/// Concentration above this blocks a launch outright (percent)
pub const MAX_ACCEPTABLE_CONCENTRATION: f64 = 20.0;

/// Validate the pricing and supply block
pub fn validate_usd1_config(config: &Usd1LaunchConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    let positive = |v: f64| v.is_finite() && v > 0.0;

    if !positive(config.initial_price) {
        result.add_violation("Initial price must be positive");
    }
    if !positive(config.total_supply) {
        result.add_violation("Total supply must be positive");
    }
    if !positive(config.liquidity_amount) {
        result.add_violation("Liquidity amount must be positive");
    }
    if !(config.creator_allocation.is_finite() && config.creator_allocation >= 0.0) {
        result.add_violation("Creator allocation cannot be negative");
    }

    result
}

impl LaunchConfig {
    /// Run every config validator, in category order
    pub fn validate(&self) -> ValidationResult {
        let mut result = validate_anti_snipe_config(&self.anti_snipe);
        result.merge(validate_anti_bundle_config(&self.anti_bundle));
        result.merge(validate_anti_rug_config(&self.anti_rug));
        result.merge(validate_usd1_config(&self.usd1_config));
        result
    }
}

/// Generate a verification report stamped with the current time
pub fn generate_verification_report(
    launch_id: &str,
    config: &LaunchConfig,
    purchases: &[UserPurchase],
    authorities: &TokenAuthorities,
    verified_by: &str,
) -> RulesResult<VerificationReport> {
    generate_verification_report_at(
        launch_id,
        config,
        purchases,
        authorities,
        verified_by,
        Utc::now(),
    )
}

/// Generate a verification report stamped with `generated_at`
#[instrument(skip(config, purchases, authorities), fields(purchase_count = purchases.len()))]
pub fn generate_verification_report_at(
    launch_id: &str,
    config: &LaunchConfig,
    purchases: &[UserPurchase],
    authorities: &TokenAuthorities,
    verified_by: &str,
    generated_at: DateTime<Utc>,
) -> RulesResult<VerificationReport> {
    check_preconditions(launch_id, config, purchases, verified_by)?;

    let anti_snipe = verify_anti_snipe(&config.anti_snipe, purchases);
    let anti_bundle = verify_anti_bundle(
        &config.anti_bundle,
        purchases,
        config.usd1_config.total_supply,
    );
    let anti_rug = verify_anti_rug(&config.anti_rug, authorities);

    let overall_status =
        most_restrictive([anti_snipe.status, anti_bundle.status, anti_rug.status]);

    info!(
        "Verification for {}: snipe={}, bundle={}, rug={} -> {}",
        launch_id, anti_snipe.status, anti_bundle.status, anti_rug.status, overall_status
    );

    Ok(VerificationReport {
        launch_id: launch_id.to_string(),
        anti_snipe,
        anti_bundle,
        anti_rug,
        overall_status,
        generated_at,
        verified_by: verified_by.to_string(),
    })
}

fn check_preconditions(
    launch_id: &str,
    config: &LaunchConfig,
    purchases: &[UserPurchase],
    verified_by: &str,
) -> RulesResult<()> {
    if launch_id.trim().is_empty() {
        return Err(RulesError::EmptyLaunchId);
    }
    if verified_by.trim().is_empty() {
        return Err(RulesError::EmptyVerifier);
    }
    ensure_positive_supply(config.usd1_config.total_supply)?;

    for p in purchases {
        if !(p.amount.is_finite() && p.amount >= 0.0) {
            return Err(RulesError::InvalidPurchaseAmount {
                wallet: p.wallet.clone(),
                tx_signature: p.tx_signature.clone(),
                amount: p.amount,
            });
        }
        if p.launch_id != launch_id {
            return Err(RulesError::ForeignPurchase {
                tx_signature: p.tx_signature.clone(),
                expected: launch_id.to_string(),
                found: p.launch_id.clone(),
            });
        }
    }

    Ok(())
}

/// Config-only gate run before a launch is accepted
pub fn meets_minimum_standards(config: &LaunchConfig) -> StandardsAssessment {
    let mut violations = Vec::new();

    if !(config.anti_snipe.max_buy_per_wallet > 0.0) {
        violations.push("Must set max buy per wallet".to_string());
    }

    if !config.anti_bundle.detect_bundles {
        violations.push("Bundle detection must be enabled".to_string());
    }

    if config.anti_bundle.max_wallet_concentration > MAX_ACCEPTABLE_CONCENTRATION {
        violations.push("Max wallet concentration too high (>20%)".to_string());
    }

    if !config.anti_rug.fixed_supply {
        violations.push("CRITICAL: Fixed supply must be enabled".to_string());
    }

    if !config.anti_rug.revoke_mint_authority {
        violations.push("CRITICAL: Mint authority must be revoked".to_string());
    }

    if !config.anti_rug.revoke_freeze_authority {
        violations.push("CRITICAL: Freeze authority must be revoked".to_string());
    }

    debug!("Minimum standards: {} violations", violations.len());

    StandardsAssessment {
        meets: violations.is_empty(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorities() -> TokenAuthorities {
        TokenAuthorities {
            mint_authority: None,
            freeze_authority: None,
            verified: true,
            checked_at: Utc::now(),
        }
    }

    fn purchase(launch: &str, amount: f64) -> UserPurchase {
        UserPurchase {
            wallet: "w".to_string(),
            launch_id: launch.to_string(),
            amount,
            timestamp: Utc::now(),
            tx_signature: "sig".to_string(),
        }
    }

    #[test]
    fn test_default_config_validates() {
        assert!(LaunchConfig::default().validate().valid);
    }

    #[test]
    fn test_validate_collects_all_blocks() {
        let mut config = LaunchConfig::default();
        config.anti_snipe.max_buy_per_wallet = 0.0;
        config.anti_bundle.max_wallet_concentration = 120.0;
        config.anti_rug.fixed_supply = false;
        config.usd1_config.total_supply = 0.0;
        let result = config.validate();
        assert_eq!(
            result.violations,
            vec![
                "Max buy per wallet must be positive",
                "Max wallet concentration must be between 0 and 100",
                "Fixed supply must be enabled for anti-rug protection",
                "Total supply must be positive",
            ]
        );
    }

    #[test]
    fn test_report_stamps_metadata() {
        let at = Utc::now();
        let report = generate_verification_report_at(
            "launch1",
            &LaunchConfig::default(),
            &[],
            &authorities(),
            "Program111",
            at,
        )
        .unwrap();
        assert_eq!(report.launch_id, "launch1");
        assert_eq!(report.verified_by, "Program111");
        assert_eq!(report.generated_at, at);
        assert_eq!(report.overall_status, VerificationStatus::Pass);
    }

    #[test]
    fn test_preconditions() {
        let config = LaunchConfig::default();
        assert_eq!(
            generate_verification_report("", &config, &[], &authorities(), "p"),
            Err(RulesError::EmptyLaunchId)
        );
        assert_eq!(
            generate_verification_report("l", &config, &[], &authorities(), " "),
            Err(RulesError::EmptyVerifier)
        );

        let mut zero_supply = config.clone();
        zero_supply.usd1_config.total_supply = 0.0;
        assert_eq!(
            generate_verification_report("l", &zero_supply, &[], &authorities(), "p"),
            Err(RulesError::InvalidTotalSupply(0.0))
        );

        let negative = vec![purchase("l", -1.0)];
        assert!(matches!(
            generate_verification_report("l", &config, &negative, &authorities(), "p"),
            Err(RulesError::InvalidPurchaseAmount { .. })
        ));

        let foreign = vec![purchase("other", 1.0)];
        assert!(matches!(
            generate_verification_report("l", &config, &foreign, &authorities(), "p"),
            Err(RulesError::ForeignPurchase { .. })
        ));
    }

    #[test]
    fn test_minimum_standards() {
        assert!(meets_minimum_standards(&LaunchConfig::default()).meets);

        let mut config = LaunchConfig::default();
        config.anti_bundle.max_wallet_concentration = 25.0;
        config.anti_rug.revoke_freeze_authority = false;
        let assessment = meets_minimum_standards(&config);
        assert!(!assessment.meets);
        assert_eq!(
            assessment.violations,
            vec![
                "Max wallet concentration too high (>20%)",
                "CRITICAL: Freeze authority must be revoked",
            ]
        );
    }

    #[test]
    fn test_minimum_standards_ignore_activity_thresholds() {
        // 20% is allowed by the gate even though the verifier wants <= 15%
        let mut config = LaunchConfig::default();
        config.anti_bundle.max_wallet_concentration = 20.0;
        assert!(meets_minimum_standards(&config).meets);
    }
}
