//! Anti-Rug Rules
//!
//! Fixed supply, authority revocation and LP lock requirements, checked
//! against both the declared policy and the observed authority snapshot.

use super::types::*;
use super::Category;
use serde::{Deserialize, Serialize};

/// Minimum LP lock accepted, in days
pub const MIN_LP_LOCK_DAYS: i64 = 7;

/// Validate anti-rug configuration
pub fn validate_anti_rug_config(config: &AntiRugConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if !config.fixed_supply {
        result.add_violation("Fixed supply must be enabled for anti-rug protection");
    }

    if !config.revoke_mint_authority {
        result.add_violation("Mint authority must be revoked for anti-rug protection");
    }

    if !config.revoke_freeze_authority {
        result.add_violation("Freeze authority must be revoked for anti-rug protection");
    }

    if let Some(duration) = config.lp_lock_duration {
        if duration < MIN_LP_LOCK_DAYS * SECONDS_PER_DAY {
            result.add_violation("LP lock duration should be at least 7 days");
        }
    }

    result
}

/// Observed revocation state of a token's authorities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityStatus {
    pub mint_revoked: bool,
    pub freeze_revoked: bool,
    pub violations: Vec<String>,
}

/// Check that the snapshot shows both authorities revoked
pub fn verify_authorities(authorities: &TokenAuthorities) -> AuthorityStatus {
    let mut violations = Vec::new();

    if let Some(mint) = &authorities.mint_authority {
        violations.push(format!("Mint authority not revoked: {}", mint));
    }
    if let Some(freeze) = &authorities.freeze_authority {
        violations.push(format!("Freeze authority not revoked: {}", freeze));
    }

    AuthorityStatus {
        mint_revoked: authorities.mint_authority.is_none(),
        freeze_revoked: authorities.freeze_authority.is_none(),
        violations,
    }
}

/// Whether an LP lock lasts at least `min_days`. A missing lock never does.
pub fn is_lp_lock_sufficient(lock_duration: Option<i64>, min_days: i64) -> bool {
    lock_duration.map_or(false, |d| d >= min_days * SECONDS_PER_DAY)
}

/// Build the anti-rug checklist
///
/// Both LP checks are always present and both fail when no lock is configured.
pub fn verify_anti_rug(config: &AntiRugConfig, authorities: &TokenAuthorities) -> CategoryResult {
    let mut checks = Vec::with_capacity(8);

    checks.push(VerificationCheck::new(
        "Fixed Supply",
        config.fixed_supply,
        if config.fixed_supply {
            "Supply is fixed"
        } else {
            "Supply is not fixed"
        },
    ));

    checks.push(VerificationCheck::new(
        "Mint Authority Revocation Required",
        config.revoke_mint_authority,
        if config.revoke_mint_authority {
            "Mint authority revocation required"
        } else {
            "Mint authority not required to be revoked"
        },
    ));

    checks.push(VerificationCheck::new(
        "Freeze Authority Revocation Required",
        config.revoke_freeze_authority,
        if config.revoke_freeze_authority {
            "Freeze authority revocation required"
        } else {
            "Freeze authority not required to be revoked"
        },
    ));

    let status = verify_authorities(authorities);

    checks.push(VerificationCheck::new(
        "Mint Authority Actually Revoked",
        status.mint_revoked,
        if status.mint_revoked {
            "Mint authority is null"
        } else {
            "Mint authority still exists"
        },
    ));

    checks.push(VerificationCheck::new(
        "Freeze Authority Actually Revoked",
        status.freeze_revoked,
        if status.freeze_revoked {
            "Freeze authority is null"
        } else {
            "Freeze authority still exists"
        },
    ));

    let sufficient = is_lp_lock_sufficient(config.lp_lock_duration, MIN_LP_LOCK_DAYS);
    match config.lp_lock_duration {
        Some(duration) => {
            checks.push(VerificationCheck::new(
                "LP Lock Configured",
                true,
                format!(
                    "LP lock duration: {} days",
                    duration as f64 / SECONDS_PER_DAY as f64
                ),
            ));
            checks.push(VerificationCheck::new(
                "LP Lock Sufficient Duration",
                sufficient,
                if sufficient {
                    "LP lock duration is sufficient (>=7 days)"
                } else {
                    "LP lock duration is too short"
                },
            ));
        }
        None => {
            checks.push(VerificationCheck::new(
                "LP Lock Configured",
                false,
                "No LP lock configured",
            ));
            checks.push(VerificationCheck::new(
                "LP Lock Sufficient Duration",
                false,
                "LP lock duration is too short",
            ));
        }
    }

    checks.push(VerificationCheck::new(
        "Authorities Verified On-Chain",
        authorities.verified,
        if authorities.verified {
            format!("Verified at {}", authorities.checked_at.to_rfc3339())
        } else {
            "Authorities not yet verified on-chain".to_string()
        },
    ));

    Category::AntiRug.conclude(checks)
}
