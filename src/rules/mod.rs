//! Launch Rules Engine
//!
//! Evaluates a launch configuration and its observed purchases against the
//! anti-snipe, anti-bundle and anti-rug policies and produces a
//! [`VerificationReport`].
//!
//! # Components
//! - Config validators: structural sanity of each policy block
//! - Pattern analyzers: bundle detection, wallet concentration, purchase limits
//! - Category verifiers: named checklists with a PASS/WARN/FAIL status
//! - Report aggregator: most-restrictive-wins overall verdict
//!
//! Every function here is pure. Callers fetch inputs and persist outputs.
//!
//! # Example
//! ```
//! use chrono::Utc;
//! use launch_guard::rules::{generate_verification_report, LaunchConfig, TokenAuthorities};
//!
//! let config = LaunchConfig::default();
//! let authorities = TokenAuthorities {
//!     mint_authority: None,
//!     freeze_authority: None,
//!     verified: true,
//!     checked_at: Utc::now(),
//! };
//! let report = generate_verification_report("launch-1", &config, &[], &authorities, "verifier")
//!     .expect("inputs are well formed");
//! println!("{}", report.overall_status);
//! ```

pub mod anti_bundle;
pub mod anti_rug;
pub mod anti_snipe;
pub mod error;
pub mod stats;
pub mod types;
pub mod verifier;

pub use anti_bundle::{
    calculate_wallet_concentration, detect_bundled_transactions, validate_anti_bundle_config,
    verify_anti_bundle, DEFAULT_BUNDLE_WINDOW_MS,
};
pub use anti_rug::{
    is_lp_lock_sufficient, validate_anti_rug_config, verify_anti_rug, verify_authorities,
    AuthorityStatus, MIN_LP_LOCK_DAYS,
};
pub use anti_snipe::{check_purchase_limit, validate_anti_snipe_config, verify_anti_snipe};
pub use error::{RulesError, RulesResult};
pub use stats::calculate_launch_stats;
pub use types::*;
pub use verifier::{
    generate_verification_report, generate_verification_report_at, meets_minimum_standards,
    validate_usd1_config,
};

use serde::{Deserialize, Serialize};

/// The three fixed policy categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    AntiSnipe,
    AntiBundle,
    AntiRug,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::AntiSnipe, Self::AntiBundle, Self::AntiRug];

    /// Minimum passed/total ratio that still earns a WARN instead of a FAIL
    pub fn warn_ratio(&self) -> f64 {
        match self {
            Self::AntiSnipe => 0.6,
            Self::AntiBundle => 0.6,
            // Rug protection is held to a stricter bar
            Self::AntiRug => 0.7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AntiSnipe => "anti-snipe",
            Self::AntiBundle => "anti-bundle",
            Self::AntiRug => "anti-rug",
        }
    }

    /// Derives the category status from its checklist
    pub fn classify(&self, checks: &[VerificationCheck]) -> VerificationStatus {
        let total = checks.len();
        let passed = checks.iter().filter(|c| c.passed).count();

        if passed == total {
            VerificationStatus::Pass
        } else if passed as f64 >= total as f64 * self.warn_ratio() {
            VerificationStatus::Warn
        } else {
            VerificationStatus::Fail
        }
    }

    /// Wraps a finished checklist into a [`CategoryResult`]
    pub fn conclude(&self, checks: Vec<VerificationCheck>) -> CategoryResult {
        let status = self.classify(&checks);
        tracing::debug!(
            "{} checklist: {}/{} passed -> {}",
            self.name(),
            checks.iter().filter(|c| c.passed).count(),
            checks.len(),
            status
        );
        CategoryResult { status, checks }
    }
}

/// Most restrictive of the given statuses; PASS for an empty set
pub fn most_restrictive<I>(statuses: I) -> VerificationStatus
where
    I: IntoIterator<Item = VerificationStatus>,
{
    statuses
        .into_iter()
        .max()
        .unwrap_or(VerificationStatus::Pass)
}
