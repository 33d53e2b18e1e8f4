//! Precondition failures of the rules engine

use thiserror::Error;

/// Input the engine refuses to evaluate.
///
/// Rule violations are never errors; they are reported as failed checks or
/// violation strings. These variants cover malformed input only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RulesError {
    #[error("Invalid total supply: {0} (must be a positive finite number)")]
    InvalidTotalSupply(f64),

    #[error("Invalid purchase amount {amount} from wallet {wallet} in tx {tx_signature}")]
    InvalidPurchaseAmount {
        wallet: String,
        tx_signature: String,
        amount: f64,
    },

    #[error("Launch id must not be empty")]
    EmptyLaunchId,

    #[error("Verifying authority must not be empty")]
    EmptyVerifier,

    #[error("Purchase {tx_signature} belongs to launch {found}, expected {expected}")]
    ForeignPurchase {
        tx_signature: String,
        expected: String,
        found: String,
    },
}

pub type RulesResult<T> = std::result::Result<T, RulesError>;

/// Rejects a supply that would turn percentages into NaN or infinity
pub(crate) fn ensure_positive_supply(total_supply: f64) -> RulesResult<()> {
    if total_supply.is_finite() && total_supply > 0.0 {
        Ok(())
    } else {
        Err(RulesError::InvalidTotalSupply(total_supply))
    }
}
