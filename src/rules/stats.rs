//! Launch Statistics
//!
//! Participant, volume and holder-distribution summary of a launch.
//!
//! ## Metrics
//! - Unique participants, total and average purchase
//! - Top holder share of total supply
//! - Gini coefficient of per-wallet holdings
//! - Wallet count per share-of-supply bucket

use super::anti_snipe::wallet_totals;
use super::error::{ensure_positive_supply, RulesResult};
use super::types::*;

/// Share-of-supply bucket edges (percent) and their labels
const DISTRIBUTION_BUCKETS: &[(f64, &str)] = &[
    (0.1, "<0.1%"),
    (1.0, "0.1-1%"),
    (5.0, "1-5%"),
    (f64::INFINITY, ">=5%"),
];

/// Summarize purchases against the launch supply
pub fn calculate_launch_stats(
    purchases: &[UserPurchase],
    total_supply: f64,
) -> RulesResult<LaunchStats> {
    ensure_positive_supply(total_supply)?;

    let totals = wallet_totals(purchases);
    let total_volume: f64 = purchases.iter().map(|p| p.amount).sum();
    let average_purchase = if purchases.is_empty() {
        0.0
    } else {
        total_volume / purchases.len() as f64
    };

    let mut holdings: Vec<f64> = totals.values().copied().collect();
    holdings.sort_by(|a, b| a.total_cmp(b));

    let top_holder = holdings.last().copied().unwrap_or(0.0);
    let top_holder_percentage = top_holder / total_supply * 100.0;

    let mut distribution: Vec<DistributionBucket> = DISTRIBUTION_BUCKETS
        .iter()
        .map(|(_, label)| DistributionBucket {
            range: label.to_string(),
            count: 0,
        })
        .collect();
    for amount in &holdings {
        let pct = amount / total_supply * 100.0;
        if let Some(i) = DISTRIBUTION_BUCKETS.iter().position(|(edge, _)| pct < *edge) {
            distribution[i].count += 1;
        }
    }

    Ok(LaunchStats {
        total_participants: totals.len(),
        total_volume,
        average_purchase,
        top_holder_percentage,
        gini_coefficient: gini_coefficient(&holdings),
        distribution,
    })
}

/// Gini coefficient of ascending-sorted holdings.
///
/// 0 = every holder has the same amount, 1 = one holder has everything.
/// No holders (or nothing held) counts as equal.
fn gini_coefficient(sorted_holdings: &[f64]) -> f64 {
    let held: f64 = sorted_holdings.iter().sum();
    if sorted_holdings.is_empty() || held <= 0.0 {
        return 0.0;
    }

    let n = sorted_holdings.len() as f64;
    let sum_of_products: f64 = sorted_holdings
        .iter()
        .enumerate()
        .map(|(i, amount)| (2.0 * (i as f64 + 1.0) - n - 1.0) * amount)
        .sum();

    (sum_of_products / (n * held)).abs().min(1.0)
}
