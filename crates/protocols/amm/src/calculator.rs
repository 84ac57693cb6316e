//! AMM Calculator
//!
//! Pool valuation math: numeraire liquidity from balances and assimilator
//! rates, pool weights, and the farm valuation summary.

use std::collections::HashMap;

use halo_core::{units, Address, RawAmount};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::constants::{EMPTY_POOL_WEIGHT, LP_DECIMALS, RATE_DECIMALS};
use crate::state::{Pool, ValuationSummary};

fn pow10(exp: u8) -> BigUint {
    BigUint::from(10u32).pow(exp as u32)
}

/// Numeraire value of a raw token balance, in 18-decimal units
///
/// Formula: numeraire = balance * rate * 10^18 / (10^8 * 10^decimals)
pub fn token_numeraire(balance: RawAmount, decimals: u8, rate: RawAmount) -> BigUint {
    BigUint::from(balance) * BigUint::from(rate) * pow10(LP_DECIMALS)
        / (pow10(RATE_DECIMALS) * pow10(decimals))
}

/// Liquidity and per-token weights of a pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolComposition {
    /// Sum of token numeraires (18 decimals)
    pub total_liquidity: RawAmount,
    /// Share of each token in pool order
    pub weights: Vec<f64>,
}

/// Compose a pool from `(balance, decimals, rate)` sides in pool order
///
/// An empty pool gets an equal split.
pub fn compose_pool(sides: &[(RawAmount, u8, RawAmount)]) -> PoolComposition {
    let numeraires: Vec<BigUint> = sides
        .iter()
        .map(|(balance, decimals, rate)| token_numeraire(*balance, *decimals, *rate))
        .collect();
    let total: BigUint = numeraires.iter().sum();

    let weights = if total.is_zero() {
        let equal = if sides.len() == 2 {
            EMPTY_POOL_WEIGHT
        } else {
            1.0 / sides.len().max(1) as f64
        };
        vec![equal; sides.len()]
    } else {
        let total_f = total.to_f64().unwrap_or(f64::MAX);
        numeraires
            .iter()
            .map(|n| n.to_f64().unwrap_or(0.0) / total_f)
            .collect()
    };

    PoolComposition {
        total_liquidity: total.to_u128().unwrap_or(RawAmount::MAX),
        weights,
    }
}

// =============================================================================
// Valuation summary
// =============================================================================

/// Aggregate USD figures before formatting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValuationTotals {
    pub stakeable_value: f64,
    pub staked_value: f64,
    pub rewards_earned: f64,
}

/// Price of one ownership unit: liquidity / supply, or 0 without supply
pub fn unit_price(pool: &Pool) -> f64 {
    let supply = units::to_f64(pool.total_supply, LP_DECIMALS);
    if supply > 0.0 {
        pool.liquidity_usd() / supply
    } else {
        0.0
    }
}

/// Sum stakeable value, staked value and earned rewards across pools
///
/// `rewards_earned` and `staked_amounts` are keyed by pool address and given
/// in display units. Pools missing from either map contribute nothing to it.
pub fn compute_valuation_totals(
    pools: &[Pool],
    rewards_earned: &HashMap<Address, f64>,
    staked_amounts: &HashMap<Address, f64>,
    rewards_token_price: f64,
) -> ValuationTotals {
    let mut totals = ValuationTotals::default();

    for pool in pools {
        if let Some(earned) = rewards_earned.get(&pool.address) {
            totals.rewards_earned += earned * rewards_token_price;
        }

        let price = unit_price(pool);
        let held = units::to_f64(pool.user.held, LP_DECIMALS);
        totals.stakeable_value += held * price;

        if let Some(staked) = staked_amounts.get(&pool.address) {
            totals.staked_value += staked * price;
        }
    }

    totals
}

/// Display-ready valuation summary; sentinels when `pools` is empty
pub fn compute_valuation_summary(
    pools: &[Pool],
    rewards_earned: &HashMap<Address, f64>,
    staked_amounts: &HashMap<Address, f64>,
    rewards_token_price: f64,
) -> ValuationSummary {
    if pools.is_empty() {
        return ValuationSummary::empty();
    }

    let totals = compute_valuation_totals(pools, rewards_earned, staked_amounts, rewards_token_price);
    ValuationSummary {
        stakeable_value: units::format_usd(totals.stakeable_value),
        staked_value: units::format_usd(totals.staked_value),
        rewards_earned: units::format_number(totals.rewards_earned),
    }
}
