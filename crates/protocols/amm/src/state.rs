//! AMM State Types
//!
//! Data structures for tokens, FX pools, the pool catalog, swap routes and
//! valuation summaries.

use std::collections::BTreeMap;
use std::fmt;

use chain_client::BatchSwapStep;
use halo_core::{units, Address, AmountError, ChainError, ChainId, RawAmount, VaultPoolId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::LP_DECIMALS;

/// ERC-20 token metadata. Identity is (chain id, address).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: ChainId,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

/// One side of an FX pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolToken {
    pub token: Token,
    /// Raw pool balance in token units
    pub balance: RawAmount,
    /// Assimilator rate (8 decimals)
    pub rate: RawAmount,
    /// Share of pool liquidity, 0..=1
    pub weight: f64,
}

/// Caller's ownership units in a pool (raw, 18 decimals)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPosition {
    pub held: RawAmount,
    pub staked: RawAmount,
    pub earned: RawAmount,
}

/// Snapshot of an FX pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub address: Address,
    pub vault_pool_id: VaultPoolId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards_pool_id: Option<u64>,
    /// `SYM0/SYM1`
    pub name: String,
    pub tokens: Vec<PoolToken>,
    /// Total numeraire liquidity (18 decimals)
    pub total_liquidity: RawAmount,
    /// Ownership units in circulation (18 decimals)
    pub total_supply: RawAmount,
    pub user: UserPosition,
}

impl Pool {
    /// Total liquidity as a float, for display-grade valuation
    pub fn liquidity_usd(&self) -> f64 {
        units::to_f64(self.total_liquidity, LP_DECIMALS)
    }

    pub fn token(&self, address: &Address) -> Option<&PoolToken> {
        self.tokens.iter().find(|t| &t.token.address == address)
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} | liquidity: {} | supply: {}",
            self.name,
            self.address.short(),
            units::format_number(self.liquidity_usd()),
            units::format_units(self.total_supply, LP_DECIMALS)
        )
    }
}

/// External ids of a configured pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolExternalIds {
    /// Index in the rewards contract's pool list, if the pool is farmed
    pub rewards_pool_id: Option<u64>,
    pub vault_pool_id: VaultPoolId,
}

/// Configured pools with their resolved external ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCatalog {
    pub enabled: BTreeMap<Address, PoolExternalIds>,
    pub disabled: BTreeMap<Address, PoolExternalIds>,
    pub inactive: Vec<Address>,
}

impl PoolCatalog {
    pub fn get(&self, pool: &Address) -> Option<&PoolExternalIds> {
        self.enabled.get(pool).or_else(|| self.disabled.get(pool))
    }

    pub fn is_inactive(&self, pool: &Address) -> bool {
        self.inactive.contains(pool)
    }
}

/// Constant-product pair valued through the price oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairPoolInfo {
    pub pid: u64,
    pub address: Address,
    /// `SYM0/SYM1`
    pub pair: String,
    pub tokens: Vec<PoolToken>,
    /// USD liquidity; zero-priced tokens contribute nothing
    pub liquidity: f64,
}

/// Batch-swap instructions over a sorted asset table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRoute {
    /// Involved token addresses in lexicographic order
    pub assets: Vec<Address>,
    /// Hops; indices refer to `assets`
    pub swaps: Vec<BatchSwapStep>,
    /// Shared token of a two-hop route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate: Option<Address>,
}

impl SwapRoute {
    pub fn is_multi_hop(&self) -> bool {
        self.swaps.len() > 1
    }

    /// Position of a token in the sorted asset table
    pub fn index_of(&self, token: &Address) -> Option<usize> {
        self.assets.iter().position(|a| a == token)
    }
}

/// Human-facing quote: unsigned decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPreview {
    pub amount_in: String,
    pub amount_out: String,
}

impl SwapPreview {
    pub fn zero() -> Self {
        Self {
            amount_in: "0".to_string(),
            amount_out: "0".to_string(),
        }
    }
}

/// `viewDeposit` estimate in display units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityEstimate {
    pub ownership_units: String,
    /// Per-token amounts in pool order
    pub token_amounts: Vec<String>,
}

/// Aggregate farm figures as display strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub stakeable_value: String,
    pub staked_value: String,
    pub rewards_earned: String,
}

impl ValuationSummary {
    /// Sentinels shown when there are no pools
    pub fn empty() -> Self {
        Self {
            stakeable_value: "$ --".to_string(),
            staked_value: "$ --".to_string(),
            rewards_earned: "--".to_string(),
        }
    }
}

/// AMM protocol errors
#[derive(Debug, Error)]
pub enum AmmError {
    #[error("No swap route from {token_in} to {token_out}")]
    NoRoute { token_in: Address, token_out: Address },

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Token not found: {0}")]
    TokenNotFound(String),
}

impl AmmError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoRoute { .. } => "no_route",
            Self::Chain(e) => e.error_code(),
            Self::InvalidAmount(_) => "invalid_amount",
            Self::PoolNotFound(_) => "pool_not_found",
            Self::TokenNotFound(_) => "token_not_found",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoRoute { .. } | Self::InvalidAmount(_) => 400,
            Self::Chain(e) => e.status_code(),
            Self::PoolNotFound(_) | Self::TokenNotFound(_) => 404,
        }
    }
}
