//! Data Transfer Objects for API requests and responses

use amm::{Pool, PoolToken, LP_DECIMALS};
use bridge::{ApproveState, ButtonState};
use chain_client::SwapKind;
use halo_core::{units, Address};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether a chain client is attached
    pub chain_connected: bool,
}

impl HealthResponse {
    pub fn new(chain_connected: bool) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            chain_connected,
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

// =============================================================================
// Pools
// =============================================================================

/// One side of a pool, amounts as decimal strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolTokenDto {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub balance: String,
    pub weight: f64,
}

impl From<&PoolToken> for PoolTokenDto {
    fn from(t: &PoolToken) -> Self {
        Self {
            address: t.token.address.clone(),
            symbol: t.token.symbol.clone(),
            decimals: t.token.decimals,
            balance: units::format_units(t.balance, t.token.decimals),
            weight: t.weight,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDto {
    pub address: Address,
    pub name: String,
    pub vault_pool_id: String,
    pub rewards_pool_id: Option<u64>,
    pub tokens: Vec<PoolTokenDto>,
    /// USD liquidity, `$1,234.56` style
    pub liquidity: String,
    pub total_supply: String,
    pub held: String,
    pub staked: String,
    pub earned: String,
}

impl From<Pool> for PoolDto {
    fn from(pool: Pool) -> Self {
        Self {
            liquidity: units::format_usd(pool.liquidity_usd()),
            total_supply: units::format_units(pool.total_supply, LP_DECIMALS),
            held: units::format_units(pool.user.held, LP_DECIMALS),
            staked: units::format_units(pool.user.staked, LP_DECIMALS),
            earned: units::format_units(pool.user.earned, LP_DECIMALS),
            tokens: pool.tokens.iter().map(Into::into).collect(),
            vault_pool_id: pool.vault_pool_id.to_string(),
            rewards_pool_id: pool.rewards_pool_id,
            name: pool.name,
            address: pool.address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsResponse {
    pub pools: Vec<PoolDto>,
    pub count: usize,
}

/// Amount of ownership units to add or remove
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityRequest {
    pub amount: String,
}

// =============================================================================
// Swap
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount: String,
    /// Defaults to exact input
    #[serde(default = "default_swap_kind")]
    pub kind: SwapKind,
}

fn default_swap_kind() -> SwapKind {
    SwapKind::GivenIn
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedError {
    pub message: String,
}

// =============================================================================
// Bridge
// =============================================================================

/// Bridge form inputs in display units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeFormRequest {
    pub input: String,
    pub minimum: f64,
    pub allowance: f64,
    pub balance: f64,
    #[serde(default)]
    pub capped: bool,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeFormResponse {
    pub button: ButtonState,
    pub approve: ApproveState,
    pub title: String,
    pub next_enabled: bool,
}
