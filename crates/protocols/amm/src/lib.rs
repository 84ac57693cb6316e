//! Halo FX AMM
//!
//! This crate implements the pool registry, valuation math and batch-swap
//! routing for FX pools settled through a Balancer-style vault, plus
//! liquidity provision and friendly error messages for failed transactions.

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod liquidity;
pub mod messages;
pub mod router;
pub mod state;
pub mod swap;

// Re-exports
pub use calculator::{
    compose_pool, compute_valuation_summary, compute_valuation_totals, token_numeraire,
    unit_price, PoolComposition, ValuationTotals,
};
pub use constants::{
    symbol_override, LP_DECIMALS, RATE_DECIMALS, SWAP_LIMIT_CEILING, UNBOUNDED_DEADLINE,
};
pub use fetch::{
    fetch_pair_pool_info, fetch_pool_data, fetch_pools, fetch_token, resolve_pool_catalog,
};
pub use liquidity::PoolLiquidity;
pub use messages::{friendly_error_message, DEFAULT_MESSAGE};
pub use router::{parse_swap_amount, resolve_route};
pub use state::{
    AmmError, LiquidityEstimate, PairPoolInfo, Pool, PoolCatalog, PoolExternalIds, PoolToken,
    SwapPreview, SwapRoute, Token, UserPosition, ValuationSummary,
};
pub use swap::{SwapExecutor, SwapOutcome, SwapRouter, SwapStage};
