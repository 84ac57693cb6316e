//! AMM Constants
//!
//! Decimals, swap limits and the canonical token symbol overrides.

use halo_core::{Address, ChainId, RawAmount};

/// Decimals of assimilator `getRate()` values
pub const RATE_DECIMALS: u8 = 8;

/// Decimals of ownership units and numeraire liquidity
pub const LP_DECIMALS: u8 = 18;

/// Per-asset batch-swap limit, in whole tokens
pub const SWAP_LIMIT_CEILING: RawAmount = 999_999_999;

/// Deadline passed to `batchSwap` (never expires)
pub const UNBOUNDED_DEADLINE: u128 = u128::MAX;

/// Weight assigned to each side of an empty two-token pool
pub const EMPTY_POOL_WEIGHT: f64 = 0.5;

/// Tokens whose on-chain `symbol()` differs from the symbol shown to users
///
/// Keyed by (chain id, lowercase address).
const SYMBOL_OVERRIDES: &[(u64, &str, &str)] = &[
    (137, "0x2791bca1f2de4661ed88a30c99a7a9449aa84174", "USDC"),
    (42161, "0xff970a61a04b1ca14834a43f5de4533ebddb5cc8", "USDC"),
];

/// Canonical display symbol for a token, if it is overridden
pub fn symbol_override(chain_id: ChainId, token: &Address) -> Option<&'static str> {
    SYMBOL_OVERRIDES
        .iter()
        .find(|(chain, address, _)| *chain == chain_id.as_u64() && *address == token.as_str())
        .map(|(_, _, symbol)| *symbol)
}
