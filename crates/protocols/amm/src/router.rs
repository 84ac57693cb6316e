//! Swap Routing
//!
//! Resolves a one- or two-hop path through the configured pools and builds
//! the batch-swap steps over a lexicographically sorted asset table.
//!
//! Exact-input routes put the full amount on the first hop
//! (`token_in -> intermediate`) and a zero placeholder on the second.
//! Exact-output routes start from the output side
//! (`token_out -> intermediate`, full amount) and finish with
//! `intermediate -> token_in` carrying the placeholder. The vault resolves
//! placeholder amounts from the previous hop.

use chain_client::{BatchSwapStep, SwapKind};
use halo_core::{units, Address, PoolConfig, RawAmount};

use crate::state::{AmmError, SwapRoute, Token};

/// Parse a user-entered amount with the decimals of the fixed side
///
/// Exact-input amounts are denominated in `token_in`, exact-output amounts in
/// `token_out`.
pub fn parse_swap_amount(
    amount: &str,
    token_in: &Token,
    token_out: &Token,
    kind: SwapKind,
) -> Result<RawAmount, AmmError> {
    let decimals = match kind {
        SwapKind::GivenIn => token_in.decimals,
        SwapKind::GivenOut => token_out.decimals,
    };
    Ok(units::parse_units(amount, decimals)?)
}

/// Build the route for swapping `token_in` into `token_out`
///
/// Only `pools` are considered, in the given order. A direct pool always
/// wins over a two-hop path.
pub fn resolve_route(
    pools: &[PoolConfig],
    token_in: &Token,
    token_out: &Token,
    amount: &str,
    kind: SwapKind,
) -> Result<SwapRoute, AmmError> {
    let no_route = || AmmError::NoRoute {
        token_in: token_in.address.clone(),
        token_out: token_out.address.clone(),
    };
    if token_in.address == token_out.address {
        return Err(no_route());
    }

    let raw_amount = parse_swap_amount(amount, token_in, token_out, kind)?;
    let input = &token_in.address;
    let output = &token_out.address;

    // Direct pool
    if let Some(pool) = pools.iter().find(|p| p.contains(input) && p.contains(output)) {
        let assets = sorted_assets(&[input, output]);
        let step = BatchSwapStep {
            pool_id: pool.pool_id.clone(),
            asset_in_index: index_in(&assets, input)?,
            asset_out_index: index_in(&assets, output)?,
            amount: raw_amount,
            user_data: Vec::new(),
        };
        tracing::debug!(pool = %pool.address, %input, %output, "Resolved direct route");
        return Ok(SwapRoute {
            assets,
            swaps: vec![step],
            intermediate: None,
        });
    }

    // Two hops through a shared token
    let (pool_in, pool_out, intermediate) = find_two_hop(pools, input, output).ok_or_else(no_route)?;
    let assets = sorted_assets(&[input, &intermediate, output]);

    let swaps = match kind {
        SwapKind::GivenIn => vec![
            BatchSwapStep {
                pool_id: pool_in.pool_id.clone(),
                asset_in_index: index_in(&assets, input)?,
                asset_out_index: index_in(&assets, &intermediate)?,
                amount: raw_amount,
                user_data: Vec::new(),
            },
            BatchSwapStep {
                pool_id: pool_out.pool_id.clone(),
                asset_in_index: index_in(&assets, &intermediate)?,
                asset_out_index: index_in(&assets, output)?,
                amount: 0,
                user_data: Vec::new(),
            },
        ],
        SwapKind::GivenOut => vec![
            BatchSwapStep {
                pool_id: pool_out.pool_id.clone(),
                asset_in_index: index_in(&assets, output)?,
                asset_out_index: index_in(&assets, &intermediate)?,
                amount: raw_amount,
                user_data: Vec::new(),
            },
            BatchSwapStep {
                pool_id: pool_in.pool_id.clone(),
                asset_in_index: index_in(&assets, &intermediate)?,
                asset_out_index: index_in(&assets, input)?,
                amount: 0,
                user_data: Vec::new(),
            },
        ],
    };

    tracing::debug!(
        pool_in = %pool_in.address,
        pool_out = %pool_out.address,
        %intermediate,
        "Resolved two-hop route"
    );
    Ok(SwapRoute {
        assets,
        swaps,
        intermediate: Some(intermediate),
    })
}

/// First `(pool holding input, pool holding output, shared token)` in config
/// order
fn find_two_hop<'a>(
    pools: &'a [PoolConfig],
    input: &Address,
    output: &Address,
) -> Option<(&'a PoolConfig, &'a PoolConfig, Address)> {
    for pool_in in pools.iter().filter(|p| p.contains(input)) {
        for pool_out in pools.iter().filter(|p| p.contains(output)) {
            let shared = pool_in
                .assets
                .iter()
                .find(|a| *a != input && *a != output && pool_out.contains(a));
            if let Some(mid) = shared {
                return Some((pool_in, pool_out, mid.clone()));
            }
        }
    }
    None
}

fn sorted_assets(tokens: &[&Address]) -> Vec<Address> {
    let mut assets: Vec<Address> = tokens.iter().map(|t| (*t).clone()).collect();
    assets.sort();
    assets
}

fn index_in(assets: &[Address], token: &Address) -> Result<usize, AmmError> {
    assets
        .iter()
        .position(|a| a == token)
        .ok_or_else(|| AmmError::TokenNotFound(token.to_string()))
}
