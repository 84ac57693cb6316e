//! Pool Discovery and Fetching
//!
//! Resolves rewards pool ids for the configured pools and reads pool
//! snapshots from the chain client. Independent reads are issued together
//! and joined; each call goes through the 30 second request timeout.

use std::collections::BTreeMap;

use chain_client::{timed_request, ChainClient, GetPriceBy, PriceOracle};
use futures::future::try_join_all;
use halo_core::{units, Address, AppConfig, ChainError, ChainId, RawAmount, VaultPoolId};

use crate::calculator::compose_pool;
use crate::constants::{symbol_override, EMPTY_POOL_WEIGHT, RATE_DECIMALS};
use crate::state::{
    AmmError, PairPoolInfo, Pool, PoolCatalog, PoolExternalIds, PoolToken, Token, UserPosition,
};

// =============================================================================
// Catalog
// =============================================================================

/// Build the pool catalog from configuration and the AMM rewards contract
///
/// Each rewards-list entry that matches a configured pool (enabled pools
/// first) gives that pool its rewards id. Lookup failures are logged and
/// leave every pool without a rewards id.
pub async fn resolve_pool_catalog(client: &dyn ChainClient, config: &AppConfig) -> PoolCatalog {
    let mut catalog = PoolCatalog {
        enabled: external_ids(&config.pools.enabled),
        disabled: external_ids(&config.pools.disabled),
        inactive: config.pools.inactive.clone(),
    };

    let Some(rewards) = config.chain.contracts.amm_rewards.as_ref() else {
        tracing::warn!(chain = %config.chain.chain_id, "No AMM rewards contract configured");
        return catalog;
    };

    let lp_tokens = match rewards_lp_tokens(client, rewards).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(%rewards, error = %e, "Failed to read rewards pool list");
            return catalog;
        }
    };

    for (pid, lp_token) in lp_tokens.iter().enumerate() {
        let pid = pid as u64;
        if let Some(ids) = catalog.enabled.get_mut(lp_token) {
            ids.rewards_pool_id = Some(pid);
        } else if let Some(ids) = catalog.disabled.get_mut(lp_token) {
            ids.rewards_pool_id = Some(pid);
        }
    }

    tracing::info!(
        enabled = catalog.enabled.len(),
        disabled = catalog.disabled.len(),
        rewards_pools = lp_tokens.len(),
        "Resolved pool catalog"
    );
    catalog
}

fn external_ids(pools: &[halo_core::PoolConfig]) -> BTreeMap<Address, PoolExternalIds> {
    pools
        .iter()
        .map(|p| {
            (
                p.address.clone(),
                PoolExternalIds {
                    rewards_pool_id: None,
                    vault_pool_id: p.pool_id.clone(),
                },
            )
        })
        .collect()
}

/// `lpToken(i)` for every index below `poolLength()`
async fn rewards_lp_tokens(
    client: &dyn ChainClient,
    rewards: &Address,
) -> Result<Vec<Address>, ChainError> {
    let length = timed_request(client.pool_length(rewards)).await?;
    try_join_all((0..length).map(|pid| timed_request(client.lp_token(rewards, pid)))).await
}

// =============================================================================
// Tokens
// =============================================================================

/// Read token metadata, applying the canonical symbol override
pub async fn fetch_token(
    client: &dyn ChainClient,
    chain_id: ChainId,
    address: &Address,
) -> Result<Token, AmmError> {
    let (symbol, decimals) = tokio::try_join!(
        timed_request(client.symbol(address)),
        timed_request(client.decimals(address)),
    )?;
    Ok(Token {
        chain_id,
        address: address.clone(),
        decimals,
        symbol: display_symbol(chain_id, address, symbol),
    })
}

fn display_symbol(chain_id: ChainId, address: &Address, on_chain: String) -> String {
    symbol_override(chain_id, address)
        .map(str::to_string)
        .unwrap_or(on_chain)
}

// =============================================================================
// FX pools
// =============================================================================

/// Read a full pool snapshot
///
/// Returns `Ok(None)` while no wallet account or chain id is available.
/// Staked amount and pending rewards are read only when the pool has a
/// rewards id and an AMM rewards contract is configured.
pub async fn fetch_pool_data(
    client: &dyn ChainClient,
    config: &AppConfig,
    pool_address: &Address,
    vault_pool_id: &VaultPoolId,
    rewards_pool_id: Option<u64>,
) -> Result<Option<Pool>, AmmError> {
    let (account, chain_id) = tokio::join!(client.account(), client.chain_id());
    let (Some(account), Some(chain_id)) = (account, chain_id) else {
        tracing::debug!(pool = %pool_address, "Skipping pool fetch: wallet not connected");
        return Ok(None);
    };

    let vault = &config.chain.contracts.vault;
    let pool_tokens = timed_request(client.get_pool_tokens(vault, vault_pool_id)).await?;
    if pool_tokens.tokens.len() < 2 {
        return Err(AmmError::PoolNotFound(format!(
            "{} has {} registered tokens",
            pool_address,
            pool_tokens.tokens.len()
        )));
    }

    let rewards = config
        .chain
        .contracts
        .amm_rewards
        .as_ref()
        .zip(rewards_pool_id);

    let (symbols, decimals, total_supply, held, staked, earned) = tokio::try_join!(
        try_join_all(pool_tokens.tokens.iter().map(|t| timed_request(client.symbol(t)))),
        try_join_all(pool_tokens.tokens.iter().map(|t| timed_request(client.decimals(t)))),
        timed_request(client.total_supply(pool_address)),
        timed_request(client.balance_of(pool_address, &account)),
        async {
            match rewards {
                Some((contract, pid)) => timed_request(client.user_info(contract, pid, &account)).await,
                None => Ok(0),
            }
        },
        async {
            match rewards {
                Some((contract, pid)) => {
                    timed_request(client.pending_reward_token(contract, pid, &account)).await
                }
                None => Ok(0),
            }
        },
    )?;

    let assimilators = try_join_all(
        pool_tokens
            .tokens
            .iter()
            .map(|t| timed_request(client.assimilator(pool_address, t))),
    )
    .await?;
    let rates = try_join_all(
        assimilators
            .iter()
            .map(|a| timed_request(client.assimilator_rate(a))),
    )
    .await?;

    let sides: Vec<(RawAmount, u8, RawAmount)> = pool_tokens
        .balances
        .iter()
        .zip(decimals.iter())
        .zip(rates.iter())
        .map(|((balance, decimals), rate)| (*balance, *decimals, *rate))
        .collect();
    let composition = compose_pool(&sides);

    let tokens: Vec<PoolToken> = pool_tokens
        .tokens
        .iter()
        .zip(symbols)
        .enumerate()
        .map(|(i, (address, symbol))| PoolToken {
            token: Token {
                chain_id,
                address: address.clone(),
                decimals: decimals[i],
                symbol: display_symbol(chain_id, address, symbol),
            },
            balance: sides[i].0,
            rate: sides[i].2,
            weight: composition.weights[i],
        })
        .collect();

    let name = tokens
        .iter()
        .map(|t| t.token.symbol.as_str())
        .collect::<Vec<_>>()
        .join("/");

    let pool = Pool {
        address: pool_address.clone(),
        vault_pool_id: vault_pool_id.clone(),
        rewards_pool_id,
        name,
        tokens,
        total_liquidity: composition.total_liquidity,
        total_supply,
        user: UserPosition {
            held,
            staked,
            earned,
        },
    };
    tracing::debug!(%pool, "Fetched pool");
    Ok(Some(pool))
}

/// Fetch every catalogued pool, enabled pools first
///
/// Returns an empty list while the wallet is not connected.
pub async fn fetch_pools(
    client: &dyn ChainClient,
    config: &AppConfig,
    catalog: &PoolCatalog,
) -> Result<Vec<Pool>, AmmError> {
    let entries = catalog.enabled.iter().chain(catalog.disabled.iter());
    let pools = try_join_all(entries.map(|(address, ids)| {
        fetch_pool_data(client, config, address, &ids.vault_pool_id, ids.rewards_pool_id)
    }))
    .await?;
    Ok(pools.into_iter().flatten().collect())
}

// =============================================================================
// Pair pools
// =============================================================================

/// Value a constant-product pair with oracle prices
///
/// Prices that cannot be fetched count as zero.
pub async fn fetch_pair_pool_info(
    client: &dyn ChainClient,
    oracle: &dyn PriceOracle,
    chain_id: ChainId,
    lp_token: &Address,
    pid: u64,
) -> Result<PairPoolInfo, AmmError> {
    let ((token0, token1), (reserve0, reserve1)) = tokio::try_join!(
        timed_request(client.pair_tokens(lp_token)),
        timed_request(client.pair_reserves(lp_token)),
    )?;
    let (token0, token1) = tokio::try_join!(
        fetch_token(client, chain_id, &token0),
        fetch_token(client, chain_id, &token1),
    )?;

    let keys = vec![token0.address.to_string(), token1.address.to_string()];
    let prices = match oracle.usd_prices(GetPriceBy::Address, &keys).await {
        Ok(prices) => prices,
        Err(e) => {
            tracing::warn!(pair = %lp_token, error = %e, "Price lookup failed, valuing pair at zero");
            Default::default()
        }
    };
    let price0 = prices.get(&keys[0]).copied().unwrap_or(0.0);
    let price1 = prices.get(&keys[1]).copied().unwrap_or(0.0);

    let liquidity = units::to_f64(reserve0, token0.decimals) * price0
        + units::to_f64(reserve1, token1.decimals) * price1;
    let pair = format!("{}/{}", token0.symbol, token1.symbol);

    Ok(PairPoolInfo {
        pid,
        address: lp_token.clone(),
        pair,
        tokens: vec![
            pair_side(token0, reserve0, price0),
            pair_side(token1, reserve1, price1),
        ],
        liquidity,
    })
}

/// Pair side with the USD price stored as an 8-decimal rate
fn pair_side(token: Token, balance: RawAmount, price: f64) -> PoolToken {
    let rate = (price * 10f64.powi(RATE_DECIMALS as i32)).round();
    PoolToken {
        token,
        balance,
        rate: if rate.is_finite() && rate > 0.0 { rate as RawAmount } else { 0 },
        weight: EMPTY_POOL_WEIGHT,
    }
}
