//! Farm summary
//!
//! Gathers the caller's rewards and stakes for the listed pools, prices the
//! rewards token and hands everything to the valuation calculator.

use amm::{compute_valuation_summary, Pool, ValuationSummary};
use chain_client::{GetPriceBy, PriceOracle};
use halo_core::AppConfig;

use crate::rewards::RewardsProgram;
use crate::state::FarmError;

/// Pools shown on the farm: everything not marked inactive
pub fn farm_pools(pools: &[Pool], config: &AppConfig) -> Vec<Pool> {
    pools
        .iter()
        .filter(|p| !config.pools.is_inactive(&p.address))
        .cloned()
        .collect()
}

/// USD price of the rewards token, or 0 when it cannot be looked up
pub async fn rewards_token_price(program: &RewardsProgram, oracle: &dyn PriceOracle) -> f64 {
    let Some(token) = program.rewards_token() else {
        tracing::warn!("No rewards token configured, pricing rewards at zero");
        return 0.0;
    };
    let key = token.to_string();
    match oracle.usd_prices(GetPriceBy::Address, std::slice::from_ref(&key)).await {
        Ok(prices) => prices.get(&key).copied().unwrap_or(0.0),
        Err(e) => {
            tracing::warn!(%token, error = %e, "Rewards token price unavailable");
            0.0
        }
    }
}

/// Stakeable value, staked value and rewards earned across `pools`
pub async fn fetch_farm_summary(
    program: &RewardsProgram,
    oracle: &dyn PriceOracle,
    pools: &[Pool],
) -> Result<ValuationSummary, FarmError> {
    if pools.is_empty() {
        return Ok(ValuationSummary::empty());
    }

    let addresses: Vec<_> = pools.iter().map(|p| p.address.clone()).collect();
    let (positions, price) = tokio::join!(
        program.positions(&addresses),
        rewards_token_price(program, oracle),
    );
    let positions = positions?;

    Ok(compute_valuation_summary(
        pools,
        &positions.rewards_earned,
        &positions.staked,
        price,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::UserPosition;
    use chain_client::memory::RewardsPosition;
    use chain_client::{LedgerSnapshot, MemoryChain, StaticPriceOracle};
    use halo_core::{Address, ChainId, RawAmount, VaultPoolId};
    use std::sync::Arc;

    const E18: RawAmount = 1_000_000_000_000_000_000;

    fn addr(n: u64) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn pool(address: Address, liquidity: RawAmount, supply: RawAmount, held: RawAmount) -> Pool {
        Pool {
            address,
            vault_pool_id: VaultPoolId::new("0x01"),
            rewards_pool_id: None,
            name: "USDC/XSGD".to_string(),
            tokens: vec![],
            total_liquidity: liquidity,
            total_supply: supply,
            user: UserPosition {
                held,
                staked: 0,
                earned: 0,
            },
        }
    }

    fn setup() -> (AppConfig, RewardsProgram) {
        let account = addr(0xacc);
        let (rewards, token) = (addr(0xf0), addr(0xf1));

        let mut config = AppConfig::default();
        config.chain.contracts.rewards = Some(rewards.clone());
        config.chain.contracts.rewards_token = Some(token.clone());
        config.pools.inactive = vec![addr(0x300)];

        let snapshot = LedgerSnapshot::new(ChainId::MAINNET, account.clone())
            .with_token(&token, "DSRT", 18)
            .with_rewards(&rewards, Some(&token))
            .with_rewards_position(
                &rewards,
                RewardsPosition {
                    pool: addr(0x100),
                    user: account,
                    deposited: 3 * E18,
                    unclaimed: 30 * E18,
                    claimed: 10 * E18,
                },
            );
        let chain = Arc::new(MemoryChain::new(snapshot));
        let program = RewardsProgram::new(chain, &config).unwrap();
        (config, program)
    }

    #[tokio::test]
    async fn test_farm_summary() {
        let (_, program) = setup();
        let oracle = StaticPriceOracle::new().with_price(addr(0xf1).as_str(), 0.5);
        // 10 USD per unit, 2 units held, 3 staked, 40 rewards at 0.5
        let pools = vec![pool(addr(0x100), 1_000 * E18, 100 * E18, 2 * E18)];

        let summary = fetch_farm_summary(&program, &oracle, &pools).await.unwrap();
        assert_eq!(summary.stakeable_value, "$20.00");
        assert_eq!(summary.staked_value, "$30.00");
        assert_eq!(summary.rewards_earned, "20");
    }

    #[tokio::test]
    async fn test_oracle_failure_prices_rewards_at_zero() {
        let (_, program) = setup();
        let pools = vec![pool(addr(0x100), 1_000 * E18, 100 * E18, 2 * E18)];

        let summary = fetch_farm_summary(&program, &StaticPriceOracle::unavailable(), &pools)
            .await
            .unwrap();
        assert_eq!(summary.rewards_earned, "0");
        assert_eq!(summary.staked_value, "$30.00");
    }

    #[tokio::test]
    async fn test_empty_farm() {
        let (_, program) = setup();
        let summary = fetch_farm_summary(&program, &StaticPriceOracle::new(), &[]).await.unwrap();
        assert_eq!(summary, ValuationSummary::empty());
    }

    #[test]
    fn test_farm_pools_hides_inactive() {
        let (config, _) = setup();
        let pools = vec![pool(addr(0x100), 0, 0, 0), pool(addr(0x300), 0, 0, 0)];
        let listed = farm_pools(&pools, &config);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].address, addr(0x100));
    }
}
