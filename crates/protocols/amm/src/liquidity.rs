//! FX pool liquidity
//!
//! Deposit and withdrawal previews and submissions for a single pool.
//! Deposits are expressed in 18-decimal numeraire units, withdrawals in
//! ownership units.

use chain_client::{timed_request, SharedChainClient};
use halo_core::{units, AppConfig, RawAmount, TxSubmission};

use crate::constants::LP_DECIMALS;
use crate::state::{AmmError, LiquidityEstimate, Pool};

pub struct PoolLiquidity {
    client: SharedChainClient,
    pool: Pool,
    double_estimate: bool,
}

impl PoolLiquidity {
    pub fn new(client: SharedChainClient, config: &AppConfig, pool: Pool) -> Self {
        let double_estimate = config.pools.is_double_estimate(&pool.address);
        Self {
            client,
            pool,
            double_estimate,
        }
    }

    fn halve(&self, raw: RawAmount) -> RawAmount {
        if self.double_estimate {
            raw / 2
        } else {
            raw
        }
    }

    /// Ownership units and token amounts for depositing `amount` numeraire
    pub async fn view_deposit(&self, amount: &str) -> Result<LiquidityEstimate, AmmError> {
        let raw = units::parse_units(amount, LP_DECIMALS)?;
        let estimate = timed_request(self.client.view_deposit(&self.pool.address, raw)).await?;

        let token_amounts = estimate
            .token_amounts
            .iter()
            .zip(self.pool.tokens.iter())
            .map(|(amount, side)| units::format_units(self.halve(*amount), side.token.decimals))
            .collect();
        Ok(LiquidityEstimate {
            ownership_units: units::format_units(self.halve(estimate.ownership_units), LP_DECIMALS),
            token_amounts,
        })
    }

    pub async fn deposit(&self, amount: &str, deadline: u64) -> Result<TxSubmission, AmmError> {
        let raw = units::parse_units(amount, LP_DECIMALS)?;
        let hash = timed_request(self.client.deposit(&self.pool.address, raw, deadline)).await?;
        let summary = format!("Add Liquidity for {}", self.pool.name);
        tracing::info!(pool = %self.pool.address, %hash, %summary, "Submitted deposit");
        Ok(TxSubmission { hash, summary })
    }

    /// Token amounts returned for burning `amount` ownership units
    pub async fn view_withdraw(&self, amount: &str) -> Result<Vec<String>, AmmError> {
        let raw = units::parse_units(amount, LP_DECIMALS)?;
        let amounts = timed_request(self.client.view_withdraw(&self.pool.address, raw)).await?;
        Ok(amounts
            .iter()
            .zip(self.pool.tokens.iter())
            .map(|(amount, side)| units::format_units(*amount, side.token.decimals))
            .collect())
    }

    pub async fn withdraw(&self, amount: &str, deadline: u64) -> Result<TxSubmission, AmmError> {
        let raw = units::parse_units(amount, LP_DECIMALS)?;
        let hash = timed_request(self.client.withdraw(&self.pool.address, raw, deadline)).await?;
        let summary = format!("Remove Liquidity from {}", self.pool.name);
        tracing::info!(pool = %self.pool.address, %hash, %summary, "Submitted withdrawal");
        Ok(TxSubmission { hash, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fetch_pool_data;
    use chain_client::{ChainClient, LedgerSnapshot, MemoryChain};
    use halo_core::{Address, ChainId, PoolConfig, VaultPoolId};
    use std::sync::Arc;

    const E6: RawAmount = 1_000_000;
    const E18: RawAmount = 1_000_000_000_000_000_000;

    fn addr(n: u64) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    async fn setup(double_estimate: bool) -> (Arc<MemoryChain>, PoolLiquidity) {
        let account = addr(0xacc);
        let pool = addr(0x100);
        let pool_id = VaultPoolId::new("0x01");

        let mut config = AppConfig::default();
        config.chain.contracts.vault = addr(0xba);
        config.pools.enabled = vec![PoolConfig {
            address: pool.clone(),
            pool_id: pool_id.clone(),
            assets: vec![addr(0x1), addr(0x2)],
        }];

        let mut snapshot = LedgerSnapshot::new(ChainId::MATIC, account.clone())
            .with_token(&addr(0x1), "USDC", 6)
            .with_token(&addr(0x2), "XSGD", 6)
            .with_balance(&addr(0x1), &account, 1_000 * E6)
            .with_balance(&addr(0x2), &account, 1_000 * E6)
            .with_vault_pool(&pool_id, &pool, &[(addr(0x1), 750_000 * E6), (addr(0x2), 1_000_000 * E6)])
            .with_balance(&pool, &addr(0xdead), 1_500_000 * E18)
            .with_assimilator(&pool, &addr(0x1), &addr(0xa1), 100_000_000)
            .with_assimilator(&pool, &addr(0x2), &addr(0xa2), 75_000_000);
        if double_estimate {
            snapshot = snapshot.with_double_estimate(&pool);
            config.pools.double_estimate.push(pool.clone());
        }

        let chain = Arc::new(MemoryChain::new(snapshot));
        let fetched = fetch_pool_data(chain.as_ref(), &config, &pool, &pool_id, None)
            .await
            .unwrap()
            .unwrap();
        let liquidity = PoolLiquidity::new(chain.clone(), &config, fetched);
        (chain, liquidity)
    }

    #[tokio::test]
    async fn test_view_deposit() {
        let (_, liquidity) = setup(false).await;
        let estimate = liquidity.view_deposit("100").await.unwrap();
        assert_eq!(estimate.ownership_units, "100.0");
        assert_eq!(estimate.token_amounts, vec!["50.0", "66.666666"]);
    }

    #[tokio::test]
    async fn test_view_deposit_halves_double_estimates() {
        let (_, liquidity) = setup(true).await;
        let estimate = liquidity.view_deposit("100").await.unwrap();
        assert_eq!(estimate.ownership_units, "100.0");
        assert_eq!(estimate.token_amounts, vec!["50.0", "66.666666"]);
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw_summaries() {
        let (chain, liquidity) = setup(false).await;
        let account = addr(0xacc);

        let tx = liquidity.deposit("100", 1_700_000_000).await.unwrap();
        assert_eq!(tx.summary, "Add Liquidity for USDC/XSGD");
        assert!(chain.wait_for_transaction(&tx.hash).await.unwrap().success);
        assert_eq!(chain.balance_of(&addr(0x100), &account).await.unwrap(), 100 * E18);

        let amounts = liquidity.view_withdraw("100").await.unwrap();
        assert_eq!(amounts.len(), 2);

        let tx = liquidity.withdraw("100", 1_700_000_000).await.unwrap();
        assert_eq!(tx.summary, "Remove Liquidity from USDC/XSGD");
        assert_eq!(chain.balance_of(&addr(0x100), &account).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_amount() {
        let (_, liquidity) = setup(false).await;
        let err = liquidity.view_deposit("1.2.3").await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_amount");
    }
}
