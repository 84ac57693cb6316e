//! Rewards program
//!
//! Reads the caller's per-pool rewards and stakes from the pool-address keyed
//! rewards contract, and submits stake, unstake and claim transactions.

use chain_client::{timed_request, SharedChainClient};
use futures::future::try_join_all;
use halo_core::{units, Address, AppConfig, ChainError, RawAmount, TxSubmission};

use crate::state::{FarmError, FarmPositions, PerPool};

/// Decimals of ownership units and rewards
const UNIT_DECIMALS: u8 = 18;

#[derive(Clone)]
pub struct RewardsProgram {
    client: SharedChainClient,
    contract: Address,
    rewards_token: Option<Address>,
}

impl RewardsProgram {
    /// Program for the configured rewards contract
    pub fn new(client: SharedChainClient, config: &AppConfig) -> Result<Self, FarmError> {
        Ok(Self {
            client,
            contract: config.rewards_contract()?.clone(),
            rewards_token: config.chain.contracts.rewards_token.clone(),
        })
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn rewards_token(&self) -> Option<&Address> {
        self.rewards_token.as_ref()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn claimed_and_unclaimed_rewards(&self, pools: &[Address]) -> Result<PerPool, FarmError> {
        self.per_pool(pools, |client, contract, user, pool| async move {
            timed_request(client.claimed_and_unclaimed_rewards(&contract, &user, &pool)).await
        })
        .await
    }

    pub async fn unclaimed_rewards(&self, pools: &[Address]) -> Result<PerPool, FarmError> {
        self.per_pool(pools, |client, contract, user, pool| async move {
            timed_request(client.unclaimed_rewards(&contract, &user, &pool)).await
        })
        .await
    }

    pub async fn staked_amounts(&self, pools: &[Address]) -> Result<PerPool, FarmError> {
        self.per_pool(pools, |client, contract, user, pool| async move {
            timed_request(client.deposited_pool_tokens(&contract, &user, &pool)).await
        })
        .await
    }

    /// All three per-pool reads, issued together
    pub async fn positions(&self, pools: &[Address]) -> Result<FarmPositions, FarmError> {
        let (rewards_earned, unclaimed, staked) = tokio::try_join!(
            self.claimed_and_unclaimed_rewards(pools),
            self.unclaimed_rewards(pools),
            self.staked_amounts(pools),
        )?;
        Ok(FarmPositions {
            rewards_earned,
            unclaimed,
            staked,
        })
    }

    /// Run one read per pool for the connected account
    ///
    /// Without an account the result is empty.
    async fn per_pool<F, Fut>(&self, pools: &[Address], read: F) -> Result<PerPool, FarmError>
    where
        F: Fn(SharedChainClient, Address, Address, Address) -> Fut,
        Fut: std::future::Future<Output = Result<RawAmount, ChainError>>,
    {
        let Some(account) = self.client.account().await else {
            return Ok(PerPool::new());
        };
        let values = try_join_all(pools.iter().map(|pool| {
            read(
                self.client.clone(),
                self.contract.clone(),
                account.clone(),
                pool.clone(),
            )
        }))
        .await?;
        Ok(pools
            .iter()
            .cloned()
            .zip(values)
            .map(|(pool, raw)| (pool, units::to_f64(raw, UNIT_DECIMALS)))
            .collect())
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    pub async fn stake(&self, pool: &Address, amount: &str) -> Result<TxSubmission, FarmError> {
        let raw = units::parse_units(amount, UNIT_DECIMALS)?;
        let hash = timed_request(self.client.deposit_pool_tokens(&self.contract, pool, raw)).await?;
        let summary = format!("Stake {} BPT", amount.trim());
        tracing::info!(%pool, %hash, %summary, "Submitted stake");
        Ok(TxSubmission { hash, summary })
    }

    pub async fn unstake(&self, pool: &Address, amount: &str) -> Result<TxSubmission, FarmError> {
        let raw = units::parse_units(amount, UNIT_DECIMALS)?;
        let hash = timed_request(self.client.withdraw_pool_tokens(&self.contract, pool, raw)).await?;
        let summary = format!("Unstake {} BPT", amount.trim());
        tracing::info!(%pool, %hash, %summary, "Submitted unstake");
        Ok(TxSubmission { hash, summary })
    }

    /// Withdraw the unclaimed rewards of one pool
    pub async fn claim(&self, pool: &Address) -> Result<TxSubmission, FarmError> {
        let hash = timed_request(self.client.withdraw_unclaimed_rewards(&self.contract, pool)).await?;
        let summary = "Claim rewards (DSRT)".to_string();
        tracing::info!(%pool, %hash, "Submitted claim");
        Ok(TxSubmission { hash, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_client::memory::RewardsPosition;
    use chain_client::{ChainClient, LedgerSnapshot, MemoryChain};
    use halo_core::ChainId;
    use std::sync::Arc;

    const E18: RawAmount = 1_000_000_000_000_000_000;

    fn addr(n: u64) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn setup() -> (AppConfig, Arc<MemoryChain>) {
        let account = addr(0xacc);
        let (rewards, token, pool) = (addr(0xf0), addr(0xf1), addr(0x100));

        let mut config = AppConfig::default();
        config.chain.contracts.rewards = Some(rewards.clone());
        config.chain.contracts.rewards_token = Some(token.clone());

        let snapshot = LedgerSnapshot::new(ChainId::MAINNET, account.clone())
            .with_token(&token, "DSRT", 18)
            .with_token(&pool, "HLP", 18)
            .with_balance(&pool, &account, 10 * E18)
            .with_balance(&pool, &rewards, 4 * E18)
            .with_rewards(&rewards, Some(&token))
            .with_rewards_position(
                &rewards,
                RewardsPosition {
                    pool: pool.clone(),
                    user: account,
                    deposited: 4 * E18,
                    unclaimed: 2 * E18,
                    claimed: E18,
                },
            );
        (config, Arc::new(MemoryChain::new(snapshot)))
    }

    #[tokio::test]
    async fn test_requires_rewards_contract() {
        let (_, chain) = setup();
        let err = RewardsProgram::new(chain, &AppConfig::default()).err().unwrap();
        assert_eq!(err.error_code(), "farm_not_configured");
    }

    #[tokio::test]
    async fn test_positions() {
        let (config, chain) = setup();
        let program = RewardsProgram::new(chain, &config).unwrap();
        let pools = vec![addr(0x100), addr(0x200)];

        let positions = program.positions(&pools).await.unwrap();
        assert_eq!(positions.rewards_earned[&addr(0x100)], 3.0);
        assert_eq!(positions.unclaimed[&addr(0x100)], 2.0);
        assert_eq!(positions.staked[&addr(0x100)], 4.0);
        assert_eq!(positions.staked[&addr(0x200)], 0.0);
    }

    #[tokio::test]
    async fn test_positions_without_account() {
        let (config, chain) = setup();
        chain.set_account(None).await;
        let program = RewardsProgram::new(chain, &config).unwrap();
        let positions = program.positions(&[addr(0x100)]).await.unwrap();
        assert!(positions.staked.is_empty());
    }

    #[tokio::test]
    async fn test_stake_unstake_claim() {
        let (config, chain) = setup();
        let program = RewardsProgram::new(chain.clone(), &config).unwrap();
        let account = addr(0xacc);
        let pool = addr(0x100);

        let tx = program.stake(&pool, "1.5").await.unwrap();
        assert_eq!(tx.summary, "Stake 1.5 BPT");
        assert_eq!(chain.balance_of(&pool, &account).await.unwrap(), 85 * E18 / 10);

        let tx = program.unstake(&pool, "2").await.unwrap();
        assert_eq!(tx.summary, "Unstake 2 BPT");
        assert_eq!(
            chain.deposited_pool_tokens(&addr(0xf0), &account, &pool).await.unwrap(),
            35 * E18 / 10
        );

        let tx = program.claim(&pool).await.unwrap();
        assert_eq!(tx.summary, "Claim rewards (DSRT)");
        assert_eq!(chain.balance_of(&addr(0xf1), &account).await.unwrap(), 2 * E18);
    }

    #[tokio::test]
    async fn test_unstake_more_than_staked() {
        let (config, chain) = setup();
        let program = RewardsProgram::new(chain, &config).unwrap();
        let err = program.unstake(&addr(0x100), "5").await.unwrap_err();
        assert!(matches!(err, FarmError::Chain(ChainError::Reverted { .. })));
        let friendly = amm_message(&err);
        assert_eq!(friendly, "The amount exceeds your available balance.");
    }

    fn amm_message(err: &FarmError) -> String {
        match err {
            FarmError::Chain(e) => amm::friendly_error_message(&e.rpc_error()),
            other => other.to_string(),
        }
    }
}
