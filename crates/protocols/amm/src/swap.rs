//! Swap quoting and execution
//!
//! `SwapRouter` quotes swaps through the vault's `queryBatchSwap`.
//! `SwapExecutor` runs one swap attempt through allowance check, optional
//! approval, route resolution and submission, recording the stage reached.

use chain_client::{
    confirm, timed_request, ChainClient, FundManagement, SharedChainClient, SwapKind,
};
use halo_core::{units, Address, AppConfig, PoolConfig, RawAmount, RawDelta, TxHash, TxReceipt};
use serde::{Deserialize, Serialize};

use crate::constants::{SWAP_LIMIT_CEILING, UNBOUNDED_DEADLINE};
use crate::router::{parse_swap_amount, resolve_route};
use crate::state::{AmmError, SwapPreview, SwapRoute, Token};

/// Routes and quotes swaps over the enabled pools
#[derive(Clone)]
pub struct SwapRouter {
    client: SharedChainClient,
    vault: Address,
    pools: Vec<PoolConfig>,
}

impl SwapRouter {
    pub fn new(client: SharedChainClient, config: &AppConfig) -> Self {
        Self {
            client,
            vault: config.chain.contracts.vault.clone(),
            pools: config.pools.enabled.clone(),
        }
    }

    pub fn client(&self) -> &dyn ChainClient {
        self.client.as_ref()
    }

    pub fn resolve_route(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount: &str,
        kind: SwapKind,
    ) -> Result<SwapRoute, AmmError> {
        resolve_route(&self.pools, token_in, token_out, amount, kind)
    }

    /// Quote a swap without submitting it
    ///
    /// An empty or zero amount, or a disconnected wallet, quotes `0`/`0`
    /// without touching the chain. Multi-hop routes are always simulated as
    /// exact-input.
    pub async fn preview_swap(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount: &str,
        kind: SwapKind,
    ) -> Result<SwapPreview, AmmError> {
        if parse_swap_amount(amount, token_in, token_out, kind)? == 0 {
            return Ok(SwapPreview::zero());
        }
        let Some(account) = self.client.account().await else {
            return Ok(SwapPreview::zero());
        };

        let route = self.resolve_route(token_in, token_out, amount, kind)?;
        let query_kind = if route.is_multi_hop() {
            SwapKind::GivenIn
        } else {
            kind
        };
        let funds = FundManagement::external(&account);

        tracing::debug!(
            kind = ?query_kind,
            assets = ?route.assets,
            hops = route.swaps.len(),
            "queryBatchSwap"
        );
        let deltas = timed_request(self.client.query_batch_swap(
            &self.vault,
            query_kind,
            &route.swaps,
            &route.assets,
            &funds,
        ))
        .await?;

        let delta_in = delta_of(&route, &deltas, &token_in.address)?;
        let delta_out = delta_of(&route, &deltas, &token_out.address)?;
        Ok(SwapPreview {
            amount_in: units::format_units(delta_in.unsigned_abs(), token_in.decimals),
            amount_out: units::format_units(delta_out.unsigned_abs(), token_out.decimals),
        })
    }

    /// Executor for one swap attempt between two tokens
    pub fn executor(&self, token_in: Token, token_out: Token) -> SwapExecutor {
        SwapExecutor {
            router: self.clone(),
            token_in,
            token_out,
            stage: SwapStage::Idle,
        }
    }
}

fn delta_of(route: &SwapRoute, deltas: &[RawDelta], token: &Address) -> Result<RawDelta, AmmError> {
    route
        .index_of(token)
        .and_then(|i| deltas.get(i).copied())
        .ok_or_else(|| AmmError::TokenNotFound(token.to_string()))
}

// =============================================================================
// Execution
// =============================================================================

/// Progress of a swap attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStage {
    Idle,
    AllowanceCheck,
    Approving,
    Approved,
    Quoting,
    Submitting,
    Confirmed,
    Failed,
}

/// Result of a confirmed swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    /// Approval submitted before the swap, if the allowance was short
    pub approval: Option<TxHash>,
    pub route: SwapRoute,
    pub receipt: TxReceipt,
}

pub struct SwapExecutor {
    router: SwapRouter,
    token_in: Token,
    token_out: Token,
    stage: SwapStage,
}

impl SwapExecutor {
    pub fn stage(&self) -> SwapStage {
        self.stage
    }

    /// Approve if needed, then submit the batch swap and wait for it
    ///
    /// Any failure leaves the executor in [`SwapStage::Failed`].
    pub async fn execute_swap(&mut self, amount: &str, kind: SwapKind) -> Result<SwapOutcome, AmmError> {
        match self.run(amount, kind).await {
            Ok(outcome) => {
                self.stage = SwapStage::Confirmed;
                tracing::info!(hash = %outcome.receipt.hash, "Swap confirmed");
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(stage = ?self.stage, error = %e, "Swap failed");
                self.stage = SwapStage::Failed;
                Err(e)
            }
        }
    }

    async fn run(&mut self, amount: &str, kind: SwapKind) -> Result<SwapOutcome, AmmError> {
        let client = self.router.client.clone();
        let vault = self.router.vault.clone();
        let account = client.account().await.ok_or(halo_core::ChainError::NotConnected)?;

        self.stage = SwapStage::AllowanceCheck;
        let route = self
            .router
            .resolve_route(&self.token_in, &self.token_out, amount, kind)?;
        let funds = FundManagement::external(&account);
        let required = self.required_input(&route, amount, kind, &funds).await?;
        let allowance =
            timed_request(client.allowance(&self.token_in.address, &account, &vault)).await?;
        tracing::debug!(
            token = %self.token_in.symbol,
            allowance = %allowance,
            required = %required,
            "Checked vault allowance"
        );

        let approval = if allowance < required {
            self.stage = SwapStage::Approving;
            let hash =
                timed_request(client.approve(&self.token_in.address, &vault, required)).await?;
            confirm(client.as_ref(), &hash).await?;
            Some(hash)
        } else {
            None
        };
        self.stage = SwapStage::Approved;

        self.stage = SwapStage::Quoting;
        let limits = self.limits(&route).await?;

        self.stage = SwapStage::Submitting;
        tracing::debug!(kind = ?kind, assets = ?route.assets, limits = ?limits, "batchSwap");
        let hash = timed_request(client.batch_swap(
            &vault,
            kind,
            &route.swaps,
            &route.assets,
            &funds,
            &limits,
            UNBOUNDED_DEADLINE,
        ))
        .await?;
        let receipt = confirm(client.as_ref(), &hash).await?;

        Ok(SwapOutcome {
            approval,
            route,
            receipt,
        })
    }

    /// Amount of `token_in` the vault will pull, in raw units
    ///
    /// Exact-input swaps spend the typed amount. Exact-output swaps spend
    /// whatever the vault quotes for the requested output.
    async fn required_input(
        &self,
        route: &SwapRoute,
        amount: &str,
        kind: SwapKind,
        funds: &FundManagement,
    ) -> Result<RawAmount, AmmError> {
        match kind {
            SwapKind::GivenIn => Ok(units::parse_units(amount, self.token_in.decimals)?),
            SwapKind::GivenOut => {
                let deltas = timed_request(self.router.client.query_batch_swap(
                    &self.router.vault,
                    kind,
                    &route.swaps,
                    &route.assets,
                    funds,
                ))
                .await?;
                let delta_in = delta_of(route, &deltas, &self.token_in.address)?;
                Ok(delta_in.unsigned_abs())
            }
        }
    }

    /// Fixed ceiling of 999,999,999 whole units for every asset in the table
    async fn limits(&self, route: &SwapRoute) -> Result<Vec<RawDelta>, AmmError> {
        let mut limits = Vec::with_capacity(route.assets.len());
        for asset in &route.assets {
            let decimals = if asset == &self.token_in.address {
                self.token_in.decimals
            } else if asset == &self.token_out.address {
                self.token_out.decimals
            } else {
                timed_request(self.router.client.decimals(asset)).await?
            };
            let ceiling = SWAP_LIMIT_CEILING.saturating_mul(units::pow10(decimals));
            limits.push(RawDelta::try_from(ceiling).unwrap_or(RawDelta::MAX));
        }
        Ok(limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_client::{LedgerSnapshot, MemoryChain};
    use halo_core::{ChainError, ChainId, ContractsConfig, RpcError, VaultPoolId};
    use std::sync::Arc;

    const E6: RawAmount = 1_000_000;
    const E18: RawAmount = 1_000_000_000_000_000_000;

    fn addr(n: u64) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn token(n: u64, symbol: &str, decimals: u8) -> Token {
        Token {
            chain_id: ChainId::MATIC,
            address: addr(n),
            decimals,
            symbol: symbol.to_string(),
        }
    }

    fn usdc() -> Token {
        token(0x1, "USDC", 6)
    }
    fn xsgd() -> Token {
        token(0x2, "XSGD", 6)
    }
    fn eurs() -> Token {
        token(0x3, "EURS", 2)
    }

    /// USDC/XSGD and USDC/EURS pools; EURS at 1.10, XSGD at 0.75
    fn setup(usdc_allowance: RawAmount) -> (AppConfig, Arc<MemoryChain>) {
        let account = addr(0xacc);
        let vault = addr(0xba);
        let (p1, p2) = (addr(0x100), addr(0x200));
        let (id1, id2) = (VaultPoolId::new("0x01"), VaultPoolId::new("0x02"));

        let mut config = AppConfig::default();
        config.chain.chain_id = ChainId::MATIC;
        config.chain.contracts = ContractsConfig {
            vault: vault.clone(),
            amm_rewards: None,
            rewards: None,
            rewards_token: None,
            bridge: None,
        };
        config.pools.enabled = vec![
            PoolConfig {
                address: p1.clone(),
                pool_id: id1.clone(),
                assets: vec![addr(0x1), addr(0x2)],
            },
            PoolConfig {
                address: p2.clone(),
                pool_id: id2.clone(),
                assets: vec![addr(0x1), addr(0x3)],
            },
        ];

        let snapshot = LedgerSnapshot::new(ChainId::MATIC, account.clone())
            .with_token(&addr(0x1), "USDC", 6)
            .with_token(&addr(0x2), "XSGD", 6)
            .with_token(&addr(0x3), "EURS", 2)
            .with_balance(&addr(0x1), &account, 1_000 * E6)
            .with_balance(&addr(0x2), &account, 1_000 * E6)
            .with_allowance(&addr(0x1), &account, &vault, usdc_allowance)
            .with_allowance(&addr(0x2), &account, &vault, 1_000 * E6)
            .with_vault_pool(&id1, &p1, &[(addr(0x1), 750_000 * E6), (addr(0x2), 1_000_000 * E6)])
            .with_vault_pool(&id2, &p2, &[(addr(0x1), 500_000 * E6), (addr(0x3), 50_000_000)])
            .with_assimilator(&p1, &addr(0x1), &addr(0xa1), 100_000_000)
            .with_assimilator(&p1, &addr(0x2), &addr(0xa2), 75_000_000)
            .with_assimilator(&p2, &addr(0x1), &addr(0xa1), 100_000_000)
            .with_assimilator(&p2, &addr(0x3), &addr(0xa3), 110_000_000)
            .with_balance(&p1, &addr(0xdead), 1_500_000 * E18);
        (config, Arc::new(MemoryChain::new(snapshot)))
    }

    fn router(config: &AppConfig, chain: &Arc<MemoryChain>) -> SwapRouter {
        SwapRouter::new(chain.clone(), config)
    }

    #[tokio::test]
    async fn test_preview_zero_amount_skips_chain() {
        let (config, chain) = setup(0);
        let router = router(&config, &chain);
        for amount in ["", "0", "0.000"] {
            let preview = router.preview_swap(&usdc(), &xsgd(), amount, SwapKind::GivenIn).await.unwrap();
            assert_eq!(preview, SwapPreview::zero());
        }
    }

    #[tokio::test]
    async fn test_preview_without_account() {
        let (config, chain) = setup(0);
        chain.set_account(None).await;
        let preview = router(&config, &chain)
            .preview_swap(&usdc(), &xsgd(), "10", SwapKind::GivenIn)
            .await
            .unwrap();
        assert_eq!(preview, SwapPreview::zero());
    }

    #[tokio::test]
    async fn test_preview_direct_strips_signs() {
        let (config, chain) = setup(0);
        let router = router(&config, &chain);

        let preview = router.preview_swap(&usdc(), &xsgd(), "75", SwapKind::GivenIn).await.unwrap();
        assert_eq!(preview.amount_in, "75.0");
        assert_eq!(preview.amount_out, "100.0");

        let preview = router.preview_swap(&xsgd(), &usdc(), "75", SwapKind::GivenOut).await.unwrap();
        assert_eq!(preview.amount_in, "100.0");
        assert_eq!(preview.amount_out, "75.0");
    }

    #[tokio::test]
    async fn test_preview_two_hop() {
        let (config, chain) = setup(0);
        // XSGD -> USDC -> EURS: 110 XSGD = 82.5 USDC = 75 EURS
        let preview = router(&config, &chain)
            .preview_swap(&xsgd(), &eurs(), "110", SwapKind::GivenIn)
            .await
            .unwrap();
        assert_eq!(preview.amount_in, "110.0");
        assert_eq!(preview.amount_out, "75.0");
    }

    #[tokio::test]
    async fn test_preview_no_route() {
        let (config, chain) = setup(0);
        let err = router(&config, &chain)
            .preview_swap(&usdc(), &token(0x9, "NOPE", 18), "1", SwapKind::GivenIn)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "no_route");
    }

    #[tokio::test]
    async fn test_execute_approves_when_allowance_short() {
        let (config, chain) = setup(10 * E6);
        let router = router(&config, &chain);
        let mut executor = router.executor(usdc(), xsgd());
        assert_eq!(executor.stage(), SwapStage::Idle);

        let outcome = executor.execute_swap("75", SwapKind::GivenIn).await.unwrap();
        assert!(outcome.approval.is_some());
        assert!(outcome.receipt.success);
        assert_eq!(executor.stage(), SwapStage::Confirmed);
        // approve + batchSwap
        assert_eq!(chain.transaction_count().await, 2);

        let account = addr(0xacc);
        assert_eq!(chain.balance_of(&addr(0x1), &account).await.unwrap(), 925 * E6);
        assert_eq!(chain.balance_of(&addr(0x2), &account).await.unwrap(), 1_100 * E6);
        // Approved exactly the swap amount, all of it spent
        assert_eq!(chain.allowance(&addr(0x1), &account, &addr(0xba)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_execute_exact_output_approves_quoted_input() {
        let (config, chain) = setup(0);
        let account = addr(0xacc);
        let vault = addr(0xba);
        // 75 USDC out costs 100 XSGD; only 10 XSGD approved so far
        chain.approve(&addr(0x2), &vault, 10 * E6).await.unwrap();
        let before = chain.transaction_count().await;

        let mut executor = router(&config, &chain).executor(xsgd(), usdc());
        let outcome = executor.execute_swap("75", SwapKind::GivenOut).await.unwrap();
        assert!(outcome.approval.is_some());
        assert_eq!(executor.stage(), SwapStage::Confirmed);
        assert_eq!(chain.transaction_count().await, before + 2);

        assert_eq!(chain.balance_of(&addr(0x2), &account).await.unwrap(), 900 * E6);
        assert_eq!(chain.balance_of(&addr(0x1), &account).await.unwrap(), 1_075 * E6);
        assert_eq!(chain.allowance(&addr(0x2), &account, &vault).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_execute_skips_approval_when_sufficient() {
        let (config, chain) = setup(500 * E6);
        let mut executor = router(&config, &chain).executor(usdc(), xsgd());
        let outcome = executor.execute_swap("75", SwapKind::GivenIn).await.unwrap();
        assert!(outcome.approval.is_none());
        assert_eq!(chain.transaction_count().await, 1);
    }

    #[tokio::test]
    async fn test_execute_two_hop() {
        let (config, chain) = setup(0);
        let mut executor = router(&config, &chain).executor(xsgd(), eurs());
        let outcome = executor.execute_swap("110", SwapKind::GivenIn).await.unwrap();
        assert!(outcome.route.is_multi_hop());
        assert_eq!(outcome.route.intermediate, Some(addr(0x1)));

        let account = addr(0xacc);
        assert_eq!(chain.balance_of(&addr(0x2), &account).await.unwrap(), 890 * E6);
        assert_eq!(chain.balance_of(&addr(0x3), &account).await.unwrap(), 7_500);
        // Intermediate nets out
        assert_eq!(chain.balance_of(&addr(0x1), &account).await.unwrap(), 1_000 * E6);
    }

    #[tokio::test]
    async fn test_execute_failure_sets_failed_stage() {
        let (config, chain) = setup(0);
        chain
            .fail_next_transaction(ChainError::Rejected {
                error: RpcError::new(4001, "MetaMask Tx Signature: User denied transaction signature."),
            })
            .await;
        let mut executor = router(&config, &chain).executor(usdc(), xsgd());
        let err = executor.execute_swap("75", SwapKind::GivenIn).await.unwrap_err();
        assert!(matches!(err, AmmError::Chain(ChainError::Rejected { .. })));
        assert_eq!(executor.stage(), SwapStage::Failed);
        assert_eq!(chain.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_execute_reverted_swap() {
        let (config, chain) = setup(0);
        // More XSGD out than the pool holds
        let mut executor = router(&config, &chain).executor(usdc(), xsgd());
        let err = executor.execute_swap("900000", SwapKind::GivenIn).await.unwrap_err();
        assert!(err.to_string().contains("Curve/swap-convergence-failed"));
        assert_eq!(executor.stage(), SwapStage::Failed);
    }
}
