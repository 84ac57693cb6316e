//! chain-client: Chain client and price oracle capabilities
//!
//! The protocol crates never talk to a wallet or RPC endpoint directly. They
//! receive an `Arc<dyn ChainClient>` for contract reads and writes and an
//! `Arc<dyn PriceOracle>` for USD prices. `MemoryChain` implements the chain
//! client over an in-memory ledger.

pub mod memory;
pub mod oracle;
pub mod vault;

use std::sync::Arc;

use async_trait::async_trait;
use halo_core::{Address, ChainError, ChainId, RawAmount, RawDelta, TxHash, TxReceipt};

pub use memory::{LedgerSnapshot, MemoryChain};
pub use oracle::{CoinGeckoOracle, GetPriceBy, OracleError, PriceOracle, StaticPriceOracle};
pub use vault::{BatchSwapStep, DepositEstimate, FundManagement, PoolTokens, SwapKind};

/// Default timeout for chain calls (30 seconds).
pub const CHAIN_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Result type for chain client operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Shared handle to a chain client
pub type SharedChainClient = Arc<dyn ChainClient>;

/// Contract reads and writes against one EVM chain through the connected
/// wallet.
///
/// Write methods submit a transaction and return its hash; use
/// [`ChainClient::wait_for_transaction`] to await confirmation.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Connected wallet account, if any
    async fn account(&self) -> Option<Address>;

    /// Chain the wallet is connected to, if any
    async fn chain_id(&self) -> Option<ChainId>;

    // -------------------------------------------------------------------------
    // ERC-20
    // -------------------------------------------------------------------------

    async fn symbol(&self, token: &Address) -> Result<String>;
    async fn decimals(&self, token: &Address) -> Result<u8>;
    async fn total_supply(&self, token: &Address) -> Result<RawAmount>;
    async fn balance_of(&self, token: &Address, owner: &Address) -> Result<RawAmount>;
    async fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<RawAmount>;
    async fn approve(&self, token: &Address, spender: &Address, amount: RawAmount)
        -> Result<TxHash>;

    // -------------------------------------------------------------------------
    // Vault
    // -------------------------------------------------------------------------

    /// `getPoolTokens(poolId)`
    async fn get_pool_tokens(
        &self,
        vault: &Address,
        pool_id: &halo_core::VaultPoolId,
    ) -> Result<PoolTokens>;

    /// `queryBatchSwap` simulation. Returns one signed delta per asset:
    /// positive amounts flow into the vault, negative amounts out of it.
    async fn query_batch_swap(
        &self,
        vault: &Address,
        kind: SwapKind,
        swaps: &[BatchSwapStep],
        assets: &[Address],
        funds: &FundManagement,
    ) -> Result<Vec<RawDelta>>;

    /// `batchSwap` submission
    #[allow(clippy::too_many_arguments)]
    async fn batch_swap(
        &self,
        vault: &Address,
        kind: SwapKind,
        swaps: &[BatchSwapStep],
        assets: &[Address],
        funds: &FundManagement,
        limits: &[RawDelta],
        deadline: u128,
    ) -> Result<TxHash>;

    // -------------------------------------------------------------------------
    // FX pool and assimilators
    // -------------------------------------------------------------------------

    /// Assimilator registered for `token` in `pool`
    async fn assimilator(&self, pool: &Address, token: &Address) -> Result<Address>;

    /// `getRate()` of an assimilator (8 decimals)
    async fn assimilator_rate(&self, assimilator: &Address) -> Result<RawAmount>;

    /// `viewDeposit(totalDeposit)`; the deposit is expressed in 18-decimal
    /// numeraire units
    async fn view_deposit(&self, pool: &Address, amount: RawAmount) -> Result<DepositEstimate>;
    async fn deposit(&self, pool: &Address, amount: RawAmount, deadline: u64) -> Result<TxHash>;

    /// `viewWithdraw(ownershipUnits)`; token amounts in pool order
    async fn view_withdraw(&self, pool: &Address, amount: RawAmount) -> Result<Vec<RawAmount>>;
    async fn withdraw(&self, pool: &Address, amount: RawAmount, deadline: u64) -> Result<TxHash>;

    // -------------------------------------------------------------------------
    // Pool-id keyed rewards
    // -------------------------------------------------------------------------

    async fn pool_length(&self, rewards: &Address) -> Result<u64>;
    async fn lp_token(&self, rewards: &Address, pid: u64) -> Result<Address>;

    /// Staked ownership units (`userInfo(pid, user).amount`)
    async fn user_info(&self, rewards: &Address, pid: u64, user: &Address) -> Result<RawAmount>;
    async fn pending_reward_token(
        &self,
        rewards: &Address,
        pid: u64,
        user: &Address,
    ) -> Result<RawAmount>;

    // -------------------------------------------------------------------------
    // Pool-address keyed rewards
    // -------------------------------------------------------------------------

    async fn claimed_and_unclaimed_rewards(
        &self,
        rewards: &Address,
        user: &Address,
        pool: &Address,
    ) -> Result<RawAmount>;
    async fn unclaimed_rewards(
        &self,
        rewards: &Address,
        user: &Address,
        pool: &Address,
    ) -> Result<RawAmount>;
    async fn deposited_pool_tokens(
        &self,
        rewards: &Address,
        user: &Address,
        pool: &Address,
    ) -> Result<RawAmount>;
    async fn deposit_pool_tokens(
        &self,
        rewards: &Address,
        pool: &Address,
        amount: RawAmount,
    ) -> Result<TxHash>;
    async fn withdraw_pool_tokens(
        &self,
        rewards: &Address,
        pool: &Address,
        amount: RawAmount,
    ) -> Result<TxHash>;
    async fn withdraw_unclaimed_rewards(&self, rewards: &Address, pool: &Address)
        -> Result<TxHash>;

    // -------------------------------------------------------------------------
    // Constant-product pairs
    // -------------------------------------------------------------------------

    /// `(token0, token1)` of a pair
    async fn pair_tokens(&self, pair: &Address) -> Result<(Address, Address)>;

    /// `getReserves()` of a pair
    async fn pair_reserves(&self, pair: &Address) -> Result<(RawAmount, RawAmount)>;

    // -------------------------------------------------------------------------
    // Bridge
    // -------------------------------------------------------------------------

    async fn bridge_minimum(&self, bridge: &Address) -> Result<RawAmount>;

    /// Lock tokens on their origin chain for minting on `destination`
    async fn bridge_deposit(
        &self,
        bridge: &Address,
        amount: RawAmount,
        destination: ChainId,
    ) -> Result<TxHash>;

    /// Burn wrapped tokens to release them on the origin chain
    async fn bridge_burn(&self, bridge: &Address, amount: RawAmount) -> Result<TxHash>;

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    async fn wait_for_transaction(&self, hash: &TxHash) -> Result<TxReceipt>;
}

/// Wrap a chain call with a timeout
pub async fn timed_request<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(CHAIN_REQUEST_TIMEOUT, fut)
        .await
        .map_err(|_| ChainError::Timeout {
            secs: CHAIN_REQUEST_TIMEOUT.as_secs(),
        })?
}

/// Wait for a submitted transaction; fails when it reverted
///
/// The wait is not bounded by [`CHAIN_REQUEST_TIMEOUT`]. A submitted
/// transaction may still be mined after a slow block.
pub async fn confirm(client: &dyn ChainClient, hash: &TxHash) -> Result<TxReceipt> {
    let receipt = client.wait_for_transaction(hash).await?;
    if !receipt.success {
        return Err(ChainError::Reverted {
            contract: hash.to_string(),
            error: halo_core::RpcError::uncoded("transaction failed"),
        });
    }
    Ok(receipt)
}
