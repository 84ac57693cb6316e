//! In-memory chain client
//!
//! `MemoryChain` keeps a serde-friendly [`LedgerSnapshot`] behind a tokio
//! `RwLock` and answers every [`ChainClient`] call from it. Swaps are priced
//! from assimilator rates (no curve slippage), deposits split by current pool
//! weights, and every write produces a receipt that `wait_for_transaction`
//! can return.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use halo_core::{
    Address, ChainError, ChainId, RawAmount, RawDelta, RpcError, TxHash, TxReceipt, VaultPoolId,
};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::vault::{BatchSwapStep, DepositEstimate, FundManagement, PoolTokens, SwapKind};
use crate::{ChainClient, Result};

/// Decimals of assimilator rates
const RATE_DECIMALS: u32 = 8;
/// Decimals of numeraire amounts and ownership units
const NUMERAIRE_DECIMALS: u32 = 18;
/// JSON-RPC code used for reverted calls
const REVERT_CODE: i64 = -32603;

// =============================================================================
// Ledger state
// =============================================================================

/// An ERC-20 token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub balances: BTreeMap<Address, RawAmount>,
    /// owner -> spender -> amount
    #[serde(default)]
    pub allowances: BTreeMap<Address, BTreeMap<Address, RawAmount>>,
}

/// Vault registration of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPoolState {
    pub pool: Address,
    pub tokens: Vec<Address>,
    pub balances: Vec<RawAmount>,
}

/// FX pool settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxPoolState {
    /// token -> assimilator
    #[serde(default)]
    pub assimilators: BTreeMap<Address, Address>,
    /// Report doubled `viewDeposit` estimates
    #[serde(default)]
    pub double_estimate: bool,
}

/// Stake in a pool-id keyed rewards contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmStake {
    pub pid: u64,
    pub user: Address,
    pub amount: RawAmount,
    #[serde(default)]
    pub pending: RawAmount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmRewardsState {
    #[serde(default)]
    pub lp_tokens: Vec<Address>,
    #[serde(default)]
    pub stakes: Vec<AmmStake>,
}

/// Position in a pool-address keyed rewards contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsPosition {
    pub pool: Address,
    pub user: Address,
    #[serde(default)]
    pub deposited: RawAmount,
    #[serde(default)]
    pub unclaimed: RawAmount,
    #[serde(default)]
    pub claimed: RawAmount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsState {
    #[serde(default)]
    pub rewards_token: Option<Address>,
    #[serde(default)]
    pub positions: Vec<RewardsPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairState {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: RawAmount,
    pub reserve1: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeState {
    pub token: Address,
    pub minimum: RawAmount,
}

/// Serializable contents of a [`MemoryChain`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub chain_id: Option<ChainId>,
    #[serde(default)]
    pub account: Option<Address>,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub tokens: BTreeMap<Address, TokenState>,
    #[serde(default)]
    pub vault_pools: HashMap<VaultPoolId, VaultPoolState>,
    #[serde(default)]
    pub fx_pools: BTreeMap<Address, FxPoolState>,
    /// assimilator -> rate (8 decimals)
    #[serde(default)]
    pub assimilator_rates: BTreeMap<Address, RawAmount>,
    #[serde(default)]
    pub amm_rewards: BTreeMap<Address, AmmRewardsState>,
    #[serde(default)]
    pub rewards: BTreeMap<Address, RewardsState>,
    #[serde(default)]
    pub pairs: BTreeMap<Address, PairState>,
    #[serde(default)]
    pub bridges: BTreeMap<Address, BridgeState>,
}

// -----------------------------------------------------------------------------
// Builder
// -----------------------------------------------------------------------------

impl LedgerSnapshot {
    pub fn new(chain_id: ChainId, account: Address) -> Self {
        Self {
            chain_id: Some(chain_id),
            account: Some(account),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_token(mut self, token: &Address, symbol: &str, decimals: u8) -> Self {
        let entry = self.tokens.entry(token.clone()).or_default();
        entry.symbol = symbol.to_string();
        entry.decimals = decimals;
        self
    }

    pub fn with_balance(mut self, token: &Address, owner: &Address, amount: RawAmount) -> Self {
        self.tokens
            .entry(token.clone())
            .or_default()
            .balances
            .insert(owner.clone(), amount);
        self
    }

    pub fn with_allowance(
        mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: RawAmount,
    ) -> Self {
        self.tokens
            .entry(token.clone())
            .or_default()
            .allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
        self
    }

    /// Register a pool with the vault. The pool address is also registered as
    /// an 18-decimal ownership token when not already known.
    pub fn with_vault_pool(
        mut self,
        pool_id: &VaultPoolId,
        pool: &Address,
        tokens: &[(Address, RawAmount)],
    ) -> Self {
        self.vault_pools.insert(
            pool_id.clone(),
            VaultPoolState {
                pool: pool.clone(),
                tokens: tokens.iter().map(|(t, _)| t.clone()).collect(),
                balances: tokens.iter().map(|(_, b)| *b).collect(),
            },
        );
        self.tokens.entry(pool.clone()).or_insert_with(|| TokenState {
            symbol: "HLP".to_string(),
            decimals: NUMERAIRE_DECIMALS as u8,
            ..Default::default()
        });
        self
    }

    pub fn with_assimilator(
        mut self,
        pool: &Address,
        token: &Address,
        assimilator: &Address,
        rate: RawAmount,
    ) -> Self {
        self.fx_pools
            .entry(pool.clone())
            .or_default()
            .assimilators
            .insert(token.clone(), assimilator.clone());
        self.assimilator_rates.insert(assimilator.clone(), rate);
        self
    }

    pub fn with_double_estimate(mut self, pool: &Address) -> Self {
        self.fx_pools.entry(pool.clone()).or_default().double_estimate = true;
        self
    }

    pub fn with_amm_rewards(mut self, contract: &Address, lp_tokens: &[Address]) -> Self {
        self.amm_rewards.entry(contract.clone()).or_default().lp_tokens = lp_tokens.to_vec();
        self
    }

    pub fn with_amm_stake(
        mut self,
        contract: &Address,
        pid: u64,
        user: &Address,
        amount: RawAmount,
        pending: RawAmount,
    ) -> Self {
        self.amm_rewards
            .entry(contract.clone())
            .or_default()
            .stakes
            .push(AmmStake {
                pid,
                user: user.clone(),
                amount,
                pending,
            });
        self
    }

    pub fn with_rewards(mut self, contract: &Address, rewards_token: Option<&Address>) -> Self {
        self.rewards.entry(contract.clone()).or_default().rewards_token = rewards_token.cloned();
        self
    }

    pub fn with_rewards_position(mut self, contract: &Address, position: RewardsPosition) -> Self {
        self.rewards
            .entry(contract.clone())
            .or_default()
            .positions
            .push(position);
        self
    }

    pub fn with_pair(
        mut self,
        pair: &Address,
        token0: (&Address, RawAmount),
        token1: (&Address, RawAmount),
    ) -> Self {
        self.pairs.insert(
            pair.clone(),
            PairState {
                token0: token0.0.clone(),
                token1: token1.0.clone(),
                reserve0: token0.1,
                reserve1: token1.1,
            },
        );
        self
    }

    pub fn with_bridge(mut self, bridge: &Address, token: &Address, minimum: RawAmount) -> Self {
        self.bridges.insert(
            bridge.clone(),
            BridgeState {
                token: token.clone(),
                minimum,
            },
        );
        self
    }
}

// -----------------------------------------------------------------------------
// Ledger queries and transfers
// -----------------------------------------------------------------------------

fn reverted(contract: &Address, message: impl Into<String>) -> ChainError {
    ChainError::Reverted {
        contract: contract.to_string(),
        error: RpcError::new(REVERT_CODE, message),
    }
}

fn unknown(address: &Address) -> ChainError {
    ChainError::UnknownContract {
        address: address.to_string(),
    }
}

fn big(value: RawAmount) -> BigUint {
    BigUint::from(value)
}

fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

fn narrow(contract: &Address, value: &BigUint) -> Result<RawAmount> {
    RawAmount::try_from(value).map_err(|_| reverted(contract, "SafeMath: multiplication overflow"))
}

fn signed(contract: &Address, value: RawAmount) -> Result<RawDelta> {
    RawDelta::try_from(value).map_err(|_| reverted(contract, "SafeCast: value doesn't fit"))
}

/// One executed hop: tokens in and out of a vault pool
struct HopFlow {
    pool_id: VaultPoolId,
    token_in: Address,
    amount_in: RawAmount,
    token_out: Address,
    amount_out: RawAmount,
}

impl LedgerSnapshot {
    fn token(&self, token: &Address) -> Result<&TokenState> {
        self.tokens.get(token).ok_or_else(|| unknown(token))
    }

    fn token_mut(&mut self, token: &Address) -> Result<&mut TokenState> {
        self.tokens.get_mut(token).ok_or_else(|| unknown(token))
    }

    fn balance(&self, token: &Address, owner: &Address) -> Result<RawAmount> {
        Ok(self
            .token(token)?
            .balances
            .get(owner)
            .copied()
            .unwrap_or_default())
    }

    fn allowance_of(&self, token: &Address, owner: &Address, spender: &Address) -> Result<RawAmount> {
        Ok(self
            .token(token)?
            .allowances
            .get(owner)
            .and_then(|s| s.get(spender))
            .copied()
            .unwrap_or_default())
    }

    fn total_supply_of(&self, token: &Address) -> Result<RawAmount> {
        Ok(self.token(token)?.balances.values().sum())
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: RawAmount,
    ) -> Result<()> {
        let state = self.token_mut(token)?;
        let from_balance = state.balances.get(from).copied().unwrap_or_default();
        if from_balance < amount {
            return Err(reverted(token, "ERC20: transfer amount exceeds balance"));
        }
        state.balances.insert(from.clone(), from_balance - amount);
        *state.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }

    fn mint(&mut self, token: &Address, to: &Address, amount: RawAmount) -> Result<()> {
        *self.token_mut(token)?.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }

    fn burn(&mut self, token: &Address, from: &Address, amount: RawAmount) -> Result<()> {
        let state = self.token_mut(token)?;
        let balance = state.balances.get(from).copied().unwrap_or_default();
        if balance < amount {
            return Err(reverted(token, "ERC20: burn amount exceeds balance"));
        }
        state.balances.insert(from.clone(), balance - amount);
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: RawAmount,
    ) -> Result<()> {
        let current = self.allowance_of(token, owner, spender)?;
        if current < amount {
            return Err(reverted(token, "ERC20: transfer amount exceeds allowance"));
        }
        self.token_mut(token)?
            .allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), current - amount);
        Ok(())
    }

    fn vault_pool(&self, pool_id: &VaultPoolId) -> Result<&VaultPoolState> {
        self.vault_pools.get(pool_id).ok_or_else(|| ChainError::UnknownContract {
            address: pool_id.to_string(),
        })
    }

    fn vault_pool_by_address(&self, pool: &Address) -> Result<(&VaultPoolId, &VaultPoolState)> {
        self.vault_pools
            .iter()
            .find(|(_, state)| &state.pool == pool)
            .ok_or_else(|| unknown(pool))
    }

    /// (decimals, 8-decimal rate) of a token inside an FX pool
    fn priced_token(&self, pool: &Address, token: &Address) -> Result<(u32, RawAmount)> {
        let assimilator = self
            .fx_pools
            .get(pool)
            .and_then(|fx| fx.assimilators.get(token))
            .ok_or_else(|| reverted(pool, "Curve/underlying-not-supported"))?;
        let rate = self
            .assimilator_rates
            .get(assimilator)
            .copied()
            .ok_or_else(|| unknown(assimilator))?;
        if rate == 0 {
            return Err(reverted(assimilator, "Assimilator/zero-rate"));
        }
        Ok((self.token(token)?.decimals as u32, rate))
    }

    /// Numeraire value (18 decimals) of each pool balance
    fn pool_numeraires(&self, state: &VaultPoolState) -> Result<Vec<BigUint>> {
        state
            .tokens
            .iter()
            .zip(state.balances.iter())
            .map(|(token, balance)| {
                let (decimals, rate) = self.priced_token(&state.pool, token)?;
                Ok(big(*balance) * big(rate) * pow10(NUMERAIRE_DECIMALS)
                    / (pow10(RATE_DECIMALS) * pow10(decimals)))
            })
            .collect()
    }

    /// Price one hop at assimilator rates
    fn quote_hop(
        &self,
        vault: &Address,
        kind: SwapKind,
        step: &BatchSwapStep,
        assets: &[Address],
        amount: RawAmount,
    ) -> Result<HopFlow> {
        let pool = self.vault_pool(&step.pool_id)?;
        let token_in = assets
            .get(step.asset_in_index)
            .ok_or_else(|| reverted(vault, "BAL#100 OUT_OF_BOUNDS"))?;
        let token_out = assets
            .get(step.asset_out_index)
            .ok_or_else(|| reverted(vault, "BAL#100 OUT_OF_BOUNDS"))?;
        let out_position = pool.tokens.iter().position(|t| t == token_out);
        if !pool.tokens.contains(token_in) || out_position.is_none() {
            return Err(reverted(vault, "BAL#521 TOKEN_NOT_REGISTERED"));
        }

        let (dec_in, rate_in) = self.priced_token(&pool.pool, token_in)?;
        let (dec_out, rate_out) = self.priced_token(&pool.pool, token_out)?;

        let (amount_in, amount_out) = match kind {
            SwapKind::GivenIn => {
                let out = big(amount) * big(rate_in) * pow10(dec_out)
                    / (big(rate_out) * pow10(dec_in));
                (amount, narrow(vault, &out)?)
            }
            SwapKind::GivenOut => {
                let input = big(amount) * big(rate_out) * pow10(dec_in)
                    / (big(rate_in) * pow10(dec_out));
                (narrow(vault, &input)?, amount)
            }
        };

        let available = out_position
            .and_then(|i| pool.balances.get(i))
            .copied()
            .unwrap_or_default();
        if amount_out > available {
            return Err(reverted(vault, "Curve/swap-convergence-failed"));
        }

        Ok(HopFlow {
            pool_id: step.pool_id.clone(),
            token_in: token_in.clone(),
            amount_in,
            token_out: token_out.clone(),
            amount_out,
        })
    }

    /// Walk the hops and return per-asset deltas plus the flows to apply
    fn simulate_batch_swap(
        &self,
        vault: &Address,
        kind: SwapKind,
        swaps: &[BatchSwapStep],
        assets: &[Address],
    ) -> Result<(Vec<RawDelta>, Vec<HopFlow>)> {
        let mut deltas: Vec<RawDelta> = vec![0; assets.len()];
        let mut flows = Vec::with_capacity(swaps.len());
        let mut previous: Option<RawAmount> = None;

        for step in swaps {
            let amount = match (step.amount, previous) {
                (0, Some(carried)) => carried,
                (0, None) => return Err(reverted(vault, "BAL#508 UNKNOWN_AMOUNT_IN_FIRST_SWAP")),
                (explicit, _) => explicit,
            };
            let flow = self.quote_hop(vault, kind, step, assets, amount)?;
            deltas[step.asset_in_index] += signed(vault, flow.amount_in)?;
            deltas[step.asset_out_index] -= signed(vault, flow.amount_out)?;
            previous = Some(match kind {
                SwapKind::GivenIn => flow.amount_out,
                SwapKind::GivenOut => flow.amount_in,
            });
            flows.push(flow);
        }

        Ok((deltas, flows))
    }

    /// `viewDeposit` without the double-estimate quirk
    fn estimate_deposit(&self, pool: &Address, amount: RawAmount) -> Result<DepositEstimate> {
        let (_, state) = self.vault_pool_by_address(pool)?;
        let numeraires = self.pool_numeraires(state)?;
        let total: BigUint = numeraires.iter().sum();
        let count = BigUint::from(state.tokens.len().max(1));

        let mut token_amounts = Vec::with_capacity(state.tokens.len());
        for (token, numeraire) in state.tokens.iter().zip(numeraires.iter()) {
            let share = if total == BigUint::from(0u32) {
                big(amount) / &count
            } else {
                big(amount) * numeraire / &total
            };
            let (decimals, rate) = self.priced_token(pool, token)?;
            let raw = share * pow10(RATE_DECIMALS) * pow10(decimals)
                / (big(rate) * pow10(NUMERAIRE_DECIMALS));
            token_amounts.push(narrow(pool, &raw)?);
        }

        let supply = self.total_supply_of(pool)?;
        let ownership_units = if supply == 0 || total == BigUint::from(0u32) {
            amount
        } else {
            narrow(pool, &(big(amount) * big(supply) / &total))?
        };

        Ok(DepositEstimate {
            ownership_units,
            token_amounts,
        })
    }

    fn estimate_withdraw(&self, pool: &Address, units: RawAmount) -> Result<Vec<RawAmount>> {
        let (_, state) = self.vault_pool_by_address(pool)?;
        let supply = self.total_supply_of(pool)?;
        if supply == 0 {
            return Ok(vec![0; state.tokens.len()]);
        }
        state
            .balances
            .iter()
            .map(|balance| narrow(pool, &(big(*balance) * big(units) / big(supply))))
            .collect()
    }

    fn amm_rewards(&self, contract: &Address) -> Result<&AmmRewardsState> {
        self.amm_rewards.get(contract).ok_or_else(|| unknown(contract))
    }

    fn rewards_state(&self, contract: &Address) -> Result<&RewardsState> {
        self.rewards.get(contract).ok_or_else(|| unknown(contract))
    }

    fn rewards_position(&self, contract: &Address, user: &Address, pool: &Address) -> Result<RewardsPosition> {
        Ok(self
            .rewards_state(contract)?
            .positions
            .iter()
            .find(|p| &p.user == user && &p.pool == pool)
            .cloned()
            .unwrap_or_else(|| RewardsPosition {
                pool: pool.clone(),
                user: user.clone(),
                deposited: 0,
                unclaimed: 0,
                claimed: 0,
            }))
    }

    fn rewards_position_mut(
        &mut self,
        contract: &Address,
        user: &Address,
        pool: &Address,
    ) -> Result<&mut RewardsPosition> {
        let state = self.rewards.get_mut(contract).ok_or_else(|| unknown(contract))?;
        let index = match state
            .positions
            .iter()
            .position(|p| &p.user == user && &p.pool == pool)
        {
            Some(i) => i,
            None => {
                state.positions.push(RewardsPosition {
                    pool: pool.clone(),
                    user: user.clone(),
                    deposited: 0,
                    unclaimed: 0,
                    claimed: 0,
                });
                state.positions.len() - 1
            }
        };
        Ok(&mut state.positions[index])
    }

    fn bridge(&self, bridge: &Address) -> Result<&BridgeState> {
        self.bridges.get(bridge).ok_or_else(|| unknown(bridge))
    }
}

// =============================================================================
// MemoryChain
// =============================================================================

struct Ledger {
    state: LedgerSnapshot,
    receipts: HashMap<TxHash, TxReceipt>,
    tx_count: u64,
    fail_next: Option<ChainError>,
    confirmation_delay: Duration,
}

impl Ledger {
    fn account(&self) -> Result<Address> {
        self.state.account.clone().ok_or(ChainError::NotConnected)
    }

    /// Consume an injected failure before a write touches the ledger
    fn check_injected_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn record(&mut self, summary: &str) -> TxHash {
        self.tx_count += 1;
        self.state.block_number += 1;
        let hash = TxHash::new(format!("0x{:064x}", self.tx_count));
        self.receipts.insert(
            hash.clone(),
            TxReceipt {
                hash: hash.clone(),
                block_number: self.state.block_number,
                success: true,
            },
        );
        tracing::debug!(hash = %hash, block = self.state.block_number, summary, "Mined transaction");
        hash
    }
}

/// Chain client over an in-memory ledger
pub struct MemoryChain {
    ledger: RwLock<Ledger>,
}

impl MemoryChain {
    pub fn new(snapshot: LedgerSnapshot) -> Self {
        Self {
            ledger: RwLock::new(Ledger {
                state: snapshot,
                receipts: HashMap::new(),
                tx_count: 0,
                fail_next: None,
                confirmation_delay: Duration::ZERO,
            }),
        }
    }

    /// Current ledger contents
    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.read().await.state.clone()
    }

    /// Connect or disconnect the wallet account
    pub async fn set_account(&self, account: Option<Address>) {
        self.ledger.write().await.state.account = account;
    }

    pub async fn set_chain_id(&self, chain_id: Option<ChainId>) {
        self.ledger.write().await.state.chain_id = chain_id;
    }

    pub async fn set_assimilator_rate(&self, assimilator: &Address, rate: RawAmount) {
        self.ledger
            .write()
            .await
            .state
            .assimilator_rates
            .insert(assimilator.clone(), rate);
    }

    /// Make the next write fail with `error` without touching the ledger
    pub async fn fail_next_transaction(&self, error: ChainError) {
        self.ledger.write().await.fail_next = Some(error);
    }

    /// Hold every confirmation wait for `delay`, like a slow block
    pub async fn set_confirmation_delay(&self, delay: Duration) {
        self.ledger.write().await.confirmation_delay = delay;
    }

    /// Number of transactions mined so far
    pub async fn transaction_count(&self) -> u64 {
        self.ledger.read().await.tx_count
    }
}

#[async_trait]
impl ChainClient for MemoryChain {
    async fn account(&self) -> Option<Address> {
        self.ledger.read().await.state.account.clone()
    }

    async fn chain_id(&self) -> Option<ChainId> {
        self.ledger.read().await.state.chain_id
    }

    // ERC-20 ---------------------------------------------------------------

    async fn symbol(&self, token: &Address) -> Result<String> {
        Ok(self.ledger.read().await.state.token(token)?.symbol.clone())
    }

    async fn decimals(&self, token: &Address) -> Result<u8> {
        Ok(self.ledger.read().await.state.token(token)?.decimals)
    }

    async fn total_supply(&self, token: &Address) -> Result<RawAmount> {
        self.ledger.read().await.state.total_supply_of(token)
    }

    async fn balance_of(&self, token: &Address, owner: &Address) -> Result<RawAmount> {
        self.ledger.read().await.state.balance(token, owner)
    }

    async fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<RawAmount> {
        self.ledger.read().await.state.allowance_of(token, owner, spender)
    }

    async fn approve(
        &self,
        token: &Address,
        spender: &Address,
        amount: RawAmount,
    ) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;
        ledger
            .state
            .token_mut(token)?
            .allowances
            .entry(account)
            .or_default()
            .insert(spender.clone(), amount);
        Ok(ledger.record("approve"))
    }

    // Vault ----------------------------------------------------------------

    async fn get_pool_tokens(&self, _vault: &Address, pool_id: &VaultPoolId) -> Result<PoolTokens> {
        let ledger = self.ledger.read().await;
        let pool = ledger.state.vault_pool(pool_id)?;
        Ok(PoolTokens {
            tokens: pool.tokens.clone(),
            balances: pool.balances.clone(),
            last_change_block: ledger.state.block_number,
        })
    }

    async fn query_batch_swap(
        &self,
        vault: &Address,
        kind: SwapKind,
        swaps: &[BatchSwapStep],
        assets: &[Address],
        _funds: &FundManagement,
    ) -> Result<Vec<RawDelta>> {
        let ledger = self.ledger.read().await;
        let (deltas, _) = ledger.state.simulate_batch_swap(vault, kind, swaps, assets)?;
        Ok(deltas)
    }

    async fn batch_swap(
        &self,
        vault: &Address,
        kind: SwapKind,
        swaps: &[BatchSwapStep],
        assets: &[Address],
        funds: &FundManagement,
        limits: &[RawDelta],
        _deadline: u128,
    ) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        ledger.account()?;
        ledger.check_injected_failure()?;

        let (deltas, flows) = ledger.state.simulate_batch_swap(vault, kind, swaps, assets)?;
        if limits.len() != assets.len() {
            return Err(reverted(vault, "BAL#103 INPUT_LENGTH_MISMATCH"));
        }
        if deltas.iter().zip(limits.iter()).any(|(delta, limit)| delta > limit) {
            return Err(reverted(vault, "BAL#507 SWAP_LIMIT"));
        }

        // Validate every pull before moving anything
        for (asset, delta) in assets.iter().zip(deltas.iter()) {
            if *delta > 0 {
                let needed = delta.unsigned_abs();
                if ledger.state.allowance_of(asset, &funds.sender, vault)? < needed {
                    return Err(reverted(asset, "ERC20: transfer amount exceeds allowance"));
                }
                if ledger.state.balance(asset, &funds.sender)? < needed {
                    return Err(reverted(asset, "ERC20: transfer amount exceeds balance"));
                }
            }
        }

        for (asset, delta) in assets.iter().zip(deltas.iter()) {
            let amount = delta.unsigned_abs();
            if *delta > 0 {
                ledger.state.spend_allowance(asset, &funds.sender, vault, amount)?;
                ledger.state.transfer(asset, &funds.sender, vault, amount)?;
            } else if *delta < 0 {
                ledger.state.mint(asset, &funds.recipient, amount)?;
            }
        }

        for flow in flows {
            if let Some(pool) = ledger.state.vault_pools.get_mut(&flow.pool_id) {
                for (token, balance) in pool.tokens.iter().zip(pool.balances.iter_mut()) {
                    if token == &flow.token_in {
                        *balance += flow.amount_in;
                    } else if token == &flow.token_out {
                        *balance = balance.saturating_sub(flow.amount_out);
                    }
                }
            }
        }

        Ok(ledger.record("batchSwap"))
    }

    // FX pool --------------------------------------------------------------

    async fn assimilator(&self, pool: &Address, token: &Address) -> Result<Address> {
        let ledger = self.ledger.read().await;
        ledger
            .state
            .fx_pools
            .get(pool)
            .ok_or_else(|| unknown(pool))?
            .assimilators
            .get(token)
            .cloned()
            .ok_or_else(|| reverted(pool, "Curve/underlying-not-supported"))
    }

    async fn assimilator_rate(&self, assimilator: &Address) -> Result<RawAmount> {
        self.ledger
            .read()
            .await
            .state
            .assimilator_rates
            .get(assimilator)
            .copied()
            .ok_or_else(|| unknown(assimilator))
    }

    async fn view_deposit(&self, pool: &Address, amount: RawAmount) -> Result<DepositEstimate> {
        let ledger = self.ledger.read().await;
        let mut estimate = ledger.state.estimate_deposit(pool, amount)?;
        let doubled = ledger
            .state
            .fx_pools
            .get(pool)
            .map(|fx| fx.double_estimate)
            .unwrap_or(false);
        if doubled {
            estimate.ownership_units *= 2;
            for token_amount in estimate.token_amounts.iter_mut() {
                *token_amount *= 2;
            }
        }
        Ok(estimate)
    }

    async fn deposit(&self, pool: &Address, amount: RawAmount, _deadline: u64) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;

        let estimate = ledger.state.estimate_deposit(pool, amount)?;
        let (pool_id, state) = ledger.state.vault_pool_by_address(pool)?;
        let pool_id = pool_id.clone();
        let tokens = state.tokens.clone();

        for (token, needed) in tokens.iter().zip(estimate.token_amounts.iter()) {
            if ledger.state.balance(token, &account)? < *needed {
                return Err(reverted(token, "ERC20: transfer amount exceeds balance"));
            }
        }
        for (token, needed) in tokens.iter().zip(estimate.token_amounts.iter()) {
            ledger.state.burn(token, &account, *needed)?;
        }
        if let Some(state) = ledger.state.vault_pools.get_mut(&pool_id) {
            for (balance, added) in state.balances.iter_mut().zip(estimate.token_amounts.iter()) {
                *balance += added;
            }
        }
        ledger.state.mint(pool, &account, estimate.ownership_units)?;

        Ok(ledger.record("deposit"))
    }

    async fn view_withdraw(&self, pool: &Address, amount: RawAmount) -> Result<Vec<RawAmount>> {
        self.ledger.read().await.state.estimate_withdraw(pool, amount)
    }

    async fn withdraw(&self, pool: &Address, amount: RawAmount, _deadline: u64) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;

        let amounts = ledger.state.estimate_withdraw(pool, amount)?;
        ledger.state.burn(pool, &account, amount)?;

        let (pool_id, state) = ledger.state.vault_pool_by_address(pool)?;
        let pool_id = pool_id.clone();
        let tokens = state.tokens.clone();
        for (token, out) in tokens.iter().zip(amounts.iter()) {
            ledger.state.mint(token, &account, *out)?;
        }
        if let Some(state) = ledger.state.vault_pools.get_mut(&pool_id) {
            for (balance, removed) in state.balances.iter_mut().zip(amounts.iter()) {
                *balance = balance.saturating_sub(*removed);
            }
        }

        Ok(ledger.record("withdraw"))
    }

    // Pool-id keyed rewards ------------------------------------------------

    async fn pool_length(&self, rewards: &Address) -> Result<u64> {
        Ok(self.ledger.read().await.state.amm_rewards(rewards)?.lp_tokens.len() as u64)
    }

    async fn lp_token(&self, rewards: &Address, pid: u64) -> Result<Address> {
        self.ledger
            .read()
            .await
            .state
            .amm_rewards(rewards)?
            .lp_tokens
            .get(pid as usize)
            .cloned()
            .ok_or_else(|| reverted(rewards, "invalid pool id"))
    }

    async fn user_info(&self, rewards: &Address, pid: u64, user: &Address) -> Result<RawAmount> {
        Ok(self
            .ledger
            .read()
            .await
            .state
            .amm_rewards(rewards)?
            .stakes
            .iter()
            .find(|s| s.pid == pid && &s.user == user)
            .map(|s| s.amount)
            .unwrap_or_default())
    }

    async fn pending_reward_token(
        &self,
        rewards: &Address,
        pid: u64,
        user: &Address,
    ) -> Result<RawAmount> {
        Ok(self
            .ledger
            .read()
            .await
            .state
            .amm_rewards(rewards)?
            .stakes
            .iter()
            .find(|s| s.pid == pid && &s.user == user)
            .map(|s| s.pending)
            .unwrap_or_default())
    }

    // Pool-address keyed rewards --------------------------------------------

    async fn claimed_and_unclaimed_rewards(
        &self,
        rewards: &Address,
        user: &Address,
        pool: &Address,
    ) -> Result<RawAmount> {
        let position = self
            .ledger
            .read()
            .await
            .state
            .rewards_position(rewards, user, pool)?;
        Ok(position.claimed + position.unclaimed)
    }

    async fn unclaimed_rewards(
        &self,
        rewards: &Address,
        user: &Address,
        pool: &Address,
    ) -> Result<RawAmount> {
        Ok(self
            .ledger
            .read()
            .await
            .state
            .rewards_position(rewards, user, pool)?
            .unclaimed)
    }

    async fn deposited_pool_tokens(
        &self,
        rewards: &Address,
        user: &Address,
        pool: &Address,
    ) -> Result<RawAmount> {
        Ok(self
            .ledger
            .read()
            .await
            .state
            .rewards_position(rewards, user, pool)?
            .deposited)
    }

    async fn deposit_pool_tokens(
        &self,
        rewards: &Address,
        pool: &Address,
        amount: RawAmount,
    ) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;
        ledger.state.rewards_state(rewards)?;

        ledger.state.transfer(pool, &account, rewards, amount)?;
        ledger
            .state
            .rewards_position_mut(rewards, &account, pool)?
            .deposited += amount;
        Ok(ledger.record("depositPoolTokens"))
    }

    async fn withdraw_pool_tokens(
        &self,
        rewards: &Address,
        pool: &Address,
        amount: RawAmount,
    ) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;

        let deposited = ledger.state.rewards_position(rewards, &account, pool)?.deposited;
        if deposited < amount {
            return Err(reverted(rewards, "SafeMath: subtraction overflow"));
        }
        ledger.state.transfer(pool, rewards, &account, amount)?;
        ledger
            .state
            .rewards_position_mut(rewards, &account, pool)?
            .deposited -= amount;
        Ok(ledger.record("withdrawPoolTokens"))
    }

    async fn withdraw_unclaimed_rewards(
        &self,
        rewards: &Address,
        pool: &Address,
    ) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;

        let rewards_token = ledger.state.rewards_state(rewards)?.rewards_token.clone();
        let position = ledger.state.rewards_position_mut(rewards, &account, pool)?;
        let payout = position.unclaimed;
        position.claimed += payout;
        position.unclaimed = 0;

        if let Some(token) = rewards_token {
            ledger.state.mint(&token, &account, payout)?;
        }
        Ok(ledger.record("withdrawUnclaimedPoolRewards"))
    }

    // Pairs ------------------------------------------------------------------

    async fn pair_tokens(&self, pair: &Address) -> Result<(Address, Address)> {
        let ledger = self.ledger.read().await;
        let state = ledger.state.pairs.get(pair).ok_or_else(|| unknown(pair))?;
        Ok((state.token0.clone(), state.token1.clone()))
    }

    async fn pair_reserves(&self, pair: &Address) -> Result<(RawAmount, RawAmount)> {
        let ledger = self.ledger.read().await;
        let state = ledger.state.pairs.get(pair).ok_or_else(|| unknown(pair))?;
        Ok((state.reserve0, state.reserve1))
    }

    // Bridge -----------------------------------------------------------------

    async fn bridge_minimum(&self, bridge: &Address) -> Result<RawAmount> {
        Ok(self.ledger.read().await.state.bridge(bridge)?.minimum)
    }

    async fn bridge_deposit(
        &self,
        bridge: &Address,
        amount: RawAmount,
        destination: ChainId,
    ) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;

        let state = ledger.state.bridge(bridge)?.clone();
        if amount < state.minimum {
            return Err(reverted(bridge, "Bridge: amount below minimum"));
        }
        if ledger.state.balance(&state.token, &account)? < amount {
            return Err(reverted(&state.token, "ERC20: transfer amount exceeds balance"));
        }
        ledger
            .state
            .spend_allowance(&state.token, &account, bridge, amount)?;
        ledger.state.transfer(&state.token, &account, bridge, amount)?;
        tracing::debug!(%bridge, amount = %amount, destination = %destination, "Bridge deposit");
        Ok(ledger.record("deposit"))
    }

    async fn bridge_burn(&self, bridge: &Address, amount: RawAmount) -> Result<TxHash> {
        let mut ledger = self.ledger.write().await;
        let account = ledger.account()?;
        ledger.check_injected_failure()?;

        let state = ledger.state.bridge(bridge)?.clone();
        if amount < state.minimum {
            return Err(reverted(bridge, "Bridge: amount below minimum"));
        }
        if ledger.state.balance(&state.token, &account)? < amount {
            return Err(reverted(&state.token, "ERC20: burn amount exceeds balance"));
        }
        ledger
            .state
            .spend_allowance(&state.token, &account, bridge, amount)?;
        ledger.state.burn(&state.token, &account, amount)?;
        Ok(ledger.record("burn"))
    }

    // Transactions -----------------------------------------------------------

    async fn wait_for_transaction(&self, hash: &TxHash) -> Result<TxReceipt> {
        let delay = self.ledger.read().await.confirmation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.ledger
            .read()
            .await
            .receipts
            .get(hash)
            .cloned()
            .ok_or_else(|| ChainError::TransactionNotFound {
                hash: hash.to_string(),
            })
    }
}
