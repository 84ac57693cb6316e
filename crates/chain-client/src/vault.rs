//! Vault call types
//!
//! Argument and return shapes for `getPoolTokens`, `queryBatchSwap`,
//! `batchSwap` and the FX pool deposit estimate.

use halo_core::{Address, RawAmount, VaultPoolId};
use serde::{Deserialize, Serialize};

/// Batch swap kind (`uint8 kind` on the vault)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapKind {
    /// Exact input amount, output is quoted
    GivenIn = 0,
    /// Exact output amount, input is quoted
    GivenOut = 1,
}

impl SwapKind {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One hop of a batch swap. Indices refer to the batch's asset table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSwapStep {
    pub pool_id: VaultPoolId,
    pub asset_in_index: usize,
    pub asset_out_index: usize,
    /// Amount for this hop; zero means "use the previous hop's result"
    pub amount: RawAmount,
    #[serde(default)]
    pub user_data: Vec<u8>,
}

/// Sender/recipient settings of a batch swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundManagement {
    pub sender: Address,
    pub from_internal_balance: bool,
    pub recipient: Address,
    pub to_internal_balance: bool,
}

impl FundManagement {
    /// Trade from and to the account's wallet balance
    pub fn external(account: &Address) -> Self {
        Self {
            sender: account.clone(),
            from_internal_balance: false,
            recipient: account.clone(),
            to_internal_balance: false,
        }
    }
}

/// `getPoolTokens` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTokens {
    pub tokens: Vec<Address>,
    pub balances: Vec<RawAmount>,
    pub last_change_block: u64,
}

/// `viewDeposit` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEstimate {
    /// Ownership units minted (18 decimals)
    pub ownership_units: RawAmount,
    /// Token amounts taken, in pool order
    pub token_amounts: Vec<RawAmount>,
}
