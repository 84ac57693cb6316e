//! Serializable bridge panel state

use halo_core::{Address, AmountError, ChainError, ChainId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primary button of the bridge panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    /// Approve first, then continue
    Default,
    EnterAmount,
    NotMinimum,
    Next,
    MaxCap,
    InsufficientBalance,
    Confirming,
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproveState {
    NotApproved,
    Approving,
    Approved,
}

/// Transaction modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalState {
    NotConfirmed,
    InProgress,
    Successful,
}

/// Combined panel state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgePanelState {
    pub button: ButtonState,
    pub approve: ApproveState,
    pub modal: ModalState,
}

impl Default for BridgePanelState {
    fn default() -> Self {
        Self {
            button: ButtonState::EnterAmount,
            approve: ApproveState::NotApproved,
            modal: ModalState::NotConfirmed,
        }
    }
}

/// Token moved by a bridge contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeToken {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    /// Chain the token was originally issued on
    pub origin_chain: ChainId,
}

/// How tokens leave the current chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeMethod {
    /// Lock on the origin chain
    Deposit,
    /// Burn the wrapped token
    Burn,
}

/// Bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid destination address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Unsupported destination chain: {chain}")]
    UnsupportedChain { chain: u64 },

    #[error("Destination chain must differ from the current chain ({chain})")]
    SameChain { chain: ChainId },
}

impl BridgeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Chain(e) => e.error_code(),
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::UnsupportedChain { .. } => "unsupported_chain",
            Self::SameChain { .. } => "same_chain",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Chain(e) => e.status_code(),
            _ => 400,
        }
    }
}
