//! Farm state types

use std::collections::HashMap;

use halo_core::{Address, AmountError, ChainError, ConfigError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-pool figures in display units, keyed by pool address
pub type PerPool = HashMap<Address, f64>;

/// Caller's position across the rewards program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmPositions {
    /// Claimed plus unclaimed rewards
    pub rewards_earned: PerPool,
    /// Rewards available to claim
    pub unclaimed: PerPool,
    /// Staked ownership units
    pub staked: PerPool,
}

/// Farm errors
#[derive(Debug, Error)]
pub enum FarmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
}

impl FarmError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "farm_not_configured",
            Self::Chain(e) => e.error_code(),
            Self::InvalidAmount(_) => "invalid_amount",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 404,
            Self::Chain(e) => e.status_code(),
            Self::InvalidAmount(_) => 400,
        }
    }
}
