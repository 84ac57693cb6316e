//! Core type definitions for Halo

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// EVM account or contract address (20 bytes, lowercase `0x` hex)
///
/// Addresses are normalised to lowercase on construction so that the natural
/// string ordering is the lexicographic ordering used for batch-swap asset
/// tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalise an address. Accepts mixed-case (checksummed) input.
    pub fn parse(addr: &str) -> Result<Self, ConfigError> {
        let trimmed = addr.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ConfigError::InvalidAddress {
                address: addr.to_string(),
                reason: "missing 0x prefix".to_string(),
            })?;

        let bytes = hex::decode(body).map_err(|e| ConfigError::InvalidAddress {
            address: addr.to_string(),
            reason: e.to_string(),
        })?;
        if bytes.len() != 20 {
            return Err(ConfigError::InvalidAddress {
                address: addr.to_string(),
                reason: format!("expected 20 bytes, found {}", bytes.len()),
            });
        }

        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    /// The zero address
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First bytes of the address for log lines (`0x1a2b3c`)
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl FromStr for Address {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vault pool ID (32 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultPoolId(pub String);

impl VaultPoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultPoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (32 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// EVM chain ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
    pub const KOVAN: ChainId = ChainId(42);
    pub const MATIC: ChainId = ChainId(137);
    pub const ARBITRUM: ChainId = ChainId(42161);
    pub const ARBITRUM_RINKEBY: ChainId = ChainId(421611);

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Human-readable network name
    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "mainnet",
            42 => "kovan",
            137 => "matic",
            42161 => "arbitrum",
            421611 => "arbitrum-rinkeby",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// A submitted transaction together with the summary shown in the
/// transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSubmission {
    pub hash: TxHash,
    pub summary: String,
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: u64,
    pub success: bool,
}

/// Raw token amount in base units (wei-style)
pub type RawAmount = u128;

/// Signed raw amount, as returned by batch-swap asset deltas
pub type RawDelta = i128;
