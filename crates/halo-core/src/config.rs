//! Configuration types for Halo
//!
//! The configuration is built once (usually deserialized from JSON) and then
//! handed to the registry, router, farm and bridge by reference. Core logic
//! never reads process environment.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::types::{Address, ChainId, VaultPoolId};

/// A pool known to the deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool contract address (also the ownership-unit token)
    pub address: Address,
    /// Vault pool ID used by batch swaps
    pub pool_id: VaultPoolId,
    /// Pool assets in pool order
    pub assets: Vec<Address>,
}

impl PoolConfig {
    pub fn contains(&self, token: &Address) -> bool {
        self.assets.iter().any(|a| a == token)
    }
}

/// Static pool lists for one deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolsConfig {
    /// Pools open for deposits and swaps
    #[serde(default)]
    pub enabled: Vec<PoolConfig>,
    /// Pools that only allow withdrawals
    #[serde(default)]
    pub disabled: Vec<PoolConfig>,
    /// Pools hidden from the farm listing
    #[serde(default)]
    pub inactive: Vec<Address>,
    /// Pools whose `viewDeposit` reports doubled estimates
    #[serde(default)]
    pub double_estimate: Vec<Address>,
}

impl PoolsConfig {
    pub fn is_inactive(&self, pool: &Address) -> bool {
        self.inactive.contains(pool)
    }

    pub fn is_double_estimate(&self, pool: &Address) -> bool {
        self.double_estimate.contains(pool)
    }

    /// Find a configured pool (enabled or disabled) by address
    pub fn find(&self, pool: &Address) -> Option<&PoolConfig> {
        self.enabled
            .iter()
            .chain(self.disabled.iter())
            .find(|p| &p.address == pool)
    }
}

/// Contract addresses for one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Batch-swap vault
    pub vault: Address,
    /// Pool-id keyed rewards contract (poolLength / lpToken / userInfo)
    #[serde(default)]
    pub amm_rewards: Option<Address>,
    /// Pool-address keyed rewards contract used by the farm
    #[serde(default)]
    pub rewards: Option<Address>,
    /// Token paid out as farming rewards
    #[serde(default)]
    pub rewards_token: Option<Address>,
    /// Bridge contract for the bridged governance token
    #[serde(default)]
    pub bridge: Option<Address>,
}

/// Chain selection and contract addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub contracts: ContractsConfig,
}

/// Price oracle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the price API
    pub url: String,
    /// Platform slug used for by-address lookups
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_platform() -> String {
    "ethereum".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: "https://api.coingecko.com/api/v3".to_string(),
            platform: default_platform(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chain and contract settings
    pub chain: ChainConfig,

    /// Known pools
    #[serde(default)]
    pub pools: PoolsConfig,

    /// Price oracle settings
    #[serde(default)]
    pub oracle: OracleConfig,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_api_port() -> u16 {
    19080
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig {
                chain_id: ChainId::MAINNET,
                contracts: ContractsConfig {
                    vault: Address::zero(),
                    amm_rewards: None,
                    rewards: None,
                    rewards_token: None,
                    bridge: None,
                },
            },
            pools: PoolsConfig::default(),
            oracle: OracleConfig::default(),
            api_port: default_api_port(),
        }
    }
}

impl AppConfig {
    /// Parse a JSON config document and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Reject configurations with duplicated pool addresses
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for pool in self.pools.enabled.iter().chain(self.pools.disabled.iter()) {
            if !seen.insert(&pool.address) {
                return Err(ConfigError::Parse {
                    message: format!("pool {} is listed more than once", pool.address),
                });
            }
            if pool.assets.len() < 2 {
                return Err(ConfigError::Parse {
                    message: format!("pool {} must list at least two assets", pool.address),
                });
            }
        }
        Ok(())
    }

    /// Rewards contract keyed by pool address, or an error naming the chain
    pub fn rewards_contract(&self) -> Result<&Address, ConfigError> {
        self.chain
            .contracts
            .rewards
            .as_ref()
            .ok_or_else(|| ConfigError::MissingContract {
                contract: "rewards",
                chain: self.chain.chain_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chain": {
            "chain_id": 137,
            "contracts": {
                "vault": "0xBA12222222228d8Ba445958a75a0704d566BF2C8",
                "amm_rewards": "0x0000000000000000000000000000000000000a11"
            }
        },
        "pools": {
            "enabled": [{
                "address": "0x1A5A5C245A09CC4902D552B833D438F85E96BA89",
                "pool_id": "0x1a5a5c245a09cc4902d552b833d438f85e96ba890002000000000000000007e7",
                "assets": [
                    "0x0000000000000000000000000000000000000001",
                    "0x0000000000000000000000000000000000000002"
                ]
            }]
        }
    }"#;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chain.chain_id, ChainId::MAINNET);
        assert_eq!(config.api_port, 19080);
        assert!(config.pools.enabled.is_empty());
    }

    #[test]
    fn test_config_from_json() {
        let config = AppConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.chain.chain_id, ChainId::MATIC);
        assert_eq!(config.pools.enabled.len(), 1);
        let pool = &config.pools.enabled[0];
        assert_eq!(
            pool.address.as_str(),
            "0x1a5a5c245a09cc4902d552b833d438f85e96ba89"
        );
        assert!(config.pools.find(&pool.address).is_some());
        assert_eq!(config.oracle, OracleConfig::default());
    }

    #[test]
    fn test_config_rejects_duplicate_pools() {
        let mut config = AppConfig::from_json_str(SAMPLE).unwrap();
        let pool = config.pools.enabled[0].clone();
        config.pools.disabled.push(pool);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_rewards_contract() {
        let config = AppConfig::from_json_str(SAMPLE).unwrap();
        let err = config.rewards_contract().unwrap_err();
        assert!(err.to_string().contains("rewards"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::from_json_str(SAMPLE).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = AppConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
