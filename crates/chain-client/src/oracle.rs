//! USD price oracle
//!
//! Prices are looked up either by token contract address or by the price
//! provider's coin id. Keys in the returned map are lowercase.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use halo_core::OracleConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// USD prices keyed by lowercase address or coin id
pub type PriceMap = HashMap<String, f64>;

const ORACLE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How price keys are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GetPriceBy {
    /// Token contract addresses on the configured platform
    Address,
    /// Provider coin ids (e.g. `halodao`)
    Id,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Price request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price API returned status {status}")]
    Status { status: u16 },

    #[error("Price oracle unavailable: {message}")]
    Unavailable { message: String },
}

#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn usd_prices(&self, by: GetPriceBy, keys: &[String]) -> Result<PriceMap, OracleError>;
}

// =============================================================================
// HTTP oracle
// =============================================================================

/// CoinGecko `simple/price` and `simple/token_price` client
#[derive(Clone)]
pub struct CoinGeckoOracle {
    client: reqwest::Client,
    base_url: String,
    platform: String,
}

impl CoinGeckoOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .user_agent("halo")
            .timeout(ORACLE_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            platform: config.platform.clone(),
        })
    }

    fn request_url(&self, by: GetPriceBy, keys: &[String]) -> String {
        let joined = keys
            .iter()
            .map(|k| k.to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        match by {
            GetPriceBy::Address => format!(
                "{}/simple/token_price/{}?contract_addresses={}&vs_currencies=usd",
                self.base_url, self.platform, joined
            ),
            GetPriceBy::Id => format!(
                "{}/simple/price?ids={}&vs_currencies=usd",
                self.base_url, joined
            ),
        }
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoOracle {
    async fn usd_prices(&self, by: GetPriceBy, keys: &[String]) -> Result<PriceMap, OracleError> {
        if keys.is_empty() {
            return Ok(PriceMap::new());
        }

        let url = self.request_url(by, keys);
        tracing::debug!(%url, "Fetching USD prices");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(OracleError::Status {
                status: response.status().as_u16(),
            });
        }

        let body: HashMap<String, HashMap<String, f64>> = response.json().await?;
        Ok(parse_usd_prices(body))
    }
}

/// Flatten `{"key": {"usd": 1.0}}` into `{"key": 1.0}`
fn parse_usd_prices(body: HashMap<String, HashMap<String, f64>>) -> PriceMap {
    body.into_iter()
        .filter_map(|(key, quotes)| quotes.get("usd").map(|p| (key.to_lowercase(), *p)))
        .collect()
}

// =============================================================================
// Static oracle
// =============================================================================

/// Fixed price table, for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticPriceOracle {
    prices: PriceMap,
    unavailable: bool,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, key: impl AsRef<str>, usd: f64) -> Self {
        self.prices.insert(key.as_ref().to_lowercase(), usd);
        self
    }

    /// An oracle whose every lookup fails
    pub fn unavailable() -> Self {
        Self {
            prices: PriceMap::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn usd_prices(&self, _by: GetPriceBy, keys: &[String]) -> Result<PriceMap, OracleError> {
        if self.unavailable {
            return Err(OracleError::Unavailable {
                message: "static oracle configured as unavailable".to_string(),
            });
        }
        Ok(keys
            .iter()
            .filter_map(|k| {
                let key = k.to_lowercase();
                self.prices.get(&key).map(|p| (key, *p))
            })
            .collect())
    }
}
