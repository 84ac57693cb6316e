//! Application state shared across API handlers

use std::sync::Arc;

use chain_client::{PriceOracle, SharedChainClient};
use halo_core::AppConfig;
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    chain: RwLock<Option<SharedChainClient>>,
    oracle: Arc<dyn PriceOracle>,
}

impl AppState {
    /// State without a chain client; chain-backed routes answer 503 until
    /// one is attached
    pub fn new(config: AppConfig, oracle: Arc<dyn PriceOracle>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                chain: RwLock::new(None),
                oracle,
            }),
        }
    }

    pub fn with_chain(config: AppConfig, oracle: Arc<dyn PriceOracle>, chain: SharedChainClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                chain: RwLock::new(Some(chain)),
                oracle,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn oracle(&self) -> &dyn PriceOracle {
        self.inner.oracle.as_ref()
    }

    pub async fn chain_client(&self) -> Option<SharedChainClient> {
        self.inner.chain.read().await.clone()
    }

    /// Attach or detach the chain client
    pub async fn set_chain_client(&self, chain: Option<SharedChainClient>) {
        let attached = chain.is_some();
        *self.inner.chain.write().await = chain;
        tracing::info!(attached, "Chain client updated");
    }
}
