//! Halo API server
//!
//! Usage: `halo <config.json> [ledger.json]`
//!
//! The ledger snapshot backs the chain client. Without one the server starts
//! detached and chain-backed routes answer 503.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chain_client::{CoinGeckoOracle, LedgerSnapshot, MemoryChain, SharedChainClient};
use halo_api::AppState;
use halo_core::AppConfig;

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("halo=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();
    Ok(())
}

fn load_chain(path: &Path) -> anyhow::Result<SharedChainClient> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading ledger snapshot {}", path.display()))?;
    let snapshot = LedgerSnapshot::from_json_str(&raw)
        .with_context(|| format!("parsing ledger snapshot {}", path.display()))?;
    Ok(Arc::new(MemoryChain::new(snapshot)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let mut args = std::env::args().skip(1);
    let config_path = args.next().context("usage: halo <config.json> [ledger.json]")?;
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path))?;

    tracing::info!(
        chain_id = %config.chain.chain_id,
        enabled = config.pools.enabled.len(),
        disabled = config.pools.disabled.len(),
        "Starting Halo"
    );

    let oracle = Arc::new(CoinGeckoOracle::new(&config.oracle)?);
    let state = match args.next() {
        Some(ledger) => {
            let chain = load_chain(Path::new(&ledger))?;
            AppState::with_chain(config, oracle, chain)
        }
        None => {
            tracing::warn!("No ledger snapshot given, chain routes are unavailable");
            AppState::new(config, oracle)
        }
    };

    halo_api::start_server(state).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_files_load() {
        let config = AppConfig::from_json_str(include_str!("../../demos/halo.json")).unwrap();
        assert_eq!(config.pools.enabled.len(), 1);
        assert!(config.rewards_contract().is_ok());

        let ledger = LedgerSnapshot::from_json_str(include_str!("../../demos/ledger.json")).unwrap();
        assert_eq!(ledger.chain_id, Some(config.chain.chain_id));
        assert!(ledger.vault_pools.contains_key(&config.pools.enabled[0].pool_id));
    }
}
