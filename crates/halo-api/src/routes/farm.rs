//! Farm routes

use axum::{extract::State, routing::get, Json, Router};

use amm::{fetch_pools, resolve_pool_catalog, ValuationSummary};
use farm::{farm_pools, fetch_farm_summary, RewardsProgram};

use super::{failure, require_chain, ApiFailure};
use crate::AppState;

/// Create farm routes
pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(get_summary))
}

/// GET /farm/summary - Stakeable value, staked value and rewards earned
async fn get_summary(State(state): State<AppState>) -> Result<Json<ValuationSummary>, ApiFailure> {
    let client = require_chain(&state).await?;
    let program = RewardsProgram::new(client.clone(), state.config())
        .map_err(|e| failure(e.status_code(), e.error_code(), e))?;

    let catalog = resolve_pool_catalog(client.as_ref(), state.config()).await;
    let pools = fetch_pools(client.as_ref(), state.config(), &catalog)
        .await
        .map_err(|e| failure(e.status_code(), e.error_code(), e))?;
    let pools = farm_pools(&pools, state.config());

    fetch_farm_summary(&program, state.oracle(), &pools)
        .await
        .map(Json)
        .map_err(|e| failure(e.status_code(), e.error_code(), e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use chain_client::StaticPriceOracle;

    use crate::routes::test_support::{chain, config, connected_state, send};
    use crate::AppState;

    #[tokio::test]
    async fn test_summary() {
        let (status, body) = send(connected_state(), "GET", "/farm/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        // 1,000 USD per unit: 10 held, 5 staked; 4 DSRT at 2 USD
        assert_eq!(body["stakeable_value"], "$10,000.00");
        assert_eq!(body["staked_value"], "$5,000.00");
        assert_eq!(body["rewards_earned"], "8");
    }

    #[tokio::test]
    async fn test_summary_without_rewards_contract() {
        let mut config = config();
        config.chain.contracts.rewards = None;
        let state = AppState::with_chain(config, Arc::new(StaticPriceOracle::new()), chain());

        let (status, body) = send(state, "GET", "/farm/summary", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "farm_not_configured");
    }
}
