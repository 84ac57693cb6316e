//! Pool registry routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use amm::{fetch_pools, resolve_pool_catalog, LiquidityEstimate, Pool, PoolLiquidity};
use halo_core::Address;

use super::{failure, require_chain, ApiFailure};
use crate::dto::{ApiError, LiquidityRequest, PoolDto, PoolsResponse};
use crate::AppState;

/// Create pool routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_pools))
        .route("/:address", get(get_pool))
        .route("/:address/deposit/preview", post(preview_deposit))
        .route("/:address/withdraw/preview", post(preview_withdraw))
}

/// Every catalogued pool; empty while no account is connected
async fn load_pools(state: &AppState) -> Result<Vec<Pool>, ApiFailure> {
    let client = require_chain(state).await?;
    let catalog = resolve_pool_catalog(client.as_ref(), state.config()).await;
    fetch_pools(client.as_ref(), state.config(), &catalog)
        .await
        .map_err(|e| failure(e.status_code(), e.error_code(), e))
}

async fn find_pool(state: &AppState, address: &str) -> Result<Pool, ApiFailure> {
    let address = Address::parse(address).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request(e.to_string())),
        )
    })?;
    load_pools(state)
        .await?
        .into_iter()
        .find(|p| p.address == address)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!("Pool not found: {}", address))),
            )
        })
}

/// GET /pools - All pools with composition and the caller's position
async fn get_pools(State(state): State<AppState>) -> Result<Json<PoolsResponse>, ApiFailure> {
    let pools: Vec<PoolDto> = load_pools(&state).await?.into_iter().map(Into::into).collect();
    let count = pools.len();
    Ok(Json(PoolsResponse { pools, count }))
}

/// GET /pools/:address
async fn get_pool(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PoolDto>, ApiFailure> {
    Ok(Json(find_pool(&state, &address).await?.into()))
}

/// POST /pools/:address/deposit/preview - Token amounts for adding liquidity
async fn preview_deposit(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<LiquidityRequest>,
) -> Result<Json<LiquidityEstimate>, ApiFailure> {
    let client = require_chain(&state).await?;
    let pool = find_pool(&state, &address).await?;
    let estimate = PoolLiquidity::new(client, state.config(), pool)
        .view_deposit(&request.amount)
        .await
        .map_err(|e| failure(e.status_code(), e.error_code(), e))?;
    Ok(Json(estimate))
}

/// POST /pools/:address/withdraw/preview - Token amounts released by a withdrawal
async fn preview_withdraw(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<LiquidityRequest>,
) -> Result<Json<Vec<String>>, ApiFailure> {
    let client = require_chain(&state).await?;
    let pool = find_pool(&state, &address).await?;
    let amounts = PoolLiquidity::new(client, state.config(), pool)
        .view_withdraw(&request.amount)
        .await
        .map_err(|e| failure(e.status_code(), e.error_code(), e))?;
    Ok(Json(amounts))
}
