//! API route handlers

pub mod bridge;
pub mod errors;
pub mod farm;
pub mod health;
pub mod pools;
pub mod swap;

use std::fmt::Display;

use axum::{http::StatusCode, routing::get, Json, Router};
use chain_client::SharedChainClient;

use crate::dto::ApiError;
use crate::AppState;

pub type ApiFailure = (StatusCode, Json<ApiError>);

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/pools", pools::router())
        .nest("/swap", swap::router())
        .nest("/farm", farm::router())
        .nest("/errors", errors::router())
        .nest("/bridge", bridge::router())
        .with_state(state)
}

/// Error response from a domain error's status and code
pub(crate) fn failure(status: u16, code: &str, err: impl Display) -> ApiFailure {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!(%code, error = %err, "Request failed");
    }
    (status, Json(ApiError::new(code, err.to_string())))
}

/// Attached chain client, or 503
pub(crate) async fn require_chain(state: &AppState) -> Result<SharedChainClient, ApiFailure> {
    state.chain_client().await.ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new("chain_unavailable", "Chain client not connected")),
        )
    })
}
