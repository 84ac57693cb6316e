//! Swap routes

use axum::{extract::State, routing::post, Json, Router};

use amm::{fetch_token, SwapPreview, SwapRoute, SwapRouter, Token};
use chain_client::SharedChainClient;
use halo_core::{Address, ChainError};

use super::{failure, require_chain, ApiFailure};
use crate::dto::SwapRequest;
use crate::AppState;

/// Create swap routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/route", post(get_route))
        .route("/preview", post(get_preview))
}

/// Resolve both request tokens against the connected chain
async fn request_tokens(
    client: &SharedChainClient,
    request: &SwapRequest,
) -> Result<(Token, Token), ApiFailure> {
    let chain_id = client.chain_id().await.ok_or_else(|| {
        let e = ChainError::NotConnected;
        failure(e.status_code(), e.error_code(), e)
    })?;

    let parse = |raw: &str| {
        Address::parse(raw).map_err(|e| failure(400, "bad_request", e))
    };
    let (token_in, token_out) = (parse(&request.token_in)?, parse(&request.token_out)?);

    tokio::try_join!(
        fetch_token(client.as_ref(), chain_id, &token_in),
        fetch_token(client.as_ref(), chain_id, &token_out),
    )
    .map_err(|e| failure(e.status_code(), e.error_code(), e))
}

/// POST /swap/route - Batch-swap instructions for a token pair
async fn get_route(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<SwapRoute>, ApiFailure> {
    let client = require_chain(&state).await?;
    let (token_in, token_out) = request_tokens(&client, &request).await?;

    SwapRouter::new(client, state.config())
        .resolve_route(&token_in, &token_out, &request.amount, request.kind)
        .map(Json)
        .map_err(|e| failure(e.status_code(), e.error_code(), e))
}

/// POST /swap/preview - Quote both sides of a swap
async fn get_preview(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<SwapPreview>, ApiFailure> {
    let client = require_chain(&state).await?;
    let (token_in, token_out) = request_tokens(&client, &request).await?;

    SwapRouter::new(client, state.config())
        .preview_swap(&token_in, &token_out, &request.amount, request.kind)
        .await
        .map(Json)
        .map_err(|e| failure(e.status_code(), e.error_code(), e))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{addr, connected_state, disconnected_state, send, usdc, xsgd};

    #[tokio::test]
    async fn test_preview() {
        let body = json!({
            "token_in": xsgd().as_str(),
            "token_out": usdc().as_str(),
            "amount": "100",
        });
        let (status, body) = send(connected_state(), "POST", "/swap/preview", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount_in"], "100.0");
        assert_eq!(body["amount_out"], "75.0");
    }

    #[tokio::test]
    async fn test_preview_zero_amount() {
        let body = json!({
            "token_in": xsgd().as_str(),
            "token_out": usdc().as_str(),
            "amount": "",
            "kind": "given_out",
        });
        let (status, body) = send(connected_state(), "POST", "/swap/preview", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount_in"], "0");
        assert_eq!(body["amount_out"], "0");
    }

    #[tokio::test]
    async fn test_route() {
        let body = json!({
            "token_in": xsgd().as_str(),
            "token_out": usdc().as_str(),
            "amount": "100",
        });
        let (status, body) = send(connected_state(), "POST", "/swap/route", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assets"][0], usdc().as_str());
        assert_eq!(body["swaps"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_route() {
        let body = json!({
            "token_in": xsgd().as_str(),
            "token_out": xsgd().as_str(),
            "amount": "100",
        });
        let (status, body) = send(connected_state(), "POST", "/swap/route", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "no_route");
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let body = json!({
            "token_in": addr(0x77).as_str(),
            "token_out": usdc().as_str(),
            "amount": "1",
        });
        let (status, _) = send(connected_state(), "POST", "/swap/preview", Some(body)).await;
        assert!(!status.is_success());
    }

    #[tokio::test]
    async fn test_preview_needs_chain() {
        let body = json!({
            "token_in": xsgd().as_str(),
            "token_out": usdc().as_str(),
            "amount": "100",
        });
        let (status, body) = send(disconnected_state(), "POST", "/swap/preview", Some(body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "chain_unavailable");
    }
}
