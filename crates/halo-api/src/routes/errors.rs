//! Error translation route

use axum::{routing::post, Json, Router};

use amm::friendly_error_message;
use halo_core::RpcError;

use crate::dto::TranslatedError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/translate", post(translate))
}

/// POST /errors/translate - Friendly message for a wallet or provider error
async fn translate(Json(error): Json<RpcError>) -> Json<TranslatedError> {
    Json(TranslatedError {
        message: friendly_error_message(&error),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{disconnected_state, send};

    #[tokio::test]
    async fn test_translate_known_error() {
        let body = json!({
            "code": -32603,
            "message": "execution reverted: SafeMath: subtraction overflow",
        });
        let (status, body) = send(disconnected_state(), "POST", "/errors/translate", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "The amount exceeds your available balance.");
    }

    #[tokio::test]
    async fn test_translate_unknown_error() {
        let body = json!({ "code": 1, "message": "something odd" });
        let (_, body) = send(disconnected_state(), "POST", "/errors/translate", Some(body)).await;
        assert_eq!(body["message"], amm::DEFAULT_MESSAGE);
    }

    #[tokio::test]
    async fn test_translate_uncoded_error_passes_through() {
        let body = json!({ "code": "ACTION_REJECTED", "message": "user rejected transaction" });
        let (_, body) = send(disconnected_state(), "POST", "/errors/translate", Some(body)).await;
        assert_eq!(body["message"], "user rejected transaction");
    }
}
