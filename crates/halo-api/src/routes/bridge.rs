//! Bridge form route

use axum::{routing::post, Json, Router};

use bridge::{
    evaluate_bridge_form, next_enabled, primary_button_title, BridgeFormInputs, BridgePanelState,
};

use crate::dto::{BridgeFormRequest, BridgeFormResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/form", post(evaluate_form))
}

/// POST /bridge/form - Button state for an entered amount
///
/// Starts from a fresh panel, so input that matches no rule reports the
/// initial state.
async fn evaluate_form(Json(request): Json<BridgeFormRequest>) -> Json<BridgeFormResponse> {
    let inputs = BridgeFormInputs {
        minimum: request.minimum,
        allowance: request.allowance,
        balance: request.balance,
        capped: request.capped,
    };

    let mut state = BridgePanelState::default();
    if let Some(update) = evaluate_bridge_form(&request.input, &inputs) {
        update.apply(&mut state);
    }

    Json(BridgeFormResponse {
        button: state.button,
        approve: state.approve,
        title: primary_button_title(&state, request.minimum, &request.symbol),
        next_enabled: next_enabled(&state),
    })
}
