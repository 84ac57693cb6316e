//! Bridge form rules
//!
//! Evaluated in order; the first matching rule decides the button and, for
//! most rules, the approve state. When nothing matches the panel keeps its
//! current state.

use halo_core::units;
use serde::{Deserialize, Serialize};

use crate::state::{ApproveState, BridgePanelState, ButtonState};

/// Largest amount a capped network lets through in one transfer
pub const BRIDGE_CAP: f64 = 10_000.0;

/// Balances behind the form, in display units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BridgeFormInputs {
    pub minimum: f64,
    pub allowance: f64,
    pub balance: f64,
    /// Whether the current network caps transfers at [`BRIDGE_CAP`]
    pub capped: bool,
}

/// Outcome of one form evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormUpdate {
    pub button: ButtonState,
    /// `None` leaves the approve state unchanged
    pub approve: Option<ApproveState>,
}

impl FormUpdate {
    fn new(button: ButtonState, approve: Option<ApproveState>) -> Self {
        Self { button, approve }
    }

    /// Apply to a panel state
    pub fn apply(&self, state: &mut BridgePanelState) {
        state.button = self.button;
        if let Some(approve) = self.approve {
            state.approve = approve;
        }
    }
}

/// Decide the panel buttons for the entered amount
///
/// Unparseable input compares false against every threshold.
pub fn evaluate_bridge_form(input: &str, inputs: &BridgeFormInputs) -> Option<FormUpdate> {
    let amount = input.trim().parse::<f64>().unwrap_or(f64::NAN);
    let BridgeFormInputs {
        minimum,
        allowance,
        balance,
        capped,
    } = *inputs;

    if input.trim().is_empty() || amount <= 0.0 {
        Some(FormUpdate::new(ButtonState::EnterAmount, Some(ApproveState::NotApproved)))
    } else if amount < minimum {
        Some(FormUpdate::new(ButtonState::NotMinimum, Some(ApproveState::NotApproved)))
    } else if allowance >= amount && amount <= BRIDGE_CAP {
        Some(FormUpdate::new(ButtonState::Next, Some(ApproveState::Approved)))
    } else if capped && amount > BRIDGE_CAP {
        Some(FormUpdate::new(ButtonState::MaxCap, None))
    } else if amount <= balance && amount > 0.0 && allowance < amount {
        Some(FormUpdate::new(ButtonState::Default, Some(ApproveState::NotApproved)))
    } else if amount > balance && amount > allowance {
        Some(FormUpdate::new(ButtonState::InsufficientBalance, None))
    } else {
        None
    }
}

/// Title of the primary button for a panel state
pub fn primary_button_title(state: &BridgePanelState, minimum: f64, symbol: &str) -> String {
    let title = match (state.approve, state.button) {
        (_, ButtonState::NotMinimum) => {
            return format!(
                "Minimum bridge threshold below {} {}",
                units::format_number(minimum),
                symbol
            )
        }
        (_, ButtonState::InsufficientBalance) => "Insufficient Balance",
        (_, ButtonState::MaxCap) => "Maximum amount reached",
        (_, ButtonState::EnterAmount) => "Enter an amount",
        (_, ButtonState::Confirming) => "Confirming",
        (_, ButtonState::Retry) => "Retry",
        (ApproveState::NotApproved, ButtonState::Default) => "Approve",
        (ApproveState::Approving, ButtonState::Default) => "Approving",
        (ApproveState::Approved, ButtonState::Default) => "Approved",
        (_, ButtonState::Next) => "Next",
    };
    title.to_string()
}

/// Whether the Next button is clickable
pub fn next_enabled(state: &BridgePanelState) -> bool {
    state.approve == ApproveState::Approved && state.button == ButtonState::Next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(minimum: f64, allowance: f64, balance: f64, capped: bool) -> BridgeFormInputs {
        BridgeFormInputs {
            minimum,
            allowance,
            balance,
            capped,
        }
    }

    fn button(input: &str, form: &BridgeFormInputs) -> Option<ButtonState> {
        evaluate_bridge_form(input, form).map(|u| u.button)
    }

    #[test]
    fn test_enter_amount() {
        let form = inputs(20.0, 0.0, 100.0, false);
        for input in ["", "   ", "0", "-5"] {
            let update = evaluate_bridge_form(input, &form).unwrap();
            assert_eq!(update.button, ButtonState::EnterAmount);
            assert_eq!(update.approve, Some(ApproveState::NotApproved));
        }
    }

    #[test]
    fn test_below_minimum() {
        let form = inputs(20.0, 1_000.0, 1_000.0, false);
        assert_eq!(button("19.99", &form), Some(ButtonState::NotMinimum));
    }

    #[test]
    fn test_next_when_allowance_covers_amount() {
        let form = inputs(20.0, 500.0, 1_000.0, true);
        let update = evaluate_bridge_form("500", &form).unwrap();
        assert_eq!(update.button, ButtonState::Next);
        assert_eq!(update.approve, Some(ApproveState::Approved));
    }

    #[test]
    fn test_cap_only_on_capped_networks() {
        let form = inputs(20.0, 50_000.0, 50_000.0, true);
        let update = evaluate_bridge_form("10001", &form).unwrap();
        assert_eq!(update.button, ButtonState::MaxCap);
        assert_eq!(update.approve, None);

        // Uncapped: allowance covers the amount but the Next rule stops at the
        // cap, and the amount is within balance, so no rule applies
        let form = inputs(20.0, 50_000.0, 50_000.0, false);
        assert_eq!(evaluate_bridge_form("10001", &form), None);
    }

    #[test]
    fn test_needs_approval() {
        let form = inputs(20.0, 10.0, 1_000.0, false);
        let update = evaluate_bridge_form("100", &form).unwrap();
        assert_eq!(update.button, ButtonState::Default);
        assert_eq!(update.approve, Some(ApproveState::NotApproved));
    }

    #[test]
    fn test_insufficient_balance() {
        let form = inputs(20.0, 10.0, 50.0, false);
        assert_eq!(button("100", &form), Some(ButtonState::InsufficientBalance));
    }

    #[test]
    fn test_unparseable_input_changes_nothing() {
        let form = inputs(20.0, 10.0, 50.0, false);
        assert_eq!(evaluate_bridge_form("abc", &form), None);

        let mut state = BridgePanelState::default();
        state.button = ButtonState::Retry;
        if let Some(update) = evaluate_bridge_form("abc", &form) {
            update.apply(&mut state);
        }
        assert_eq!(state.button, ButtonState::Retry);
    }

    #[test]
    fn test_button_titles() {
        let mut state = BridgePanelState::default();
        assert_eq!(primary_button_title(&state, 20.0, "XSGD"), "Enter an amount");

        state.button = ButtonState::NotMinimum;
        assert_eq!(
            primary_button_title(&state, 20.0, "XSGD"),
            "Minimum bridge threshold below 20 XSGD"
        );

        state.button = ButtonState::Default;
        assert_eq!(primary_button_title(&state, 20.0, "XSGD"), "Approve");
        assert!(!next_enabled(&state));

        state.approve = ApproveState::Approved;
        state.button = ButtonState::Next;
        assert_eq!(primary_button_title(&state, 20.0, "XSGD"), "Next");
        assert!(next_enabled(&state));
    }

    #[test]
    fn test_apply_keeps_approve_state_for_cap() {
        let mut state = BridgePanelState {
            button: ButtonState::Next,
            approve: ApproveState::Approved,
            modal: crate::state::ModalState::NotConfirmed,
        };
        FormUpdate::new(ButtonState::MaxCap, None).apply(&mut state);
        assert_eq!(state.button, ButtonState::MaxCap);
        assert_eq!(state.approve, ApproveState::Approved);
    }
}
