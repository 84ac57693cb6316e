//! Halo Bridge
//!
//! Form state and the approve, deposit or burn workflow for moving tokens
//! between networks.

pub mod flow;
pub mod form;
pub mod state;
pub mod validate;

pub use flow::BridgeFlow;
pub use form::{
    evaluate_bridge_form, next_enabled, primary_button_title, BridgeFormInputs, FormUpdate,
    BRIDGE_CAP,
};
pub use state::{
    ApproveState, BridgeError, BridgeMethod, BridgePanelState, BridgeToken, ButtonState, ModalState,
};
pub use validate::{validate_destination_address, validate_destination_chain, SUPPORTED_DESTINATIONS};
