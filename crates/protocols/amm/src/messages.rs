//! Friendly error messages
//!
//! Maps wallet and contract failures to messages shown to users.

use halo_core::RpcError;

pub const DEFAULT_MESSAGE: &str = "Something went wrong with your transaction. Please try again.";
const ALLOWANCE: &str =
    "The token allowance is not enough for this transaction. Please approve a higher amount.";
const FROZEN: &str = "This pool is frozen. Only proportional withdrawals are allowed.";
const EMERGENCY: &str =
    "This pool is in emergency mode. Only emergency proportional withdrawals are allowed.";
const DEADLINE_PASSED: &str = "The transaction deadline has passed. Please try again.";
const WHITELISTING: &str = "This pool is still in its whitelisting stage.";
const NOT_WHITELISTING: &str = "The whitelisting stage of this pool has ended.";
const AMOUNT_TOO_LARGE: &str = "The amount is too large for this pool. Please enter a smaller amount.";
const SWAP_FAILED: &str =
    "The swap could not be completed at current pool balances. Please try a smaller amount.";
const SWAP_HALT: &str =
    "This trade would push the pool too far out of balance. Please try a smaller amount.";
const TRANSFER_FAILED: &str = "The token transfer failed. Please check your balance and try again.";
const SUBTRACTION_OVERFLOW: &str = "The amount exceeds your available balance.";
const WALLET_REJECTION: &str = "You rejected the transaction in your wallet.";
const ZAP_REVERTED: &str =
    "The zap would mint fewer pool tokens than expected. Please adjust the amount and try again.";

/// Substring -> message, in evaluation order
///
/// Every matching entry overwrites the previous result, so later entries take
/// precedence.
const ERROR_MESSAGES: &[(&str, &str)] = &[
    ("Curve/re-entered", DEFAULT_MESSAGE),
    ("Curve/allowance-decrease-underflow", ALLOWANCE),
    ("Curve/approval-overflow", ALLOWANCE),
    ("Curve/insufficient-allowance", ALLOWANCE),
    ("Curve/frozen-only-allowing-proportional-withdraw", FROZEN),
    (
        "Curve/emergency-only-allowing-emergency-proportional-withdraw",
        EMERGENCY,
    ),
    ("Curve/tx-deadline-passed", DEADLINE_PASSED),
    ("Curve/whitelist-stage-on-going", WHITELISTING),
    ("Curve/whitelist-stage-stopped", NOT_WHITELISTING),
    ("Curve/amount-too-large", AMOUNT_TOO_LARGE),
    ("Curve/swap-convergence-failed", SWAP_FAILED),
    ("Curve/swap-invariant-violation", SWAP_FAILED),
    ("Curve/liquidity-invariant-violation", SWAP_FAILED),
    ("Curve/upper-halt", SWAP_HALT),
    ("Curve/lower-halt", SWAP_HALT),
    ("Curve/CADC-transfer-failed", TRANSFER_FAILED),
    ("SafeMath: subtraction overflow", SUBTRACTION_OVERFLOW),
    (
        "MetaMask Tx Signature: User denied transaction signature.",
        WALLET_REJECTION,
    ),
    ("Zap/not-enough-lp-amount", ZAP_REVERTED),
];

/// Translate an error payload into a user-facing message
///
/// The last matching pattern wins. A payload without a numeric code is shown
/// verbatim. Without any match the default message is returned.
pub fn friendly_error_message(error: &RpcError) -> String {
    if !error.has_numeric_code() {
        return error.message.clone();
    }

    let mut message = DEFAULT_MESSAGE;
    for (pattern, friendly) in ERROR_MESSAGES {
        if error.message.contains(pattern) {
            message = friendly;
        }
    }
    message.to_string()
}
