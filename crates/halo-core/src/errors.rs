//! Error types for Halo

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core errors that can occur across the workspace
#[derive(Debug, Error)]
pub enum Error {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Wallet/provider error payload as reported by the chain client.
///
/// Mirrors the JSON error object surfaced by EIP-1193 providers. `code` is
/// kept as a raw JSON value because wallets are not consistent about its
/// type; only a numeric code counts as a recognised error code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: serde_json::Value,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: serde_json::Value::from(code),
            message: message.into(),
            data: None,
        }
    }

    /// Payload without a usable error code
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: serde_json::Value::Null,
            message: message.into(),
            data: None,
        }
    }

    /// Whether the provider supplied a JSON number as the code
    pub fn has_numeric_code(&self) -> bool {
        matches!(self.code, serde_json::Value::Number(_))
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Chain client errors
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("Provider unreachable: {url}")]
    Unreachable { url: String },

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Call to {contract} reverted: {error}")]
    Reverted { contract: String, error: RpcError },

    #[error("User rejected the request: {error}")]
    Rejected { error: RpcError },

    #[error("Provider returned error: {error}")]
    Rpc { error: RpcError },

    #[error("Contract not deployed at {address}")]
    UnknownContract { address: String },

    #[error("Transaction {hash} not found")]
    TransactionNotFound { hash: String },

    #[error("Wallet not connected")]
    NotConnected,
}

impl ChainError {
    /// Error payload suitable for friendly-message translation
    pub fn rpc_error(&self) -> RpcError {
        match self {
            Self::Reverted { error, .. } | Self::Rejected { error } | Self::Rpc { error } => {
                error.clone()
            }
            other => RpcError::uncoded(other.to_string()),
        }
    }

    /// Whether the failure was the user declining to sign
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Missing contract address for {contract} on {chain}")]
    MissingContract { contract: &'static str, chain: String },
}

/// Amount parsing errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("'{input}' is not a decimal number")]
    NotANumber { input: String },

    #[error("'{input}' has more than {decimals} fractional digits")]
    TooPrecise { input: String, decimals: u8 },

    #[error("'{input}' overflows the amount range")]
    Overflow { input: String },
}

/// Result type alias for Halo operations
pub type Result<T> = std::result::Result<T, Error>;

impl ChainError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "provider_unreachable",
            Self::Timeout { .. } => "provider_timeout",
            Self::Reverted { .. } => "transaction_reverted",
            Self::Rejected { .. } => "user_rejected",
            Self::Rpc { .. } => "provider_error",
            Self::UnknownContract { .. } => "unknown_contract",
            Self::TransactionNotFound { .. } => "transaction_not_found",
            Self::NotConnected => "wallet_not_connected",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Reverted { .. } | Self::Rejected { .. } => 422,
            Self::UnknownContract { .. } | Self::TransactionNotFound { .. } => 404,
            Self::NotConnected => 503,
            Self::Unreachable { .. } | Self::Timeout { .. } | Self::Rpc { .. } => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_error_codes() {
        let err = ChainError::Reverted {
            contract: "vault".into(),
            error: RpcError::new(-32603, "execution reverted"),
        };
        assert_eq!(err.error_code(), "transaction_reverted");
        assert_eq!(err.status_code(), 422);

        let err = ChainError::NotConnected;
        assert_eq!(err.error_code(), "wallet_not_connected");
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_numeric_code_detection() {
        assert!(RpcError::new(4001, "denied").has_numeric_code());
        assert!(!RpcError::uncoded("boom").has_numeric_code());

        let stringly: RpcError =
            serde_json::from_str(r#"{"code":"CALL_EXCEPTION","message":"reverted"}"#).unwrap();
        assert!(!stringly.has_numeric_code());

        for raw in [
            r#"{"code":-32603.5,"message":"reverted"}"#,
            r#"{"code":18446744073709551615,"message":"reverted"}"#,
        ] {
            let payload: RpcError = serde_json::from_str(raw).unwrap();
            assert!(payload.has_numeric_code(), "{}", raw);
        }
    }

    #[test]
    fn test_rpc_error_from_timeout_is_uncoded() {
        let payload = ChainError::Timeout { secs: 30 }.rpc_error();
        assert!(!payload.has_numeric_code());
        assert!(payload.message.contains("30s"));
    }
}
