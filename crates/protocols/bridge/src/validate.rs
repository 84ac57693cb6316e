//! Destination checks for bridge transfers

use halo_core::ChainId;

use crate::state::BridgeError;

/// Networks the bridge can deliver to
pub const SUPPORTED_DESTINATIONS: [ChainId; 3] =
    [ChainId::MAINNET, ChainId::MATIC, ChainId::ARBITRUM];

/// Validate a destination address on an EVM network.
///
/// Format checks only (prefix, length, hex digits).
pub fn validate_destination_address(address: &str) -> Result<(), BridgeError> {
    let invalid = |reason: &str| BridgeError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    if address.is_empty() {
        return Err(invalid("Address cannot be empty"));
    }
    if !address.starts_with("0x") {
        return Err(invalid("Address must start with '0x'"));
    }
    if address.len() != 42 {
        return Err(invalid("Address must be 42 characters (0x + 40 hex chars)"));
    }
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("Address contains non-hex characters"));
    }
    Ok(())
}

/// Validate the destination network against the current one
pub fn validate_destination_chain(current: ChainId, destination: ChainId) -> Result<(), BridgeError> {
    if !SUPPORTED_DESTINATIONS.contains(&destination) {
        return Err(BridgeError::UnsupportedChain {
            chain: destination.as_u64(),
        });
    }
    if current == destination {
        return Err(BridgeError::SameChain { chain: current });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_valid() {
        let addr = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08";
        assert!(validate_destination_address(addr).is_ok());
    }

    #[test]
    fn test_address_invalid_length() {
        let err = validate_destination_address("0x742d35").unwrap_err();
        assert_eq!(err.error_code(), "invalid_address");
    }

    #[test]
    fn test_address_invalid_prefix() {
        assert!(validate_destination_address("742d35Cc6634C0532925a3b844Bc9e7595f2bD0800").is_err());
    }

    #[test]
    fn test_address_non_hex() {
        assert!(validate_destination_address("0x742d35Cc6634C0532925a3b844Bc9e7595f2bDzz").is_err());
    }

    #[test]
    fn test_address_empty() {
        assert!(validate_destination_address("").is_err());
    }

    #[test]
    fn test_destination_chain() {
        assert!(validate_destination_chain(ChainId::MAINNET, ChainId::MATIC).is_ok());

        let err = validate_destination_chain(ChainId::MATIC, ChainId::MATIC).unwrap_err();
        assert_eq!(err.error_code(), "same_chain");

        let err = validate_destination_chain(ChainId::MAINNET, ChainId::KOVAN).unwrap_err();
        assert_eq!(err.error_code(), "unsupported_chain");
    }
}
