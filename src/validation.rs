//! Input checks run before any request leaves the process.

use crate::errors::{AppError, Result};
use crate::models::{Chain, ChainType};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// External maker names look like `mm123`.
pub fn validate_maker_name(name: &str) -> Result<()> {
    let digits = name.strip_prefix("mm").unwrap_or_default();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "Maker name must be external name of format 'mm123'. Got '{name}'"
        )));
    }
    Ok(())
}

pub fn validate_chain(chain: &Chain) -> Result<()> {
    if chain.chain_type == ChainType::Unsupported {
        return Err(AppError::Validation(format!("Unrecognized chain: {chain}")));
    }
    Ok(())
}

pub fn validate_evm_address(address: &str) -> Result<()> {
    let valid = address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(AppError::Validation(format!("Invalid EVM address: {address}")));
    }
    Ok(())
}

pub fn validate_solana_address(address: &str) -> Result<()> {
    let valid = (32..=44).contains(&address.len())
        && address.chars().all(|c| BASE58_ALPHABET.contains(c));
    if !valid {
        return Err(AppError::Validation(format!(
            "Invalid Solana address: {address}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maker_names() {
        assert!(validate_maker_name("mm12").is_ok());
        assert!(validate_maker_name("mm").is_err());
        assert!(validate_maker_name("mm1_2").is_err());
        assert!(validate_maker_name("xx12").is_err());
    }

    #[test]
    fn evm_addresses() {
        assert!(validate_evm_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_ok());
        assert!(validate_evm_address("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_err());
        assert!(validate_evm_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb4").is_err());
        assert!(validate_evm_address("0xg0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_err());
    }

    #[test]
    fn solana_addresses() {
        assert!(validate_solana_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v").is_ok());
        assert!(validate_solana_address("0PjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v").is_err());
        assert!(validate_solana_address("short").is_err());
    }

    #[test]
    fn unsupported_chain_type() {
        assert!(validate_chain(&Chain::new(ChainType::Evm, 1)).is_ok());
        assert!(validate_chain(&Chain::new(ChainType::Unsupported, 1)).is_err());
    }
}
