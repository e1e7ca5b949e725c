//! Address and amount parsing, unit conversion.
//!
//! Amounts are always carried as `U256` in the smallest unit. Conversion to
//! and from decimal text goes through alloy's integer unit helpers, so no
//! precision is lost on the raw value.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::{Address, U256};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Parse an address, enforcing EIP-55 when the input carries a checksum.
///
/// All-lowercase and all-uppercase input carries no checksum and is accepted
/// as long as it is 20 bytes of hex.
pub fn parse_address(input: &str) -> BlockchainResult<Address> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BlockchainError::InvalidInput(format!(
            "'{}' is not a 20-byte hex address",
            trimmed
        )));
    }

    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());

    if has_upper && has_lower {
        Address::parse_checksummed(format!("0x{}", body), None).map_err(|_| {
            BlockchainError::InvalidInput(format!("'{}' has an invalid EIP-55 checksum", trimmed))
        })
    } else {
        body.parse()
            .map_err(|e| BlockchainError::InvalidInput(format!("invalid address '{}': {}", trimmed, e)))
    }
}

/// Parse a positive decimal amount into the smallest unit.
///
/// Digits beyond `decimals` are an error, never rounded away.
pub fn parse_amount(input: &str, decimals: u8) -> BlockchainResult<U256> {
    let trimmed = input.trim();
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > usize::from(decimals) {
            return Err(BlockchainError::InvalidInput(format!(
                "amount has more than {} decimal places",
                decimals
            )));
        }
    }
    let parsed = parse_units(trimmed, decimals)
        .map_err(|e| BlockchainError::InvalidInput(format!("invalid amount '{}': {}", trimmed, e)))?;

    let value = match parsed {
        ParseUnits::U256(value) => value,
        ParseUnits::I256(_) => {
            return Err(BlockchainError::InvalidInput(format!(
                "amount '{}' must be positive",
                trimmed
            )))
        }
    };

    if value.is_zero() {
        return Err(BlockchainError::InvalidInput(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

/// Render a smallest-unit amount as exact decimal text, without trailing zeros.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let Ok(text) = format_units(value, decimals) else {
        return value.to_string();
    };
    if !text.contains('.') {
        return text;
    }
    let trimmed = text.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}
