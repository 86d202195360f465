//! Shared utilities for cross-chain client libraries
//!
//! This crate contains pure helper functions used by the chain client crates:
//! hex quantity parsing for JSON-RPC responses and address normalization for
//! cross-format comparisons. It deliberately has no dependencies.

// ============================================================================
// HEX AND AMOUNT PARSING
// ============================================================================

/// Parses a hex quantity string (with or without 0x prefix) into a u128.
///
/// JSON-RPC responses encode block numbers and values as 0x-prefixed hex
/// strings (e.g. "0x1b4"). An empty quantity ("0x") parses as an error.
///
/// # Arguments
///
/// * `value` - Hex string such as "0x989680" or "989680"
///
/// # Returns
///
/// * `Some(u128)` - Parsed quantity
/// * `None` - Not valid hex or empty
pub fn parse_hex_quantity(value: &str) -> Option<u128> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    if stripped.is_empty() {
        return None;
    }
    u128::from_str_radix(stripped, 16).ok()
}

/// Parses an amount field that may be either a decimal string or a 0x-hex
/// quantity.
///
/// Block-explorer APIs return raw amounts as decimal strings
/// ("10000000"), while JSON-RPC proxy endpoints return the same values as
/// hex quantities ("0x989680"). Both forms appear in transaction listings,
/// so callers treat them uniformly.
///
/// # Arguments
///
/// * `value` - Amount string in either form
///
/// # Returns
///
/// * `Some(u128)` - Parsed amount in smallest units
/// * `None` - Neither form parsed
pub fn parse_amount(value: &str) -> Option<u128> {
    if let Some(hex) = value.strip_prefix("0x") {
        return parse_hex_quantity(hex);
    }
    value.parse::<u128>().ok()
}

// ============================================================================
// ADDRESS NORMALIZATION
// ============================================================================

/// Normalizes an EVM address to lowercase with a 0x prefix.
///
/// # Arguments
///
/// * `address` - Address with or without 0x prefix, any case
///
/// # Returns
///
/// * Normalized address (0x-prefixed, lowercase)
pub fn normalize_evm_address(address: &str) -> String {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    format!("0x{}", stripped.to_lowercase())
}

/// Compares two addresses or token identifiers for equality, ignoring case
/// and any 0x prefix.
///
/// Works for EVM addresses ("0xAbC..." vs "abc...") as well as formats with
/// no hex prefix such as Hedera entity IDs ("0.0.456858") and bech32
/// addresses, which compare byte-for-byte after case folding.
///
/// # Arguments
///
/// * `a` - First address
/// * `b` - Second address
///
/// # Returns
///
/// * `true` if both refer to the same address
pub fn addresses_equal(a: &str, b: &str) -> bool {
    let a = a.strip_prefix("0x").unwrap_or(a);
    let b = b.strip_prefix("0x").unwrap_or(b);
    a.eq_ignore_ascii_case(b)
}
