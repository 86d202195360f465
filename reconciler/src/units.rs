//! Amount unit conversion
//!
//! Chains represent amounts as integers in their smallest unit (wei,
//! tinybars, uatom); payers and merchants think in human units. Conversions
//! here are exact decimal arithmetic (no floats), so a raw amount converts
//! to human units and back without loss for every supported precision
//! (6, 8, and 18 decimals).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Largest integer a Decimal mantissa can hold (96 bits).
const MAX_MANTISSA: u128 = 0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF;

/// Highest decimal count any supported chain uses (EVM native currencies
/// and BSC USDT).
pub const MAX_DECIMALS: u32 = 18;

/// Converts a raw smallest-unit amount to human units.
///
/// # Arguments
///
/// * `raw` - Amount in smallest units
/// * `decimals` - Decimal places of the unit
///
/// # Returns
///
/// * `Some(Decimal)` - Exact human-unit amount
/// * `None` - Unsupported decimal count or amount beyond Decimal's mantissa
pub fn from_raw(raw: u128, decimals: u32) -> Option<Decimal> {
    if decimals > MAX_DECIMALS || raw > MAX_MANTISSA {
        return None;
    }
    Some(Decimal::from_i128_with_scale(raw as i128, decimals))
}

/// Converts a human-unit amount to raw smallest units.
///
/// Fails when the amount is negative, carries more fractional digits than
/// the unit can represent, or overflows.
///
/// # Arguments
///
/// * `amount` - Amount in human units
/// * `decimals` - Decimal places of the unit
///
/// # Returns
///
/// * `Some(u128)` - Exact raw amount
/// * `None` - Not representable at this precision
pub fn to_raw(amount: Decimal, decimals: u32) -> Option<u128> {
    if amount.is_sign_negative() || decimals > MAX_DECIMALS {
        return None;
    }
    let scale = Decimal::from(10u64.pow(decimals));
    let scaled = amount.checked_mul(scale)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_u128()
}
