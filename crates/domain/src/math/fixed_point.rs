//! 256-bit integer helpers with explicit rounding.
//!
//! Ratios and prices carry an implicit scale of [`ONE_E_18`]. Token amounts
//! stay in native base units and are only multiplied through the scale for
//! the duration of a calculation.
//!
//! Rounding always protects the pool: outputs round down, required inputs
//! and fees round up via [`rounding_up_division`].

use crate::error::{AmmError, Result};
use primitive_types::U256;

/// 1.0 in 18-decimal fixed point.
pub const ONE_E_18: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);

/// Denominator for every basis-point quantity (100%).
pub const BASIS_POINTS: u64 = 10_000;

pub fn basis_points() -> U256 {
    U256::from(BASIS_POINTS)
}

/// Returns `ceil(numerator / denominator)`.
pub fn rounding_up_division(numerator: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(AmmError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

pub fn mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b).ok_or(AmmError::Overflow)
}

pub fn add(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b).ok_or(AmmError::Overflow)
}

pub fn sub(a: U256, b: U256) -> Result<U256> {
    a.checked_sub(b).ok_or(AmmError::Overflow)
}

pub fn div(a: U256, b: U256) -> Result<U256> {
    a.checked_div(b).ok_or(AmmError::DivisionByZero)
}

/// Floor of `a * b / denominator`.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    div(mul(a, b)?, denominator)
}

/// Ceiling of `a * b / denominator`.
pub fn mul_div_up(a: U256, b: U256, denominator: U256) -> Result<U256> {
    rounding_up_division(mul(a, b)?, denominator)
}

/// `10^decimals`.
pub fn pow_decimals(decimals: u8) -> Result<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .ok_or(AmmError::Overflow)
}

/// Rescales a native amount to 18 decimals given `10^decimals`.
pub fn adjust(amount: U256, pow_decimals: U256) -> Result<U256> {
    mul_div(amount, ONE_E_18, pow_decimals)
}
