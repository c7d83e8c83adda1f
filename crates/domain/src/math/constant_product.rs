use crate::error::{AmmError, Result};
use crate::math::fixed_point::{self, ONE_E_18};
use primitive_types::U256;

/// Output of a volatile (x * y = k) pool for a given input.
///
/// formula: dy = y * dx / (x + dx), rounded down
pub fn get_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Result<U256> {
    if amount_in.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    let numerator = fixed_point::mul(amount_in, reserve_out)?;
    let denominator = fixed_point::add(reserve_in, amount_in)?;
    fixed_point::div(numerator, denominator)
}

/// Input a volatile pool requires to release `amount_out`.
///
/// formula: dx = ceil(x * dy / (y - dy))
pub fn get_amount_in(amount_out: U256, reserve_in: U256, reserve_out: U256) -> Result<U256> {
    if amount_out >= reserve_out {
        return Err(AmmError::InsufficientReserves);
    }
    if amount_out.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    let numerator = fixed_point::mul(amount_out, reserve_in)?;
    fixed_point::rounding_up_division(numerator, reserve_out - amount_out)
}

/// Marginal price of the input asset in output units, 1e18-scaled.
pub fn spot_price(reserve_in: U256, reserve_out: U256) -> Result<U256> {
    if reserve_in.is_zero() {
        return Err(AmmError::InsufficientReserves);
    }
    fixed_point::mul_div(reserve_out, ONE_E_18, reserve_in)
}
