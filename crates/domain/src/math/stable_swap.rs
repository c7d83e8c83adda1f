//! StableSwap invariant `x^3 * y + y^3 * x >= k`.
//!
//! Reserves are rescaled to 18 decimals before entering any of these
//! functions. The solver runs a fixed Newton iteration whose cap and
//! tolerance determine quoted amounts bit for bit.

use crate::error::{AmmError, Result};
use crate::math::fixed_point::{self, ONE_E_18, adjust, mul_div, rounding_up_division};
use primitive_types::U256;

/// Newton iteration cap for [`get_y`].
pub const MAX_ITERATIONS: usize = 255;

/// Invariant of a stable pool from native reserves and `10^decimals`.
pub fn k(x: U256, y: U256, pow_decimals_x: U256, pow_decimals_y: U256) -> Result<U256> {
    let x = adjust(x, pow_decimals_x)?;
    let y = adjust(y, pow_decimals_y)?;
    let a = mul_div(x, y, ONE_E_18)?;
    let b = fixed_point::add(mul_div(x, x, ONE_E_18)?, mul_div(y, y, ONE_E_18)?)?;
    fixed_point::mul(a, b)
}

// x0 * y^3 + x0^3 * y, each cube truncated to 18 decimals
fn f(x0: U256, y: U256) -> Result<U256> {
    let y_cubed = mul_div(mul_div(y, y, ONE_E_18)?, y, ONE_E_18)?;
    let x_cubed = mul_div(mul_div(x0, x0, ONE_E_18)?, x0, ONE_E_18)?;
    fixed_point::add(fixed_point::mul(x0, y_cubed)?, fixed_point::mul(x_cubed, y)?)
}

// df/dy
fn d(x0: U256, y: U256) -> Result<U256> {
    let y_squared = mul_div(y, y, ONE_E_18)?;
    let three_x0 = fixed_point::mul(U256::from(3), x0)?;
    let x_cubed = mul_div(mul_div(x0, x0, ONE_E_18)?, x0, ONE_E_18)?;
    fixed_point::add(mul_div(three_x0, y_squared, ONE_E_18)?, x_cubed)
}

/// Solves `f(x0, y) = xy` for `y`, starting from the current reserve `y`.
///
/// Stops once two successive estimates differ by at most one unit, or after
/// [`MAX_ITERATIONS`] steps, returning the last estimate either way.
pub fn get_y(x0: U256, xy: U256, mut y: U256) -> Result<U256> {
    for _ in 0..MAX_ITERATIONS {
        let y_prev = y;
        let k_value = f(x0, y)?;
        let slope = d(x0, y)?;
        if slope.is_zero() {
            return Err(AmmError::InsufficientReserves);
        }
        if k_value < xy {
            y = fixed_point::add(y, (xy - k_value) / slope)?;
        } else {
            y = fixed_point::sub(y, (k_value - xy) / slope)?;
        }

        let delta = if y > y_prev { y - y_prev } else { y_prev - y };
        if delta <= U256::one() {
            return Ok(y);
        }
    }
    Ok(y)
}

/// Output of a stable pool for `amount_in`.
pub fn get_amount_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
    pow_decimals_in: U256,
    pow_decimals_out: U256,
) -> Result<U256> {
    if amount_in.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    let xy = k(reserve_in, reserve_out, pow_decimals_in, pow_decimals_out)?;
    let amount_in_adjusted = adjust(amount_in, pow_decimals_in)?;
    let reserve_in_adjusted = adjust(reserve_in, pow_decimals_in)?;
    let reserve_out_adjusted = adjust(reserve_out, pow_decimals_out)?;

    let x0 = fixed_point::add(amount_in_adjusted, reserve_in_adjusted)?;
    let y = get_y(x0, xy, reserve_out_adjusted)?;
    let out = fixed_point::sub(reserve_out_adjusted, y)?;
    mul_div(out, pow_decimals_out, ONE_E_18)
}

/// Input a stable pool requires to release `amount_out`, rounded up.
pub fn get_amount_in(
    amount_out: U256,
    reserve_in: U256,
    reserve_out: U256,
    pow_decimals_in: U256,
    pow_decimals_out: U256,
) -> Result<U256> {
    if amount_out >= reserve_out {
        return Err(AmmError::InsufficientReserves);
    }
    if amount_out.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    let xy = k(reserve_in, reserve_out, pow_decimals_in, pow_decimals_out)?;
    let amount_out_adjusted = adjust(amount_out, pow_decimals_out)?;
    let reserve_in_adjusted = adjust(reserve_in, pow_decimals_in)?;
    let reserve_out_adjusted = adjust(reserve_out, pow_decimals_out)?;

    let x0 = fixed_point::sub(reserve_out_adjusted, amount_out_adjusted)?;
    let y = get_y(x0, xy, reserve_in_adjusted)?;
    let amount_in = fixed_point::sub(y, reserve_in_adjusted)?;
    rounding_up_division(fixed_point::mul(amount_in, pow_decimals_in)?, ONE_E_18)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constant_product;
    use crate::math::fixed_point::pow_decimals;

    fn e18(n: u64) -> U256 {
        U256::from(n) * ONE_E_18
    }

    #[test]
    fn test_k_is_symmetric() {
        let p = ONE_E_18;
        let a = k(e18(1_000), e18(2_000), p, p).unwrap();
        let b = k(e18(2_000), e18(1_000), p, p).unwrap();
        assert_eq!(a, b);
        // x*y*(x^2+y^2) at 1e18 scale: 2e6 * 5e6
        assert_eq!(a, e18(2_000_000) * e18(5_000_000));
    }

    #[test]
    fn test_get_y_keeps_invariant_at_rest() {
        let p = ONE_E_18;
        let xy = k(e18(1_000), e18(1_000), p, p).unwrap();
        let y = get_y(e18(1_000), xy, e18(1_000)).unwrap();
        let diff = if y > e18(1_000) { y - e18(1_000) } else { e18(1_000) - y };
        assert!(diff <= U256::one());
    }

    #[test]
    fn test_stable_pool_has_lower_slippage_than_volatile() {
        let reserve = e18(1_000_000);
        let amount = e18(10_000);
        let p = ONE_E_18;
        let stable = get_amount_out(amount, reserve, reserve, p, p).unwrap();
        let volatile = constant_product::get_amount_out(amount, reserve, reserve).unwrap();
        assert!(stable > volatile);
        assert!(stable < amount);
    }

    #[test]
    fn test_mixed_decimals() {
        // 1M units of a 6-decimal asset against 1M units of an 18-decimal asset
        let p6 = pow_decimals(6).unwrap();
        let p18 = pow_decimals(18).unwrap();
        let reserve_in = U256::from(1_000_000u64) * p6;
        let reserve_out = U256::from(1_000_000u64) * p18;
        let amount_in = U256::from(100u64) * p6;

        let out = get_amount_out(amount_in, reserve_in, reserve_out, p6, p18).unwrap();
        // near parity, in 18-decimal base units
        assert!(out > U256::from(99u64) * p18);
        assert!(out < U256::from(100u64) * p18);
    }

    #[test]
    fn test_amount_in_covers_amount_out() {
        let reserve = e18(50_000);
        let p = ONE_E_18;
        let wanted = e18(1_000);
        let required = get_amount_in(wanted, reserve, reserve, p, p).unwrap();
        let out = get_amount_out(required, reserve, reserve, p, p).unwrap();
        // the ceiling on the input side may leave a few units of dust
        let slack = U256::from(1_000u64);
        assert!(out + slack >= wanted);
        assert!(required > wanted);
    }

    #[test]
    fn test_errors() {
        let p = ONE_E_18;
        assert_eq!(
            get_amount_out(U256::zero(), e18(1), e18(1), p, p),
            Err(AmmError::InvalidAmount)
        );
        assert_eq!(
            get_amount_in(e18(1), e18(1), e18(1), p, p),
            Err(AmmError::InsufficientReserves)
        );
        assert_eq!(
            get_amount_in(U256::zero(), e18(1), e18(1), p, p),
            Err(AmmError::InvalidAmount)
        );
        // x0 = 0 leaves a flat curve
        assert_eq!(
            get_y(U256::zero(), U256::one(), U256::zero()),
            Err(AmmError::InsufficientReserves)
        );
    }
}
