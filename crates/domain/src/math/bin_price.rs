//! Price of a bin in a binned liquidity pool.
//!
//! P(id) = (1 + bin_step / 10000) ^ id, in 1e18 fixed point, computed by
//! repeated squaring without floating point.

use crate::error::{AmmError, Result};
use crate::math::fixed_point::{self, ONE_E_18};
use primitive_types::U256;

/// Bin steps a pool may be created with, in basis points.
pub const VALID_BIN_STEPS: [u32; 9] = [1, 5, 10, 25, 50, 100, 250, 500, 1000];

pub const MIN_BASE_FACTOR: u32 = 5_000;
pub const MAX_BASE_FACTOR: u32 = 10_000;

// bounds of the inverse search
const SEARCH_MIN_BIN: i64 = -1_000_000;
const SEARCH_MAX_BIN: i64 = 1_000_000;

fn base(bin_step: u32) -> Result<U256> {
    let step = fixed_point::mul_div(U256::from(bin_step), ONE_E_18, fixed_point::basis_points())?;
    fixed_point::add(ONE_E_18, step)
}

// base^exp at 1e18 scale
fn pow(base: U256, mut exp: u32) -> Result<U256> {
    let mut result = ONE_E_18;
    let mut power = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = fixed_point::mul_div(result, power, ONE_E_18)?;
        }
        exp >>= 1;
        if exp > 0 {
            power = fixed_point::mul_div(power, power, ONE_E_18)?;
        }
    }
    Ok(result)
}

/// Price of `bin_id`, 1e18-scaled. Bin 0 is exactly 1.
///
/// Returns `Overflow` when a positive id exceeds 256 bits; negative ids that
/// far out price at zero.
pub fn get_bin_price(bin_id: i32, bin_step: u32) -> Result<U256> {
    if bin_id == 0 {
        return Ok(ONE_E_18);
    }
    let magnitude = pow(base(bin_step)?, bin_id.unsigned_abs());
    if bin_id > 0 {
        return magnitude;
    }
    match magnitude {
        Ok(m) => fixed_point::mul_div(ONE_E_18, ONE_E_18, m),
        Err(AmmError::Overflow) => Ok(U256::zero()),
        Err(e) => Err(e),
    }
}

/// Bin whose price is closest to `price`.
///
/// Binary search over [-1e6, 1e6]; an exact price match returns immediately.
pub fn get_price_bin_id(price: U256, bin_step: u32) -> Result<i32> {
    if price.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    if price == ONE_E_18 {
        return Ok(0);
    }

    let (mut low, mut high) = (SEARCH_MIN_BIN, SEARCH_MAX_BIN);
    let mut best_bin = 0i64;
    let mut best_diff = U256::MAX;
    while low <= high {
        let mid = (low + high).div_euclid(2);
        let bin = i32::try_from(mid).map_err(|_| AmmError::Overflow)?;
        let mid_price = match get_bin_price(bin, bin_step) {
            Ok(p) => p,
            // beyond 256 bits, certainly above the target
            Err(AmmError::Overflow) => {
                high = mid - 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let diff = if mid_price > price {
            mid_price - price
        } else {
            price - mid_price
        };
        if diff < best_diff {
            best_diff = diff;
            best_bin = mid;
        }

        if mid_price < price {
            low = mid + 1;
        } else if mid_price > price {
            high = mid - 1;
        } else {
            return Ok(bin);
        }
    }
    i32::try_from(best_bin).map_err(|_| AmmError::Overflow)
}

/// Lower and upper price bound of `bin_id`.
pub fn calculate_bin_price_range(bin_id: i32, bin_step: u32) -> Result<(U256, U256)> {
    let next = bin_id.checked_add(1).ok_or(AmmError::Overflow)?;
    Ok((get_bin_price(bin_id, bin_step)?, get_bin_price(next, bin_step)?))
}

/// Every bin id between the two bounds, inclusive, in ascending order.
pub fn get_bin_range(start_bin_id: i32, end_bin_id: i32) -> Vec<i32> {
    let (start, end) = if start_bin_id <= end_bin_id {
        (start_bin_id, end_bin_id)
    } else {
        (end_bin_id, start_bin_id)
    };
    (start..=end).collect()
}

/// Bins from `range_before` below to `range_after` above the active bin.
pub fn get_active_bin_range(active_bin_id: i32, range_before: u32, range_after: u32) -> Vec<i32> {
    let start = i64::from(active_bin_id) - i64::from(range_before);
    let end = i64::from(active_bin_id) + i64::from(range_after);
    let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    get_bin_range(clamp(start), clamp(end))
}

pub fn validate_bin_step(bin_step: u32) -> bool {
    VALID_BIN_STEPS.contains(&bin_step)
}

pub fn validate_base_factor(base_factor: u32) -> bool {
    (MIN_BASE_FACTOR..=MAX_BASE_FACTOR).contains(&base_factor)
}
