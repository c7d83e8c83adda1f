use crate::error::{AmmError, Result};
use crate::math::fixed_point::{self, BASIS_POINTS};
use primitive_types::U256;

/// Fee charged on a v2 swap input: `ceil(amount_in * fee / 10000)`.
pub fn calculate_swap_fee_v2(amount_in: U256, fee_bps: u32) -> Result<U256> {
    if u64::from(fee_bps) >= BASIS_POINTS {
        return Err(AmmError::config(format!("fee {fee_bps} bps out of range")));
    }
    fixed_point::mul_div_up(amount_in, U256::from(fee_bps), fixed_point::basis_points())
}
