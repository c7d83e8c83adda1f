//! Single-pool and path quoting for v1 pools.
//!
//! Dispatches between the volatile and stable invariants on `is_stable`
//! and chains hops with the fee schedule applied on the input side.

use crate::error::{AmmError, Result};
use crate::fees::{AmmFees, add_fee, subtract_fee};
use crate::math::fixed_point::pow_decimals;
use crate::math::{constant_product, stable_swap};
use crate::pool::PoolMetadataV1;
use crate::token::AssetId;
use primitive_types::U256;

/// Output of one v1 pool for `amount_in`, before fees.
pub fn get_amount_out(
    is_stable: bool,
    reserve_in: U256,
    reserve_out: U256,
    decimals_in: u8,
    decimals_out: u8,
    amount_in: U256,
) -> Result<U256> {
    if is_stable {
        stable_swap::get_amount_out(
            amount_in,
            reserve_in,
            reserve_out,
            pow_decimals(decimals_in)?,
            pow_decimals(decimals_out)?,
        )
    } else {
        constant_product::get_amount_out(amount_in, reserve_in, reserve_out)
    }
}

/// Input one v1 pool requires to release `amount_out`, before fees.
pub fn get_amount_in(
    is_stable: bool,
    reserve_in: U256,
    reserve_out: U256,
    decimals_in: u8,
    decimals_out: u8,
    amount_out: U256,
) -> Result<U256> {
    if is_stable {
        stable_swap::get_amount_in(
            amount_out,
            reserve_in,
            reserve_out,
            pow_decimals(decimals_in)?,
            pow_decimals(decimals_out)?,
        )
    } else {
        constant_product::get_amount_in(amount_out, reserve_in, reserve_out)
    }
}

/// Amounts along an exact-input path, starting with `(asset_in, amount_in)`.
///
/// Each hop deducts the pool fee from its input before applying the curve.
pub fn get_amounts_out(
    fees: &AmmFees,
    amount_in: U256,
    asset_in: AssetId,
    pools: &[&PoolMetadataV1],
) -> Result<Vec<(AssetId, U256)>> {
    if pools.is_empty() {
        return Err(AmmError::config("path must contain at least one pool"));
    }
    if amount_in.is_zero() {
        return Err(AmmError::InvalidAmount);
    }

    let mut amounts = Vec::with_capacity(pools.len() + 1);
    amounts.push((asset_in, amount_in));
    let (mut asset, mut amount) = (asset_in, amount_in);
    for pool in pools {
        let hop = pool.arrange(&asset)?;
        let after_fee = subtract_fee(&pool.pool_id, amount, fees)?;
        amount = get_amount_out(
            pool.pool_id.is_stable,
            hop.reserve_in,
            hop.reserve_out,
            hop.decimals_in,
            hop.decimals_out,
            after_fee,
        )?;
        asset = hop.asset_out;
        amounts.push((asset, amount));
    }
    Ok(amounts)
}

/// Amounts along an exact-output path, walked backwards from
/// `(asset_out, amount_out)`; the last entry is the required input.
///
/// `pools` is given in trade order.
pub fn get_amounts_in(
    fees: &AmmFees,
    amount_out: U256,
    asset_out: AssetId,
    pools: &[&PoolMetadataV1],
) -> Result<Vec<(AssetId, U256)>> {
    if pools.is_empty() {
        return Err(AmmError::config("path must contain at least one pool"));
    }
    if amount_out.is_zero() {
        return Err(AmmError::InvalidAmount);
    }

    let mut amounts = Vec::with_capacity(pools.len() + 1);
    amounts.push((asset_out, amount_out));
    let (mut asset, mut amount) = (asset_out, amount_out);
    for pool in pools.iter().rev() {
        // oriented from the output side, so "in"/"out" are swapped
        let hop = pool.arrange(&asset)?;
        let before_fee = get_amount_in(
            pool.pool_id.is_stable,
            hop.reserve_out,
            hop.reserve_in,
            hop.decimals_out,
            hop.decimals_in,
            amount,
        )?;
        amount = add_fee(&pool.pool_id, before_fee, fees)?;
        asset = hop.asset_out;
        amounts.push((asset, amount));
    }
    Ok(amounts)
}
