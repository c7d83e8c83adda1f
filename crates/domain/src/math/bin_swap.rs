//! Swap quoting across the bins of a v2 pool.
//!
//! Traversal starts at the active bin and moves one bin at a time in the
//! swap direction (+1 when swapping X for Y, -1 otherwise). It never turns
//! back, and gives up with `InsufficientReserves` once it is more than
//! [`MAX_BIN_TRAVERSAL`] bins away from the active bin.

use crate::error::{AmmError, Result};
use crate::fees::calculate_fee_to_add;
use crate::math::fixed_point::{self, rounding_up_division};
use crate::metrics::fees::calculate_swap_fee_v2;
use crate::pool::{BinLiquidity, PoolMetadataV2};
use primitive_types::U256;

/// Furthest a swap may travel from the active bin.
pub const MAX_BIN_TRAVERSAL: i64 = 1_000;

struct BinCursor {
    active: i64,
    current: i64,
    step: i64,
}

impl BinCursor {
    fn new(active: i32, swap_for_y: bool) -> Self {
        Self {
            active: i64::from(active),
            current: i64::from(active),
            step: if swap_for_y { 1 } else { -1 },
        }
    }

    fn bin(&self) -> Result<i32> {
        i32::try_from(self.current).map_err(|_| AmmError::InsufficientReserves)
    }

    fn advance(&mut self) -> Result<()> {
        self.current += self.step;
        if (self.current - self.active).abs() > MAX_BIN_TRAVERSAL {
            return Err(AmmError::InsufficientReserves);
        }
        Ok(())
    }
}

/// Output for selling `amount_in`, walking bins until the input is spent.
///
/// Each bin prices its share like a small constant-product pool:
/// out = used * reserve_out / (reserve_in + used), rounded down.
pub fn get_amount_out_v2<P: BinLiquidity + ?Sized>(
    pool: &P,
    amount_in: U256,
    swap_for_y: bool,
) -> Result<U256> {
    if amount_in.is_zero() {
        return Err(AmmError::InvalidAmount);
    }

    let mut cursor = BinCursor::new(pool.active_bin_id(), swap_for_y);
    let mut remaining = amount_in;
    let mut total_out = U256::zero();
    while !remaining.is_zero() {
        let Some(reserves) = pool.bin_reserves(cursor.bin()?) else {
            cursor.advance()?;
            continue;
        };
        let (reserve_in, reserve_out) = reserves.oriented(swap_for_y);
        if reserve_in.is_zero() || reserve_out.is_zero() {
            cursor.advance()?;
            continue;
        }

        let used = remaining.min(reserve_in);
        let out = fixed_point::mul_div(used, reserve_out, fixed_point::add(reserve_in, used)?)?;
        total_out = fixed_point::add(total_out, out)?;
        remaining -= used;

        if used == reserve_in {
            cursor.advance()?;
        }
    }
    Ok(total_out)
}

/// Input required to receive `amount_out`, walking bins until it is filled.
///
/// A bin releases at most `reserve_out - 1`, so no bin is drained to zero.
/// Per-bin inputs are rounded up.
pub fn get_amount_in_v2<P: BinLiquidity + ?Sized>(
    pool: &P,
    amount_out: U256,
    swap_for_y: bool,
) -> Result<U256> {
    if amount_out.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    let (_, total_out) = pool.total_reserves().oriented(swap_for_y);
    if amount_out >= total_out {
        return Err(AmmError::InsufficientReserves);
    }

    let mut cursor = BinCursor::new(pool.active_bin_id(), swap_for_y);
    let mut remaining = amount_out;
    let mut total_in = U256::zero();
    while !remaining.is_zero() {
        let Some(reserves) = pool.bin_reserves(cursor.bin()?) else {
            cursor.advance()?;
            continue;
        };
        let (reserve_in, reserve_out) = reserves.oriented(swap_for_y);
        if reserve_in.is_zero() || reserve_out <= U256::one() {
            cursor.advance()?;
            continue;
        }

        let available = reserve_out - U256::one();
        let taken = remaining.min(available);
        let needed = rounding_up_division(
            fixed_point::mul(taken, reserve_in)?,
            reserve_out - taken,
        )?;
        total_in = fixed_point::add(total_in, needed)?;
        remaining -= taken;

        if taken == available {
            cursor.advance()?;
        }
    }
    Ok(total_in)
}

/// Output for `amount_in` after the swap fee is taken from the input.
pub fn get_amount_out_with_fees_v2<P: BinLiquidity + ?Sized>(
    pool: &P,
    amount_in: U256,
    swap_for_y: bool,
    fee_bps: u32,
) -> Result<U256> {
    let fee = calculate_swap_fee_v2(amount_in, fee_bps)?;
    get_amount_out_v2(pool, fixed_point::sub(amount_in, fee)?, swap_for_y)
}

/// Input, fee included, required to receive `amount_out`.
pub fn get_amount_in_with_fees_v2<P: BinLiquidity + ?Sized>(
    pool: &P,
    amount_out: U256,
    swap_for_y: bool,
    fee_bps: u32,
) -> Result<U256> {
    let before_fee = get_amount_in_v2(pool, amount_out, swap_for_y)?;
    let fee = calculate_fee_to_add(before_fee, fee_bps)?;
    fixed_point::add(before_fee, fee)
}

fn check_lengths(pools: usize, directions: usize, fees: usize) -> Result<()> {
    if pools != directions || pools != fees {
        return Err(AmmError::config("Arrays must have the same length"));
    }
    Ok(())
}

/// Amounts at every step of an exact-input path, starting with `amount_in`.
pub fn get_amounts_out_v2<P: BinLiquidity>(
    pools: &[&P],
    amount_in: U256,
    swap_directions: &[bool],
    fees: &[u32],
) -> Result<Vec<U256>> {
    check_lengths(pools.len(), swap_directions.len(), fees.len())?;

    let mut amounts = Vec::with_capacity(pools.len() + 1);
    amounts.push(amount_in);
    let mut current = amount_in;
    for ((pool, swap_for_y), fee) in pools.iter().zip(swap_directions).zip(fees) {
        current = get_amount_out_with_fees_v2(*pool, current, *swap_for_y, *fee)?;
        amounts.push(current);
    }
    Ok(amounts)
}

/// Amounts at every step of an exact-output path, in trade order; the last
/// entry is `amount_out` and the first is the required input.
pub fn get_amounts_in_v2<P: BinLiquidity>(
    pools: &[&P],
    amount_out: U256,
    swap_directions: &[bool],
    fees: &[u32],
) -> Result<Vec<U256>> {
    check_lengths(pools.len(), swap_directions.len(), fees.len())?;

    let mut amounts = vec![U256::zero(); pools.len() + 1];
    amounts[pools.len()] = amount_out;
    let mut current = amount_out;
    for i in (0..pools.len()).rev() {
        current = get_amount_in_with_fees_v2(pools[i], current, swap_directions[i], fees[i])?;
        amounts[i] = current;
    }
    Ok(amounts)
}

/// Amount of the other asset matching `amount_desired` at the pool's
/// reserve ratio. Zero when either reserve is empty.
pub fn calculate_proportional_amount_v2(
    pool: &PoolMetadataV2,
    amount_desired: U256,
    is_token_x: bool,
) -> Result<U256> {
    let reserves = pool.total_reserves();
    if reserves.x.is_zero() || reserves.y.is_zero() {
        return Ok(U256::zero());
    }
    if is_token_x {
        fixed_point::mul_div(amount_desired, reserves.y, reserves.x)
    } else {
        fixed_point::mul_div(amount_desired, reserves.x, reserves.y)
    }
}
