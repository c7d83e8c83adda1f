//! Allocation of a deposit across the bins of a v2 pool.

use crate::error::{AmmError, Result};
use crate::math::bin_price::get_bin_price;
use crate::math::bin_swap::MAX_BIN_TRAVERSAL;
use crate::math::fixed_point::{self, BASIS_POINTS, ONE_E_18};
use crate::value_objects::Amounts;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Widest range [`calculate_optimal_distribution`] will spread over: every
/// bin a swap may reach on either side of the active bin.
pub const MAX_DISTRIBUTION_BINS: i64 = 2 * MAX_BIN_TRAVERSAL + 1;

/// Deposit weights for one bin. X and Y weights are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityConfig {
    pub bin_id: i32,
    pub distribution_x: u64,
    pub distribution_y: u64,
}

/// Splits the totals across bins in proportion to each bin's weight on the
/// matching axis. Amounts round down, so the sum may fall short of the
/// total by less than one unit per bin. Configs naming the same bin add up.
///
/// An axis whose weights sum to zero receives nothing; both summing to zero
/// is a configuration error.
pub fn calculate_liquidity_distribution_v2(
    total_amount_x: U256,
    total_amount_y: U256,
    configs: &[LiquidityConfig],
) -> Result<BTreeMap<i32, Amounts>> {
    let total_x: u128 = configs.iter().map(|c| u128::from(c.distribution_x)).sum();
    let total_y: u128 = configs.iter().map(|c| u128::from(c.distribution_y)).sum();
    if total_x == 0 && total_y == 0 {
        return Err(AmmError::config("Total distribution cannot be zero"));
    }

    let share = |total: U256, weight: u64, weights: u128| -> Result<U256> {
        if weights == 0 {
            return Ok(U256::zero());
        }
        fixed_point::mul_div(total, U256::from(weight), U256::from(weights))
    };

    let mut bins: BTreeMap<i32, Amounts> = BTreeMap::new();
    for config in configs {
        let amounts = Amounts {
            x: share(total_amount_x, config.distribution_x, total_x)?,
            y: share(total_amount_y, config.distribution_y, total_y)?,
        };
        let entry = bins.entry(config.bin_id).or_default();
        *entry = entry.checked_add(&amounts)?;
    }
    Ok(bins)
}

/// Weights decaying exponentially with distance from the active bin:
/// `exp(-distance * concentration_factor * 5 / max_distance)`, scaled to
/// basis points and divided by the number of bins.
///
/// X weight goes to bins at or below the active bin, Y weight to bins at or
/// above it.
pub fn calculate_optimal_distribution(
    active_bin_id: i32,
    min_bin_id: i32,
    max_bin_id: i32,
    concentration_factor: f64,
) -> Result<Vec<LiquidityConfig>> {
    if !(0.0..=1.0).contains(&concentration_factor) {
        return Err(AmmError::config(
            "Concentration factor must be between 0 and 1",
        ));
    }
    if min_bin_id > max_bin_id {
        return Err(AmmError::config(format!(
            "min bin {min_bin_id} above max bin {max_bin_id}"
        )));
    }

    let span = i64::from(max_bin_id) - i64::from(min_bin_id) + 1;
    if span > MAX_DISTRIBUTION_BINS {
        return Err(AmmError::config(format!(
            "range of {span} bins exceeds {MAX_DISTRIBUTION_BINS}"
        )));
    }

    let active = i64::from(active_bin_id);
    let total_bins = span as f64;
    let max_distance = (active - i64::from(min_bin_id)).max(i64::from(max_bin_id) - active);

    let configs = (min_bin_id..=max_bin_id)
        .map(|bin_id| {
            let distance = (i64::from(bin_id) - active).abs();
            let weight = if max_distance > 0 {
                (-(distance as f64) * concentration_factor * 5.0 / max_distance as f64).exp()
            } else {
                1.0
            };
            let normalized = (weight * BASIS_POINTS as f64 / total_bins).floor() as u64;
            LiquidityConfig {
                bin_id,
                distribution_x: if bin_id <= active_bin_id { normalized } else { 0 },
                distribution_y: if bin_id >= active_bin_id { normalized } else { 0 },
            }
        })
        .collect();
    Ok(configs)
}

/// Builds configs from bin offsets relative to the active bin and fractional
/// weights (`0.25` is 2500 bps).
pub fn liquidity_configs_from_deltas(
    active_bin_id: i32,
    deltas: &[i32],
    distribution_x: &[f64],
    distribution_y: &[f64],
) -> Result<Vec<LiquidityConfig>> {
    if deltas.len() != distribution_x.len() || deltas.len() != distribution_y.len() {
        return Err(AmmError::config(
            "Delta IDs and distribution arrays must have the same length",
        ));
    }

    let to_bps = |w: f64| -> Result<u64> {
        if !w.is_finite() || w < 0.0 {
            return Err(AmmError::config(format!("invalid distribution weight {w}")));
        }
        Ok((w * BASIS_POINTS as f64).floor() as u64)
    };

    deltas
        .iter()
        .zip(distribution_x.iter().zip(distribution_y))
        .map(|(delta, (dx, dy))| {
            let bin_id = active_bin_id
                .checked_add(*delta)
                .ok_or_else(|| AmmError::config(format!("bin offset {delta} out of range")))?;
            Ok(LiquidityConfig {
                bin_id,
                distribution_x: to_bps(*dx)?,
                distribution_y: to_bps(*dy)?,
            })
        })
        .collect()
}

/// Liquidity of a bin holding `amount_x` and `amount_y`, in Y terms.
///
/// One-sided bins count their Y directly or their X at the bin price; mixed
/// bins use the geometric mean `sqrt(x * y * price)`.
pub fn calculate_bin_liquidity(
    amount_x: U256,
    amount_y: U256,
    bin_id: i32,
    bin_step: u32,
) -> Result<U256> {
    if amount_x.is_zero() && amount_y.is_zero() {
        return Ok(U256::zero());
    }
    if amount_x.is_zero() {
        return Ok(amount_y);
    }
    let price = get_bin_price(bin_id, bin_step)?;
    if amount_y.is_zero() {
        return fixed_point::mul_div(amount_x, price, ONE_E_18);
    }
    let product = fixed_point::mul_div(fixed_point::mul(amount_x, amount_y)?, price, ONE_E_18)?;
    Ok(product.integer_sqrt())
}
