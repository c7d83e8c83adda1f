use crate::error::{AmmError, Result};
use crate::math::fixed_point::{self, ONE_E_18};
use crate::value_objects::Amounts;
use primitive_types::U256;

fn value_in_y(amounts: &Amounts, price: U256) -> Result<U256> {
    fixed_point::add(amounts.y, fixed_point::mul_div(amounts.x, price, ONE_E_18)?)
}

/// Impermanent loss of a v2 position, in basis points of the hold value.
///
/// Both bundles are valued in Y at `current_price` (1e18-scaled Y per X):
/// loss = (hold - current) * 10000 / hold. Positive values are losses,
/// negative values mean the position outperformed holding. Zero when the
/// initial bundle is worthless.
///
/// # Arguments
///
/// * `initial_amounts` - Amounts deposited when the position was opened
/// * `current_amounts` - Amounts the position would withdraw now
/// * `current_price` - Price of X in Y, 1e18-scaled
pub fn calculate_impermanent_loss_v2(
    initial_amounts: &Amounts,
    current_amounts: &Amounts,
    current_price: U256,
) -> Result<i128> {
    let hold = value_in_y(initial_amounts, current_price)?;
    if hold.is_zero() {
        return Ok(0);
    }
    let current = value_in_y(current_amounts, current_price)?;

    let (magnitude, is_loss) = if hold >= current {
        (hold - current, true)
    } else {
        (current - hold, false)
    };
    let bps = fixed_point::mul_div(magnitude, fixed_point::basis_points(), hold)?;
    if bps > U256::from(i128::MAX as u128) {
        return Err(AmmError::Overflow);
    }
    let bps = bps.as_u128() as i128;
    Ok(if is_loss { bps } else { -bps })
}
