use crate::error::Result;
use crate::math::bin_price::get_bin_price;
use crate::math::fixed_point::{self, ONE_E_18};
use crate::value_objects::Amounts;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A liquidity provider's holdings in one bin of a v2 pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinPosition {
    pub bin_id: i32,
    pub amounts: Amounts,
}

impl BinPosition {
    pub fn new(bin_id: i32, amounts: Amounts) -> Self {
        Self { bin_id, amounts }
    }
}

/// Sum of the X and Y held across `positions`, with no price conversion.
pub fn calculate_position_value(positions: &[BinPosition]) -> Result<Amounts> {
    positions
        .iter()
        .try_fold(Amounts::zero(), |total, position| total.checked_add(&position.amounts))
}

/// Value of `positions` in Y, pricing each bin's X at that bin's price.
pub fn calculate_position_value_in_y(positions: &[BinPosition], bin_step: u32) -> Result<U256> {
    positions.iter().try_fold(U256::zero(), |total, position| {
        let price = get_bin_price(position.bin_id, bin_step)?;
        let x_in_y = fixed_point::mul_div(position.amounts.x, price, ONE_E_18)?;
        fixed_point::add(total, fixed_point::add(position.amounts.y, x_in_y)?)
    })
}
