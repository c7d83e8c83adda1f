use crate::error::{AmmError, Result};
use crate::math::fixed_point::{self, ONE_E_18};
use primitive_types::U256;

/// Realized price of a trade, `amount_out / amount_in` at 1e18 scale.
///
/// Fails with `InvalidAmount` on a zero input.
pub fn calculate_effective_price(amount_in: U256, amount_out: U256) -> Result<U256> {
    if amount_in.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    fixed_point::mul_div(amount_out, ONE_E_18, amount_in)
}

/// Distance between spot and effective price in basis points of spot.
///
/// A zero spot price yields zero impact rather than an error.
pub fn calculate_price_impact(spot_price: U256, effective_price: U256) -> Result<U256> {
    if spot_price.is_zero() {
        return Ok(U256::zero());
    }
    let diff = if spot_price > effective_price {
        spot_price - effective_price
    } else {
        effective_price - spot_price
    };
    fixed_point::mul_div(diff, fixed_point::basis_points(), spot_price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_price() {
        let price = calculate_effective_price(U256::from(100), U256::from(250)).unwrap();
        assert_eq!(price, ONE_E_18 * U256::from(5) / U256::from(2));
        assert_eq!(
            calculate_effective_price(U256::zero(), U256::from(1)),
            Err(AmmError::InvalidAmount)
        );
    }

    #[test]
    fn test_price_impact() {
        // effective 0.99 against spot 1.00 -> 100 bps
        let spot = ONE_E_18;
        let effective = ONE_E_18 * U256::from(99) / U256::from(100);
        assert_eq!(calculate_price_impact(spot, effective).unwrap(), U256::from(100));
        // symmetric above spot
        let above = ONE_E_18 * U256::from(101) / U256::from(100);
        assert_eq!(calculate_price_impact(spot, above).unwrap(), U256::from(100));
        // zero spot does not fail
        assert!(calculate_price_impact(U256::zero(), effective).unwrap().is_zero());
    }
}
