use crate::error::Result;
use crate::math::fixed_point;
use primitive_types::U256;

fn slippage_amount(amount: U256, slippage_bps: u32) -> Result<U256> {
    fixed_point::mul_div(amount, U256::from(slippage_bps), fixed_point::basis_points())
}

/// Lowest acceptable output: `amount_out - amount_out * bps / 10000`.
pub fn calculate_min_amount_out(amount_out: U256, slippage_bps: u32) -> Result<U256> {
    fixed_point::sub(amount_out, slippage_amount(amount_out, slippage_bps)?)
}

/// Highest acceptable input: `amount_in + amount_in * bps / 10000`.
pub fn calculate_max_amount_in(amount_in: U256, slippage_bps: u32) -> Result<U256> {
    fixed_point::add(amount_in, slippage_amount(amount_in, slippage_bps)?)
}

/// True when `actual` lies within `expected ± expected * bps / 10000`.
pub fn validate_slippage_v2(expected: U256, actual: U256, slippage_bps: u32) -> Result<bool> {
    let tolerance = slippage_amount(expected, slippage_bps)?;
    let min = expected.saturating_sub(tolerance);
    let max = expected.saturating_add(tolerance);
    Ok(actual >= min && actual <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AmmError;

    #[test]
    fn test_min_amount_out() {
        let e18 = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(
            calculate_min_amount_out(e18, 100).unwrap(),
            U256::from(990_000_000_000_000_000u64)
        );
        assert!(calculate_min_amount_out(e18, 10_000).unwrap().is_zero());
        // more than 100% cannot go below zero
        assert_eq!(calculate_min_amount_out(e18, 10_001), Err(AmmError::Overflow));
    }

    #[test]
    fn test_max_amount_in() {
        assert_eq!(
            calculate_max_amount_in(U256::from(10_000), 50).unwrap(),
            U256::from(10_050)
        );
        assert_eq!(calculate_max_amount_in(U256::from(10_000), 0).unwrap(), U256::from(10_000));
    }

    #[test]
    fn test_validate_slippage() {
        let expected = U256::from(10_000);
        assert!(validate_slippage_v2(expected, U256::from(9_900), 100).unwrap());
        assert!(validate_slippage_v2(expected, U256::from(10_100), 100).unwrap());
        assert!(!validate_slippage_v2(expected, U256::from(9_899), 100).unwrap());
        assert!(!validate_slippage_v2(expected, U256::from(10_101), 100).unwrap());
    }
}
