use crate::error::{AmmError, Result};
use crate::math::fixed_point::{self, BASIS_POINTS};
use crate::pool::PoolId;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Fee schedule for v1 pools, in basis points.
///
/// The rate charged on a hop is the LP fee plus the protocol fee of the
/// pool's family (stable or volatile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmFees {
    pub lp_fee_volatile: u32,
    pub lp_fee_stable: u32,
    pub protocol_fee_volatile: u32,
    pub protocol_fee_stable: u32,
}

impl Default for AmmFees {
    fn default() -> Self {
        Self {
            lp_fee_volatile: 30,
            lp_fee_stable: 5,
            protocol_fee_volatile: 0,
            protocol_fee_stable: 0,
        }
    }
}

impl AmmFees {
    /// Total fee in basis points charged by `pool_id`.
    pub fn fee_for(&self, pool_id: &PoolId) -> u32 {
        if pool_id.is_stable {
            self.lp_fee_stable.saturating_add(self.protocol_fee_stable)
        } else {
            self.lp_fee_volatile.saturating_add(self.protocol_fee_volatile)
        }
    }

    /// Both combined rates must stay below 100%.
    pub fn validate(&self) -> Result<()> {
        let stable = self.lp_fee_stable.saturating_add(self.protocol_fee_stable);
        let volatile = self.lp_fee_volatile.saturating_add(self.protocol_fee_volatile);
        if u64::from(stable) >= BASIS_POINTS || u64::from(volatile) >= BASIS_POINTS {
            return Err(AmmError::config(format!(
                "fees must be below {BASIS_POINTS} bps (stable {stable}, volatile {volatile})"
            )));
        }
        Ok(())
    }
}

fn check_rate(fee_bps: u32) -> Result<U256> {
    if u64::from(fee_bps) >= BASIS_POINTS {
        return Err(AmmError::config(format!("fee {fee_bps} bps out of range")));
    }
    Ok(U256::from(fee_bps))
}

/// Fee taken out of a gross `amount`: `ceil(amount * fee / 10000)`.
pub fn calculate_fee_to_subtract(amount: U256, fee_bps: u32) -> Result<U256> {
    let fee = check_rate(fee_bps)?;
    fixed_point::mul_div_up(amount, fee, fixed_point::basis_points())
}

/// Fee to add on top of a net `amount` so that, once the fee is deducted,
/// `amount` remains: `ceil(amount * fee / (10000 - fee))`.
pub fn calculate_fee_to_add(amount: U256, fee_bps: u32) -> Result<U256> {
    let fee = check_rate(fee_bps)?;
    fixed_point::mul_div_up(amount, fee, fixed_point::basis_points() - fee)
}

/// Amount left after charging the fee of `pool_id`.
pub fn subtract_fee(pool_id: &PoolId, amount: U256, fees: &AmmFees) -> Result<U256> {
    let fee = calculate_fee_to_subtract(amount, fees.fee_for(pool_id))?;
    fixed_point::sub(amount, fee)
}

/// Gross amount whose post-fee remainder covers `amount`.
pub fn add_fee(pool_id: &PoolId, amount: U256, fees: &AmmFees) -> Result<U256> {
    let fee = calculate_fee_to_add(amount, fees.fee_for(pool_id))?;
    fixed_point::add(amount, fee)
}
