use crate::error::{AmmError, Result};
use crate::math::fixed_point;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A base-unit amount tagged with the decimals of its asset, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Converts a human-readable quantity into base units, truncating any
    /// precision below one base unit.
    pub fn from_decimal(d: Decimal, decimals: u8) -> Result<Self> {
        if d.is_sign_negative() {
            return Err(AmmError::InvalidAmount);
        }
        let mantissa = u128::try_from(d.mantissa()).map_err(|_| AmmError::InvalidAmount)?;
        let raw = fixed_point::mul_div(
            U256::from(mantissa),
            fixed_point::pow_decimals(decimals)?,
            fixed_point::pow_decimals(d.scale() as u8)?,
        )?;
        Ok(Self { raw, decimals })
    }

    /// Human-readable value. `None` when the amount does not fit a `Decimal`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.raw > U256::from(u128::MAX) {
            return None;
        }
        let raw = i128::try_from(self.raw.as_u128()).ok()?;
        let (value, scale) = if self.decimals > 28 {
            let shift = u32::from(self.decimals) - 28;
            (raw / 10i128.pow(shift), 28)
        } else {
            (raw, u32::from(self.decimals))
        };
        Decimal::try_from_i128_with_scale(value, scale)
            .ok()
            .map(|d| d.normalize())
    }
}

/// A pair of base-unit amounts in the X and Y assets of a pool.
///
/// Used for bin reserves, liquidity contributions and accrued fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amounts {
    pub x: U256,
    pub y: U256,
}

impl Amounts {
    pub fn new(x: impl Into<U256>, y: impl Into<U256>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    pub fn checked_add(&self, other: &Amounts) -> Result<Amounts> {
        Ok(Amounts {
            x: fixed_point::add(self.x, other.x)?,
            y: fixed_point::add(self.y, other.y)?,
        })
    }

    /// Reserve on the input side and the output side of a swap.
    pub fn oriented(&self, swap_for_y: bool) -> (U256, U256) {
        if swap_for_y {
            (self.x, self.y)
        } else {
            (self.y, self.x)
        }
    }
}
