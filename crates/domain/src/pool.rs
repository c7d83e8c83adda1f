//! Pool identities and the reserve snapshots quoted against.

use crate::error::{AmmError, Result};
use crate::math::fixed_point;
use crate::token::AssetId;
use crate::value_objects::Amounts;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identity of a v1 (constant-product or StableSwap) pool.
///
/// The two assets are always stored in ascending order, so `(A, B, s)` and
/// `(B, A, s)` construct equal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "PoolIdParts")]
pub struct PoolId {
    pub asset_x: AssetId,
    pub asset_y: AssetId,
    pub is_stable: bool,
}

#[derive(Deserialize)]
struct PoolIdParts {
    asset_x: AssetId,
    asset_y: AssetId,
    is_stable: bool,
}

impl From<PoolIdParts> for PoolId {
    fn from(parts: PoolIdParts) -> Self {
        PoolId::new(parts.asset_x, parts.asset_y, parts.is_stable)
    }
}

impl PoolId {
    pub fn new(a: AssetId, b: AssetId, is_stable: bool) -> Self {
        let (asset_x, asset_y) = if a <= b { (a, b) } else { (b, a) };
        Self {
            asset_x,
            asset_y,
            is_stable,
        }
    }

    /// Key the indexer uses for this pool: `"{assetX}-{assetY}-{isStable}"`.
    pub fn snapshot_key(&self) -> String {
        format!("{}-{}-{}", self.asset_x, self.asset_y, self.is_stable)
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.asset_x == *asset || self.asset_y == *asset
    }

    /// The asset on the other side of the pool, if `asset` belongs to it.
    pub fn other(&self, asset: &AssetId) -> Option<AssetId> {
        if self.asset_x == *asset {
            Some(self.asset_y)
        } else if self.asset_y == *asset {
            Some(self.asset_x)
        } else {
            None
        }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snapshot_key())
    }
}

impl FromStr for PoolId {
    type Err = AmmError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, '-');
        let (Some(a), Some(b), Some(flag)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AmmError::InvalidIdentifier(s.to_string()));
        };
        let is_stable = flag
            .parse::<bool>()
            .map_err(|_| AmmError::InvalidIdentifier(s.to_string()))?;
        Ok(PoolId::new(a.parse()?, b.parse()?, is_stable))
    }
}

/// Numeric identity of a v2 (binned liquidity) pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolIdV2(pub U256);

impl fmt::Display for PoolIdV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Either pool family, as it appears in a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PoolKey {
    V1(PoolId),
    V2(PoolIdV2),
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKey::V1(id) => write!(f, "{}{}", if id.is_stable { "stable:" } else { "volatile:" }, id),
            PoolKey::V2(id) => write!(f, "bin:{id}"),
        }
    }
}

/// One hop's view of a v1 pool, oriented from the input asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopReserves {
    pub asset_out: AssetId,
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub decimals_in: u8,
    pub decimals_out: u8,
}

/// Reserve snapshot of a v1 pool. `reserve_0`/`decimals_0` belong to
/// `pool_id.asset_x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPoolV1", into = "RawPoolV1")]
pub struct PoolMetadataV1 {
    pub pool_id: PoolId,
    pub reserve_0: U256,
    pub reserve_1: U256,
    pub decimals_0: u8,
    pub decimals_1: u8,
}

#[derive(Serialize, Deserialize)]
struct RawPoolV1 {
    asset_0: AssetId,
    asset_1: AssetId,
    is_stable: bool,
    reserve_0: U256,
    reserve_1: U256,
    decimals_0: u8,
    decimals_1: u8,
}

impl From<RawPoolV1> for PoolMetadataV1 {
    fn from(raw: RawPoolV1) -> Self {
        PoolMetadataV1::new(
            (raw.asset_0, raw.reserve_0, raw.decimals_0),
            (raw.asset_1, raw.reserve_1, raw.decimals_1),
            raw.is_stable,
        )
    }
}

impl From<PoolMetadataV1> for RawPoolV1 {
    fn from(pool: PoolMetadataV1) -> Self {
        RawPoolV1 {
            asset_0: pool.pool_id.asset_x,
            asset_1: pool.pool_id.asset_y,
            is_stable: pool.pool_id.is_stable,
            reserve_0: pool.reserve_0,
            reserve_1: pool.reserve_1,
            decimals_0: pool.decimals_0,
            decimals_1: pool.decimals_1,
        }
    }
}

impl PoolMetadataV1 {
    /// Builds a snapshot from `(asset, reserve, decimals)` sides given in
    /// any order.
    pub fn new(a: (AssetId, U256, u8), b: (AssetId, U256, u8), is_stable: bool) -> Self {
        let (first, second) = if a.0 <= b.0 { (a, b) } else { (b, a) };
        Self {
            pool_id: PoolId::new(first.0, second.0, is_stable),
            reserve_0: first.1,
            reserve_1: second.1,
            decimals_0: first.2,
            decimals_1: second.2,
        }
    }

    /// Orients the reserves for a swap that sells `asset_in`.
    pub fn arrange(&self, asset_in: &AssetId) -> Result<HopReserves> {
        if *asset_in == self.pool_id.asset_x {
            Ok(HopReserves {
                asset_out: self.pool_id.asset_y,
                reserve_in: self.reserve_0,
                reserve_out: self.reserve_1,
                decimals_in: self.decimals_0,
                decimals_out: self.decimals_1,
            })
        } else if *asset_in == self.pool_id.asset_y {
            Ok(HopReserves {
                asset_out: self.pool_id.asset_x,
                reserve_in: self.reserve_1,
                reserve_out: self.reserve_0,
                decimals_in: self.decimals_1,
                decimals_out: self.decimals_0,
            })
        } else {
            Err(AmmError::UnknownAsset(*asset_in))
        }
    }
}

/// Per-bin reserve lookup for a binned pool.
pub trait BinLiquidity {
    fn active_bin_id(&self) -> i32;

    /// Reserves held in `bin_id`, or `None` when the bin tracks no liquidity.
    fn bin_reserves(&self, bin_id: i32) -> Option<Amounts>;

    /// Reserves across every bin of the pool.
    fn total_reserves(&self) -> Amounts;
}

/// Reserve snapshot of a v2 (binned liquidity) pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadataV2 {
    pub pool_id: PoolIdV2,
    pub asset_x: AssetId,
    pub asset_y: AssetId,
    pub bin_step: u32,
    pub base_factor: u32,
    #[serde(alias = "active_id")]
    pub active_bin_id: i32,
    /// Pool-wide reserves. With no per-bin map these sit in the active bin.
    pub reserves: Amounts,
    #[serde(default)]
    pub protocol_fees: Amounts,
    #[serde(default)]
    pub bins: BTreeMap<i32, Amounts>,
}

impl PoolMetadataV2 {
    /// Base swap fee in basis points: `ceil(bin_step * base_factor / 10000)`.
    ///
    /// A fee of 10000 bps or more comes from bad pool data and is reported as
    /// [`AmmError::InvalidPool`].
    pub fn swap_fee_bps(&self) -> Result<u32> {
        let fee = fixed_point::mul_div_up(
            U256::from(self.bin_step),
            U256::from(self.base_factor),
            fixed_point::basis_points(),
        )?;
        if fee >= fixed_point::basis_points() {
            return Err(AmmError::InvalidPool(
                self.pool_id.to_string(),
                format!("fee {fee} bps out of range"),
            ));
        }
        Ok(fee.low_u32())
    }

    /// Whether selling `asset_in` swaps X for Y.
    pub fn swap_for_y(&self, asset_in: &AssetId) -> Result<bool> {
        if *asset_in == self.asset_x {
            Ok(true)
        } else if *asset_in == self.asset_y {
            Ok(false)
        } else {
            Err(AmmError::UnknownAsset(*asset_in))
        }
    }

    pub fn asset_out(&self, swap_for_y: bool) -> AssetId {
        if swap_for_y { self.asset_y } else { self.asset_x }
    }
}

impl BinLiquidity for PoolMetadataV2 {
    fn active_bin_id(&self) -> i32 {
        self.active_bin_id
    }

    fn bin_reserves(&self, bin_id: i32) -> Option<Amounts> {
        if self.bins.is_empty() {
            return (bin_id == self.active_bin_id).then_some(self.reserves);
        }
        self.bins.get(&bin_id).copied()
    }

    fn total_reserves(&self) -> Amounts {
        self.reserves
    }
}
