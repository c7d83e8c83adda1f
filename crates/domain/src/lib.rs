//! Pool math and data model for constant-product, StableSwap and binned
//! liquidity pools.
//!
//! Every function here is pure: it reads the snapshot it is given and
//! returns a value or an [`AmmError`]. Nothing is cached or mutated.

pub mod error;
pub mod fees;
pub mod math;
pub mod metrics;
pub mod pool;
pub mod position;
pub mod token;
pub mod value_objects;

pub use error::{AmmError, Result};
pub use fees::AmmFees;
pub use pool::{BinLiquidity, PoolId, PoolIdV2, PoolKey, PoolMetadataV1, PoolMetadataV2};
pub use token::{AssetId, AssetMetadata};
pub use value_objects::{Amount, Amounts};
