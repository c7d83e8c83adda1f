//! Reserve snapshots and the collaborator that supplies them.

use crate::error::RouterError;
use crate::graph::{RoutablePool, get_pool_id_combinations};
use amm_router_domain::{
    AmmError, AssetId, AssetMetadata, PoolId, PoolIdV2, PoolKey, PoolMetadataV1, PoolMetadataV2,
    Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Everything quoting needs to know about the market at one instant.
///
/// Immutable once built; quoting borrows it and never writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSnapshot", into = "RawSnapshot")]
pub struct PoolSnapshot {
    assets: BTreeMap<AssetId, AssetMetadata>,
    pools_v1: BTreeMap<PoolId, PoolMetadataV1>,
    pools_v2: BTreeMap<PoolIdV2, PoolMetadataV2>,
}

#[derive(Default, Serialize, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    assets: BTreeMap<AssetId, AssetMetadata>,
    #[serde(default)]
    pools_v1: Vec<PoolMetadataV1>,
    #[serde(default)]
    pools_v2: Vec<PoolMetadataV2>,
}

impl From<RawSnapshot> for PoolSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        let mut snapshot = PoolSnapshot {
            assets: raw.assets,
            ..PoolSnapshot::default()
        };
        for pool in raw.pools_v1 {
            snapshot.insert_v1(pool);
        }
        for pool in raw.pools_v2 {
            snapshot.insert_v2(pool);
        }
        snapshot
    }
}

impl From<PoolSnapshot> for RawSnapshot {
    fn from(snapshot: PoolSnapshot) -> Self {
        RawSnapshot {
            assets: snapshot.assets,
            pools_v1: snapshot.pools_v1.into_values().collect(),
            pools_v2: snapshot.pools_v2.into_values().collect(),
        }
    }
}

impl PoolSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an asset's metadata.
    ///
    /// Listed decimals take precedence over those carried by v1 pools,
    /// including pools already in the snapshot.
    pub fn insert_asset(&mut self, asset: AssetId, metadata: AssetMetadata) {
        for pool in self.pools_v1.values_mut() {
            if pool.pool_id.asset_x == asset {
                pool.decimals_0 = metadata.decimals;
            }
            if pool.pool_id.asset_y == asset {
                pool.decimals_1 = metadata.decimals;
            }
        }
        self.assets.insert(asset, metadata);
    }

    /// Adds or replaces a v1 pool. Decimals of listed assets override the
    /// pool's own.
    pub fn insert_v1(&mut self, mut pool: PoolMetadataV1) {
        if let Some(meta) = self.assets.get(&pool.pool_id.asset_x) {
            pool.decimals_0 = meta.decimals;
        }
        if let Some(meta) = self.assets.get(&pool.pool_id.asset_y) {
            pool.decimals_1 = meta.decimals;
        }
        self.pools_v1.insert(pool.pool_id, pool);
    }

    /// Adds or replaces a v2 pool.
    pub fn insert_v2(&mut self, pool: PoolMetadataV2) {
        self.pools_v2.insert(pool.pool_id, pool);
    }

    /// Metadata of an asset, if listed.
    pub fn asset(&self, asset: &AssetId) -> Option<&AssetMetadata> {
        self.assets.get(asset)
    }

    /// Looks up a v1 pool.
    pub fn pool_v1(&self, pool_id: &PoolId) -> Result<&PoolMetadataV1> {
        self.pools_v1
            .get(pool_id)
            .ok_or_else(|| AmmError::UnknownPool(pool_id.snapshot_key()))
    }

    /// Looks up a v1 pool by its indexer key `"{assetX}-{assetY}-{isStable}"`.
    pub fn pool_v1_by_key(&self, key: &str) -> Result<&PoolMetadataV1> {
        self.pool_v1(&key.parse()?)
    }

    /// Looks up a v2 pool.
    pub fn pool_v2(&self, pool_id: &PoolIdV2) -> Result<&PoolMetadataV2> {
        self.pools_v2
            .get(pool_id)
            .ok_or_else(|| AmmError::UnknownPool(pool_id.to_string()))
    }

    /// Number of pools of both families.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools_v1.len() + self.pools_v2.len()
    }

    /// Every pool in the snapshot as a graph edge, v1 first, each family in
    /// id order.
    pub fn routable_pools(&self) -> Vec<RoutablePool> {
        self.pools_v1
            .keys()
            .map(|id| RoutablePool::v1(*id))
            .chain(self.pools_v2.values().map(v2_edge))
            .collect()
    }

    /// Pools trading one of `pairs`, in candidate order. Pools missing from
    /// the snapshot are skipped.
    pub fn candidate_pools(&self, pairs: &[(AssetId, AssetId)]) -> Vec<RoutablePool> {
        let wanted: HashSet<(AssetId, AssetId)> = pairs.iter().map(|(a, b)| ordered(*a, *b)).collect();
        let v1 = get_pool_id_combinations(pairs)
            .into_iter()
            .filter(|id| self.pools_v1.contains_key(id))
            .map(RoutablePool::v1);
        let v2 = self
            .pools_v2
            .values()
            .filter(|pool| wanted.contains(&ordered(pool.asset_x, pool.asset_y)))
            .map(v2_edge);
        v1.chain(v2).collect()
    }
}

fn ordered(a: AssetId, b: AssetId) -> (AssetId, AssetId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn v2_edge(pool: &PoolMetadataV2) -> RoutablePool {
    RoutablePool {
        key: PoolKey::V2(pool.pool_id),
        asset_x: pool.asset_x,
        asset_y: pool.asset_y,
    }
}

/// Supplier of reserve snapshots (an indexer, a node, a file).
///
/// Retries and timeouts belong to the implementation.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetches reserves for pools trading any of `pairs`.
    async fn fetch_snapshot(
        &self,
        pairs: &[(AssetId, AssetId)],
    ) -> std::result::Result<PoolSnapshot, RouterError>;
}

/// In-memory source that hands out a shared snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource {
    snapshot: Arc<RwLock<PoolSnapshot>>,
}

impl StaticSnapshotSource {
    /// Creates a source serving `snapshot`.
    pub fn new(snapshot: PoolSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Replaces the snapshot served to later fetches.
    pub async fn replace(&self, snapshot: PoolSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn fetch_snapshot(
        &self,
        _pairs: &[(AssetId, AssetId)],
    ) -> std::result::Result<PoolSnapshot, RouterError> {
        Ok(self.snapshot.read().await.clone())
    }
}

/// Source reading a JSON snapshot file on every fetch.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    /// Creates a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn fetch_snapshot(
        &self,
        _pairs: &[(AssetId, AssetId)],
    ) -> std::result::Result<PoolSnapshot, RouterError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RouterError::Snapshot(format!("{}: {e}", self.path.display())))?;
        let snapshot: PoolSnapshot = serde_json::from_str(&raw)
            .map_err(|e| RouterError::Snapshot(format!("{}: {e}", self.path.display())))?;
        debug!(
            path = %self.path.display(),
            pools = snapshot.pool_count(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }
}
