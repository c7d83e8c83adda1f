//! Candidate pairs and bounded route enumeration over the asset graph.
//!
//! Indirect routes are funneled through a small set of liquid base assets,
//! which keeps the search tractable without scanning every listed asset.

use amm_router_domain::{AssetId, PoolId, PoolKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A pool as an edge of the asset graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutablePool {
    /// Identity used to look the pool up in a snapshot.
    pub key: PoolKey,
    /// First asset of the pool.
    pub asset_x: AssetId,
    /// Second asset of the pool.
    pub asset_y: AssetId,
}

impl RoutablePool {
    /// Edge for a v1 pool.
    pub fn v1(pool_id: PoolId) -> Self {
        Self {
            key: PoolKey::V1(pool_id),
            asset_x: pool_id.asset_x,
            asset_y: pool_id.asset_y,
        }
    }

    /// Returns true when either side of the pool is `asset`.
    pub fn involves(&self, asset: &AssetId) -> bool {
        self.asset_x == *asset || self.asset_y == *asset
    }

    /// The asset reached by crossing the pool from `asset`.
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

/// An acyclic path of pools from `asset_in` to `asset_out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Pools in trade order.
    pub pools: Vec<RoutablePool>,
    /// Asset sold.
    pub asset_in: AssetId,
    /// Asset bought.
    pub asset_out: AssetId,
}

impl Route {
    /// Number of pools crossed.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.pools.len()
    }

    /// Assets visited, starting with `asset_in` and ending with `asset_out`.
    pub fn assets(&self) -> Vec<AssetId> {
        let mut assets = Vec::with_capacity(self.pools.len() + 1);
        let mut current = self.asset_in;
        assets.push(current);
        for pool in &self.pools {
            match pool.other(&current) {
                Some(next) => {
                    assets.push(next);
                    current = next;
                }
                None => break,
            }
        }
        assets
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.pools.iter().map(|p| p.key.to_string()).collect();
        write!(f, "{}", keys.join(" -> "))
    }
}

fn unordered(a: AssetId, b: AssetId) -> (AssetId, AssetId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Pairs worth looking up pools for: the direct pair, each side against
/// every base asset, and every two base assets.
///
/// `(A, B)` and `(B, A)` count once, self-pairs are dropped, and the first
/// occurrence keeps its position.
pub fn build_candidate_pairs(
    asset_in: AssetId,
    asset_out: AssetId,
    base_assets: &[AssetId],
) -> Vec<(AssetId, AssetId)> {
    let mut candidates = vec![(asset_in, asset_out)];
    candidates.extend(base_assets.iter().map(|base| (asset_in, *base)));
    candidates.extend(base_assets.iter().map(|base| (asset_out, *base)));
    for (i, a) in base_assets.iter().enumerate() {
        for b in &base_assets[i + 1..] {
            candidates.push((*a, *b));
        }
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|(a, b)| a != b && seen.insert(unordered(*a, *b)))
        .collect()
}

/// Stable and volatile pool ids for every pair, deduplicated.
pub fn get_pool_id_combinations(pairs: &[(AssetId, AssetId)]) -> Vec<PoolId> {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .flat_map(|(a, b)| [PoolId::new(*a, *b, true), PoolId::new(*a, *b, false)])
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Every route from `asset_in` to `asset_out` through `pools`, depth first,
/// in discovery order.
///
/// A route never reuses a pool and holds at most `max_hops` pools. A branch
/// stops as soon as it reaches `asset_out`.
pub fn compute_all_routes(
    asset_in: AssetId,
    asset_out: AssetId,
    pools: &[RoutablePool],
    max_hops: usize,
) -> Vec<Route> {
    let mut routes = Vec::new();
    if max_hops == 0 {
        return routes;
    }
    explore(asset_in, asset_out, pools, &asset_in, &[], max_hops, &mut routes);
    routes
}

fn explore(
    asset_in: AssetId,
    asset_out: AssetId,
    pools: &[RoutablePool],
    current: &AssetId,
    path: &[RoutablePool],
    hops_left: usize,
    routes: &mut Vec<Route>,
) {
    for pool in pools {
        if path.contains(pool) {
            continue;
        }
        let Some(next) = pool.other(current) else {
            continue;
        };

        let mut next_path = path.to_vec();
        next_path.push(*pool);
        if next == asset_out {
            routes.push(Route {
                pools: next_path,
                asset_in,
                asset_out,
            });
        } else if hops_left > 1 {
            explore(asset_in, asset_out, pools, &next, &next_path, hops_left - 1, routes);
        }
    }
}
