//! Route quoting against a reserve snapshot.

use crate::config::RouterConfig;
use crate::graph::Route;
use crate::snapshot::PoolSnapshot;
use amm_router_domain::fees::{calculate_fee_to_add, calculate_fee_to_subtract};
use amm_router_domain::math::{bin_swap, curve, fixed_point};
use amm_router_domain::metrics::calculate_swap_fee_v2;
use amm_router_domain::{
    AmmError, AmmFees, AssetId, BinLiquidity, PoolKey, PoolMetadataV2, Result,
};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest probe used to read the marginal rate of curved pools.
const MIN_SPOT_PROBE: u64 = 100;

/// Probe size as a fraction of the input reserve (1 / 1e6).
const SPOT_PROBE_DIVISOR: u64 = 1_000_000;

/// Which side of the trade the user fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    /// Input amount is fixed, output is quoted.
    ExactIn,
    /// Output amount is fixed, input is quoted.
    ExactOut,
}

/// One pool crossing inside a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopQuote {
    /// Pool crossed.
    pub pool: PoolKey,
    /// Asset sold into the pool.
    pub asset_in: AssetId,
    /// Asset bought from the pool.
    pub asset_out: AssetId,
    /// Gross amount sold, fee included.
    pub amount_in: U256,
    /// Amount bought.
    pub amount_out: U256,
    /// Fee charged, in `asset_in` units.
    pub fee: U256,
}

/// Result of quoting one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Route quoted.
    pub route: Route,
    /// Total input.
    pub amount_in: U256,
    /// Total output.
    pub amount_out: U256,
    /// Side the caller fixed.
    pub trade_type: TradeType,
    /// Per-pool breakdown in trade order.
    pub hops: Vec<HopQuote>,
}

impl Quote {
    /// The amount the quote produced, as opposed to the one requested.
    #[must_use]
    pub fn quoted_amount(&self) -> U256 {
        match self.trade_type {
            TradeType::ExactIn => self.amount_out,
            TradeType::ExactOut => self.amount_in,
        }
    }

    /// A quote is usable when neither side is zero.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.amount_in.is_zero() && !self.amount_out.is_zero()
    }

    /// Fee charged by the first pool, in input-asset units.
    pub fn input_fee(&self) -> U256 {
        self.hops.first().map(|hop| hop.fee).unwrap_or_default()
    }
}

/// Prices routes against a single snapshot.
///
/// Quoting never mutates the snapshot, so one quoter may serve many routes
/// concurrently.
#[derive(Debug, Clone)]
pub struct Quoter<'a> {
    snapshot: &'a PoolSnapshot,
    fees: AmmFees,
    v2_fee_override: Option<u32>,
}

impl<'a> Quoter<'a> {
    /// Creates a new quoter over `snapshot` with the fees of `config`.
    pub fn new(snapshot: &'a PoolSnapshot, config: &RouterConfig) -> Self {
        Self {
            snapshot,
            fees: config.fees,
            v2_fee_override: config.default_v2_fee_bps,
        }
    }

    fn v2_fee(&self, pool: &PoolMetadataV2) -> Result<u32> {
        match self.v2_fee_override {
            Some(fee) => Ok(fee),
            None => pool.swap_fee_bps(),
        }
    }

    /// Quotes `amount` along `route`.
    ///
    /// Exact-in walks the route forward from the input; exact-out walks it
    /// backwards from the requested output.
    pub fn quote_route(&self, route: &Route, amount: U256, trade_type: TradeType) -> Result<Quote> {
        if route.pools.is_empty() {
            return Err(AmmError::InvalidConfiguration(
                "route must contain at least one pool".to_string(),
            ));
        }
        if amount.is_zero() {
            return Err(AmmError::InvalidAmount);
        }

        let hops = match trade_type {
            TradeType::ExactIn => self.walk_forward(route, amount)?,
            TradeType::ExactOut => self.walk_backward(route, amount)?,
        };
        let (amount_in, amount_out) = match (hops.first(), hops.last()) {
            (Some(first), Some(last)) => (first.amount_in, last.amount_out),
            _ => return Err(AmmError::InvalidAmount),
        };
        Ok(Quote {
            route: route.clone(),
            amount_in,
            amount_out,
            trade_type,
            hops,
        })
    }

    fn walk_forward(&self, route: &Route, amount_in: U256) -> Result<Vec<HopQuote>> {
        let mut hops = Vec::with_capacity(route.pools.len());
        let (mut asset, mut amount) = (route.asset_in, amount_in);
        for pool in &route.pools {
            let hop = match pool.key {
                PoolKey::V1(pool_id) => {
                    let meta = self.snapshot.pool_v1(&pool_id)?;
                    let reserves = meta.arrange(&asset)?;
                    let fee = calculate_fee_to_subtract(amount, self.fees.fee_for(&pool_id))?;
                    let amount_out = curve::get_amount_out(
                        pool_id.is_stable,
                        reserves.reserve_in,
                        reserves.reserve_out,
                        reserves.decimals_in,
                        reserves.decimals_out,
                        fixed_point::sub(amount, fee)?,
                    )?;
                    HopQuote {
                        pool: pool.key,
                        asset_in: asset,
                        asset_out: reserves.asset_out,
                        amount_in: amount,
                        amount_out,
                        fee,
                    }
                }
                PoolKey::V2(pool_id) => {
                    let meta = self.snapshot.pool_v2(&pool_id)?;
                    let swap_for_y = meta.swap_for_y(&asset)?;
                    let fee = calculate_swap_fee_v2(amount, self.v2_fee(meta)?)?;
                    let amount_out =
                        bin_swap::get_amount_out_v2(meta, fixed_point::sub(amount, fee)?, swap_for_y)?;
                    HopQuote {
                        pool: pool.key,
                        asset_in: asset,
                        asset_out: meta.asset_out(swap_for_y),
                        amount_in: amount,
                        amount_out,
                        fee,
                    }
                }
            };
            asset = hop.asset_out;
            amount = hop.amount_out;
            hops.push(hop);
        }
        Ok(hops)
    }

    fn walk_backward(&self, route: &Route, amount_out: U256) -> Result<Vec<HopQuote>> {
        let mut hops = Vec::with_capacity(route.pools.len());
        let (mut asset, mut amount) = (route.asset_out, amount_out);
        for pool in route.pools.iter().rev() {
            let hop = match pool.key {
                PoolKey::V1(pool_id) => {
                    let meta = self.snapshot.pool_v1(&pool_id)?;
                    // oriented from the output side, so in/out are swapped below
                    let reserves = meta.arrange(&asset)?;
                    let net_in = curve::get_amount_in(
                        pool_id.is_stable,
                        reserves.reserve_out,
                        reserves.reserve_in,
                        reserves.decimals_out,
                        reserves.decimals_in,
                        amount,
                    )?;
                    let fee = calculate_fee_to_add(net_in, self.fees.fee_for(&pool_id))?;
                    HopQuote {
                        pool: pool.key,
                        asset_in: reserves.asset_out,
                        asset_out: asset,
                        amount_in: fixed_point::add(net_in, fee)?,
                        amount_out: amount,
                        fee,
                    }
                }
                PoolKey::V2(pool_id) => {
                    let meta = self.snapshot.pool_v2(&pool_id)?;
                    let swap_for_y = !meta.swap_for_y(&asset)?;
                    let net_in = bin_swap::get_amount_in_v2(meta, amount, swap_for_y)?;
                    let fee = calculate_fee_to_add(net_in, self.v2_fee(meta)?)?;
                    HopQuote {
                        pool: pool.key,
                        asset_in: meta.asset_out(!swap_for_y),
                        asset_out: asset,
                        amount_in: fixed_point::add(net_in, fee)?,
                        amount_out: amount,
                        fee,
                    }
                }
            };
            asset = hop.asset_in;
            amount = hop.amount_in;
            hops.push(hop);
        }
        hops.reverse();
        Ok(hops)
    }

    /// Quotes every route, keeping failures in place so results line up
    /// with `routes`.
    pub fn quote_routes(
        &self,
        routes: &[Route],
        amount: U256,
        trade_type: TradeType,
    ) -> Vec<Result<Quote>> {
        routes
            .iter()
            .map(|route| {
                let quote = self.quote_route(route, amount, trade_type);
                if let Err(e) = &quote {
                    debug!(route = %route, error = %e, "Route excluded from selection");
                }
                quote
            })
            .collect()
    }

    /// Marginal output per unit of input along `route`, 1e18-scaled, net of
    /// fees.
    ///
    /// Volatile pools are read off their reserves. Stable and v2 pools are
    /// probed with a swap of a millionth of the input reserve.
    pub fn spot_rate(&self, route: &Route) -> Result<U256> {
        let mut rate = fixed_point::ONE_E_18;
        let mut asset = route.asset_in;
        for pool in &route.pools {
            match pool.key {
                PoolKey::V1(pool_id) => {
                    let meta = self.snapshot.pool_v1(&pool_id)?;
                    let reserves = meta.arrange(&asset)?;
                    if reserves.reserve_in.is_zero() {
                        return Err(AmmError::InsufficientReserves);
                    }
                    if pool_id.is_stable {
                        let probe = probe_size(reserves.reserve_in);
                        let out = curve::get_amount_out(
                            true,
                            reserves.reserve_in,
                            reserves.reserve_out,
                            reserves.decimals_in,
                            reserves.decimals_out,
                            probe,
                        )?;
                        rate = fixed_point::mul_div(rate, out, probe)?;
                    } else {
                        rate = fixed_point::mul_div(rate, reserves.reserve_out, reserves.reserve_in)?;
                    }
                    rate = net_of_fee(rate, self.fees.fee_for(&pool_id))?;
                    asset = reserves.asset_out;
                }
                PoolKey::V2(pool_id) => {
                    let meta = self.snapshot.pool_v2(&pool_id)?;
                    let swap_for_y = meta.swap_for_y(&asset)?;
                    let (reserve_in, _) = meta.total_reserves().oriented(swap_for_y);
                    let probe = probe_size(reserve_in);
                    let out = bin_swap::get_amount_out_v2(meta, probe, swap_for_y)?;
                    rate = fixed_point::mul_div(rate, out, probe)?;
                    rate = net_of_fee(rate, self.v2_fee(meta)?)?;
                    asset = meta.asset_out(swap_for_y);
                }
            }
        }
        Ok(rate)
    }
}

fn probe_size(reserve_in: U256) -> U256 {
    (reserve_in / U256::from(SPOT_PROBE_DIVISOR)).max(U256::from(MIN_SPOT_PROBE))
}

fn net_of_fee(rate: U256, fee_bps: u32) -> Result<U256> {
    let keep = fixed_point::sub(fixed_point::basis_points(), U256::from(fee_bps))?;
    fixed_point::mul_div(rate, keep, fixed_point::basis_points())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoutablePool;
    use amm_router_domain::{Amounts, PoolId, PoolIdV2, PoolMetadataV1};
    use std::collections::BTreeMap;

    fn asset(n: u8) -> AssetId {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        AssetId::new(bytes)
    }

    fn e18(n: u64) -> U256 {
        U256::from(n) * fixed_point::ONE_E_18
    }

    fn volatile_pool(a: u8, b: u8, reserve_a: U256, reserve_b: U256) -> PoolMetadataV1 {
        PoolMetadataV1::new((asset(a), reserve_a, 18), (asset(b), reserve_b, 18), false)
    }

    fn zero_fee_config() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.fees = AmmFees {
            lp_fee_volatile: 0,
            lp_fee_stable: 0,
            protocol_fee_volatile: 0,
            protocol_fee_stable: 0,
        };
        config
    }

    fn route(pools: Vec<RoutablePool>, from: u8, to: u8) -> Route {
        Route {
            pools,
            asset_in: asset(from),
            asset_out: asset(to),
        }
    }

    fn bin_pool(id: u64, x: u8, y: u8) -> PoolMetadataV2 {
        let mut bins = BTreeMap::new();
        bins.insert(0, Amounts::new(e18(10), e18(10)));
        bins.insert(1, Amounts::new(U256::zero(), e18(10)));
        bins.insert(-1, Amounts::new(e18(10), U256::zero()));
        PoolMetadataV2 {
            pool_id: PoolIdV2(U256::from(id)),
            asset_x: asset(x),
            asset_y: asset(y),
            bin_step: 25,
            base_factor: 10_000,
            active_bin_id: 0,
            reserves: Amounts::new(e18(20), e18(20)),
            protocol_fees: Amounts::zero(),
            bins,
        }
    }

    #[test]
    fn test_single_volatile_hop_without_fees() {
        let mut snapshot = PoolSnapshot::new();
        snapshot.insert_v1(volatile_pool(1, 2, e18(1_000), e18(1_000)));
        let config = zero_fee_config();
        let quoter = Quoter::new(&snapshot, &config);
        let r = route(vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), false))], 1, 2);

        // 100 * 1000 / 1100 = 90.909...
        let quote = quoter.quote_route(&r, e18(100), TradeType::ExactIn).unwrap();
        assert_eq!(quote.amount_out, U256::from(90_909_090_909_090_909_090u128));
        assert_eq!(quote.input_fee(), U256::zero());
        assert!(quote.is_usable());
    }

    #[test]
    fn test_fee_is_taken_from_input() {
        let mut snapshot = PoolSnapshot::new();
        snapshot.insert_v1(volatile_pool(1, 2, e18(1_000), e18(1_000)));
        let config = RouterConfig::default();
        let quoter = Quoter::new(&snapshot, &config);
        let r = route(vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), false))], 1, 2);

        let quote = quoter.quote_route(&r, e18(100), TradeType::ExactIn).unwrap();
        // 30 bps of 100
        assert_eq!(quote.input_fee(), U256::from(300_000_000_000_000_000u64));
        assert!(quote.amount_out < U256::from(90_909_090_909_090_909_090u128));
    }

    #[test]
    fn test_exact_out_covers_requested_output() {
        let mut snapshot = PoolSnapshot::new();
        snapshot.insert_v1(volatile_pool(1, 2, e18(1_000), e18(2_000)));
        snapshot.insert_v1(volatile_pool(2, 3, e18(3_000), e18(1_500)));
        let config = RouterConfig::default();
        let quoter = Quoter::new(&snapshot, &config);
        let r = route(
            vec![
                RoutablePool::v1(PoolId::new(asset(1), asset(2), false)),
                RoutablePool::v1(PoolId::new(asset(2), asset(3), false)),
            ],
            1,
            3,
        );

        let wanted = e18(10);
        let exact_out = quoter.quote_route(&r, wanted, TradeType::ExactOut).unwrap();
        assert_eq!(exact_out.amount_out, wanted);
        assert_eq!(exact_out.hops.len(), 2);
        assert_eq!(exact_out.hops[0].asset_in, asset(1));
        assert_eq!(exact_out.hops[1].asset_out, asset(3));
        assert_eq!(exact_out.hops[0].amount_out, exact_out.hops[1].amount_in);

        // selling what exact-out asked for yields at least the target
        let exact_in = quoter
            .quote_route(&r, exact_out.amount_in, TradeType::ExactIn)
            .unwrap();
        assert!(exact_in.amount_out >= wanted);
    }

    #[test]
    fn test_mixed_v1_and_v2_route() {
        let mut snapshot = PoolSnapshot::new();
        snapshot.insert_v1(volatile_pool(1, 2, e18(1_000), e18(1_000)));
        snapshot.insert_v2(bin_pool(7, 2, 3));
        let config = zero_fee_config();
        let quoter = Quoter::new(&snapshot, &config);
        let v2_edge = RoutablePool {
            key: PoolKey::V2(PoolIdV2(U256::from(7))),
            asset_x: asset(2),
            asset_y: asset(3),
        };
        let r = route(
            vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), false)), v2_edge],
            1,
            3,
        );

        let quote = quoter.quote_route(&r, e18(1), TradeType::ExactIn).unwrap();
        assert_eq!(quote.hops[1].asset_in, asset(2));
        assert_eq!(quote.hops[1].asset_out, asset(3));
        assert!(quote.hops[1].fee > U256::zero());
        assert!(quote.amount_out > U256::zero());

        // the bin pool's own fee is replaced by the configured override
        let mut overridden = zero_fee_config();
        overridden.default_v2_fee_bps = Some(0);
        let quote = Quoter::new(&snapshot, &overridden)
            .quote_route(&r, e18(1), TradeType::ExactIn)
            .unwrap();
        assert_eq!(quote.hops[1].fee, U256::zero());

        let reverse = route(
            vec![v2_edge, RoutablePool::v1(PoolId::new(asset(1), asset(2), false))],
            3,
            1,
        );
        let quote = quoter.quote_route(&reverse, e18(1), TradeType::ExactOut).unwrap();
        assert_eq!(quote.hops[0].asset_in, asset(3));
        assert_eq!(quote.amount_out, e18(1));
    }

    #[test]
    fn test_failures_stay_aligned_with_routes() {
        let mut snapshot = PoolSnapshot::new();
        snapshot.insert_v1(volatile_pool(1, 2, e18(1_000), e18(1_000)));
        let config = RouterConfig::default();
        let quoter = Quoter::new(&snapshot, &config);
        let good = route(vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), false))], 1, 2);
        let missing = route(vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), true))], 1, 2);

        let results = quoter.quote_routes(&[missing, good], e18(1), TradeType::ExactIn);
        assert!(matches!(results[0], Err(AmmError::UnknownPool(_))));
        assert!(results[1].is_ok());

        // draining the pool is a market condition, not a configuration error
        let good = route(vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), false))], 1, 2);
        let err = quoter
            .quote_route(&good, e18(1_000), TradeType::ExactOut)
            .unwrap_err();
        assert_eq!(err, AmmError::InsufficientReserves);
        assert!(err.is_market_condition());
    }

    #[test]
    fn test_rejects_zero_amount_and_empty_route() {
        let snapshot = PoolSnapshot::new();
        let config = RouterConfig::default();
        let quoter = Quoter::new(&snapshot, &config);
        let empty = route(Vec::new(), 1, 2);
        assert!(matches!(
            quoter.quote_route(&empty, e18(1), TradeType::ExactIn),
            Err(AmmError::InvalidConfiguration(_))
        ));
        let r = route(vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), false))], 1, 2);
        assert_eq!(
            quoter.quote_route(&r, U256::zero(), TradeType::ExactIn),
            Err(AmmError::InvalidAmount)
        );
    }

    #[test]
    fn test_spot_rate() {
        let mut snapshot = PoolSnapshot::new();
        snapshot.insert_v1(volatile_pool(1, 2, e18(1_000), e18(2_000)));
        let config = zero_fee_config();
        let r = route(vec![RoutablePool::v1(PoolId::new(asset(1), asset(2), false))], 1, 2);
        assert_eq!(Quoter::new(&snapshot, &config).spot_rate(&r).unwrap(), e18(2));

        // 30 bps off 2.0
        let with_fee = RouterConfig::default();
        assert_eq!(
            Quoter::new(&snapshot, &with_fee).spot_rate(&r).unwrap(),
            U256::from(1_994_000_000_000_000_000u64)
        );
    }
}
