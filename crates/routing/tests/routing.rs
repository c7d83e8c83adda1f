use amm_router_domain::math::fixed_point::ONE_E_18;
use amm_router_domain::{
    AmmError, Amounts, AssetId, AssetMetadata, PoolId, PoolIdV2, PoolKey, PoolMetadataV1,
    PoolMetadataV2,
};
use amm_router_routing::prelude::*;
use primitive_types::U256;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn asset(n: u8) -> AssetId {
    let mut bytes = [0u8; 32];
    bytes[31] = n;
    AssetId::new(bytes)
}

fn e18(n: u64) -> U256 {
    U256::from(n) * ONE_E_18
}

fn v1(a: u8, b: u8, reserves: u64, is_stable: bool) -> PoolMetadataV1 {
    PoolMetadataV1::new(
        (asset(a), e18(reserves), 18),
        (asset(b), e18(reserves), 18),
        is_stable,
    )
}

fn bin_pool(id: u64, x: u8, y: u8) -> PoolMetadataV2 {
    // 21 bins around the active one, 100 units of each asset per bin
    let bins: BTreeMap<i32, Amounts> = (-10..=10)
        .map(|bin| (bin, Amounts::new(e18(100), e18(100))))
        .collect();
    PoolMetadataV2 {
        pool_id: PoolIdV2(U256::from(id)),
        asset_x: asset(x),
        asset_y: asset(y),
        bin_step: 25,
        base_factor: 10_000,
        active_bin_id: 0,
        reserves: Amounts::new(e18(2_100), e18(2_100)),
        protocol_fees: Amounts::zero(),
        bins,
    }
}

#[test]
fn test_scenario_a_through_quoter() {
    let mut snapshot = PoolSnapshot::new();
    snapshot.insert_v1(PoolMetadataV1::new(
        (asset(1), ONE_E_18, 18),
        (asset(2), ONE_E_18, 18),
        false,
    ));
    let mut config = RouterConfig::default();
    config.fees.lp_fee_volatile = 0;

    let routes = compute_all_routes(asset(1), asset(2), &snapshot.routable_pools(), 2);
    let quote = Quoter::new(&snapshot, &config)
        .quote_route(&routes[0], U256::from(100_000_000_000_000_000u64), TradeType::ExactIn)
        .unwrap();
    assert_eq!(quote.amount_out, U256::from(90_909_090_909_090_909u64));
}

#[test]
fn test_stable_pool_wins_for_pegged_assets() {
    let mut snapshot = PoolSnapshot::new();
    snapshot.insert_v1(v1(1, 2, 1_000, false));
    snapshot.insert_v1(v1(1, 2, 1_000, true));
    let config = RouterConfig::default();

    let routes = compute_all_routes(asset(1), asset(2), &snapshot.routable_pools(), 2);
    assert_eq!(routes.len(), 2);
    let quotes = Quoter::new(&snapshot, &config).quote_routes(&routes, e18(10), TradeType::ExactIn);
    let outcome = RouteSelector::select(TradeType::ExactIn, e18(10), quotes).unwrap();

    let trade = outcome.trade.unwrap();
    assert_eq!(
        trade.route.pools[0].key,
        PoolKey::V1(PoolId::new(asset(1), asset(2), true))
    );
    // 1:1 peg within the stable fee and curvature
    assert!(trade.amount_out > e18(9) + e18(99) / U256::from(100));
}

#[test]
fn test_scenario_d_excludes_route_without_aborting() {
    let mut snapshot = PoolSnapshot::new();
    snapshot.insert_v1(v1(1, 2, 10, false));
    snapshot.insert_v1(v1(1, 3, 1_000, false));
    snapshot.insert_v1(v1(3, 2, 1_000, false));
    let config = RouterConfig::default();

    let routes = compute_all_routes(asset(1), asset(2), &snapshot.routable_pools(), 2);
    let quotes = Quoter::new(&snapshot, &config).quote_routes(&routes, e18(10), TradeType::ExactOut);
    assert!(quotes.iter().any(|q| q == &Err(AmmError::InsufficientReserves)));

    let outcome = RouteSelector::select(TradeType::ExactOut, e18(10), quotes).unwrap();
    assert_eq!(outcome.state, TradeState::Valid);
    assert_eq!(outcome.trade.unwrap().route.hops(), 2);
}

#[test]
fn test_bin_pool_crosses_several_bins() {
    let mut snapshot = PoolSnapshot::new();
    snapshot.insert_v2(bin_pool(1, 1, 2));
    let config = RouterConfig::default();
    let routes = compute_all_routes(asset(1), asset(2), &snapshot.routable_pools(), 1);
    assert_eq!(routes.len(), 1);
    let quoter = Quoter::new(&snapshot, &config);

    // 350 units of X drain the active bin and the next two, then part of a fourth
    let small = quoter.quote_route(&routes[0], e18(10), TradeType::ExactIn).unwrap();
    let large = quoter.quote_route(&routes[0], e18(350), TradeType::ExactIn).unwrap();
    assert!(large.amount_out > small.amount_out);
    assert!(large.amount_out < e18(200));

    let beyond = quoter.quote_route(&routes[0], e18(2_100), TradeType::ExactOut);
    assert_eq!(beyond, Err(AmmError::InsufficientReserves));
}

#[test]
fn test_bad_bin_pool_fee_excludes_only_that_route() {
    let mut snapshot = PoolSnapshot::new();
    snapshot.insert_v1(v1(1, 2, 1_000, false));
    snapshot.insert_v2(PoolMetadataV2 {
        bin_step: 1_000,
        base_factor: 100_000,
        ..bin_pool(5, 1, 2)
    });
    let config = RouterConfig::default();

    let routes = compute_all_routes(asset(1), asset(2), &snapshot.routable_pools(), 1);
    assert_eq!(routes.len(), 2);
    let quotes = Quoter::new(&snapshot, &config).quote_routes(&routes, e18(1), TradeType::ExactIn);
    assert!(quotes.iter().any(|q| matches!(q, Err(AmmError::InvalidPool(..)))));

    let outcome = RouteSelector::select(TradeType::ExactIn, e18(1), quotes).unwrap();
    assert_eq!(outcome.state, TradeState::Valid);
    assert_eq!(
        outcome.trade.unwrap().route.pools[0].key,
        PoolKey::V1(PoolId::new(asset(1), asset(2), false))
    );
}

#[tokio::test]
async fn test_router_over_json_snapshot() {
    let mut snapshot = PoolSnapshot::new();
    snapshot.insert_asset(asset(1), AssetMetadata::new(18).with_symbol("AAA"));
    snapshot.insert_asset(asset(2), AssetMetadata::new(18).with_symbol("BBB"));
    snapshot.insert_v1(v1(1, 9, 1_000, false));
    snapshot.insert_v2(bin_pool(4, 9, 2));

    let path = std::env::temp_dir().join(format!("amm-router-snapshot-{}.json", std::process::id()));
    tokio::fs::write(&path, serde_json::to_string(&snapshot).unwrap())
        .await
        .unwrap();

    let config = RouterConfig {
        base_assets: vec![asset(9)],
        ..RouterConfig::default()
    };
    let router = SwapRouter::new(Arc::new(FileSnapshotSource::new(&path)), config);
    let outcome = router
        .quote(TradeRequest::exact_in(asset(1), asset(2), e18(5)))
        .await
        .unwrap()
        .unwrap();
    tokio::fs::remove_file(&path).await.unwrap();

    assert_eq!(outcome.state, TradeState::Valid);
    let trade = outcome.trade.unwrap();
    assert_eq!(trade.route.hops(), 2);
    assert_eq!(trade.route.pools[1].key, PoolKey::V2(PoolIdV2(U256::from(4))));
    assert_eq!(trade.quote.hops[0].amount_out, trade.quote.hops[1].amount_in);
}

fn fixed_quote(tag: u8, amount_in: u64, amount_out: u64, trade_type: TradeType) -> Quote {
    Quote {
        route: Route {
            pools: vec![RoutablePool::v1(PoolId::new(asset(0), asset(tag), false))],
            asset_in: asset(0),
            asset_out: asset(tag),
        },
        amount_in: U256::from(amount_in),
        amount_out: U256::from(amount_out),
        trade_type,
        hops: Vec::new(),
    }
}

proptest! {
    #[test]
    fn prop_exact_in_selects_maximum_output(
        outs in proptest::collection::vec((1u64..1_000_000, any::<bool>()), 1..12),
    ) {
        let quotes: Vec<_> = outs
            .iter()
            .enumerate()
            .map(|(i, (out, ok))| {
                if *ok {
                    Ok(fixed_quote(i as u8 + 1, 1_000, *out, TradeType::ExactIn))
                } else {
                    Err(AmmError::InsufficientReserves)
                }
            })
            .collect();
        let expected = outs
            .iter()
            .enumerate()
            .filter(|(_, (_, ok))| *ok)
            .fold(None::<(usize, u64)>, |best, (i, (out, _))| match best {
                Some((_, b)) if *out <= b => best,
                _ => Some((i, *out)),
            });

        let outcome = RouteSelector::select(TradeType::ExactIn, U256::from(1_000), quotes).unwrap();
        match expected {
            Some((i, out)) => {
                let trade = outcome.trade.unwrap();
                prop_assert_eq!(trade.amount_out, U256::from(out));
                prop_assert_eq!(trade.route.asset_out, asset(i as u8 + 1));
            }
            None => prop_assert_eq!(outcome.state, TradeState::NoRouteFound),
        }
    }

    #[test]
    fn prop_exact_out_selects_minimum_input(
        ins in proptest::collection::vec(1u64..1_000_000, 1..12),
    ) {
        let quotes: Vec<_> = ins
            .iter()
            .enumerate()
            .map(|(i, amount_in)| Ok(fixed_quote(i as u8 + 1, *amount_in, 500, TradeType::ExactOut)))
            .collect();
        let min = ins.iter().min().copied().unwrap_or_default();

        let outcome = RouteSelector::select(TradeType::ExactOut, U256::from(500), quotes).unwrap();
        prop_assert_eq!(outcome.trade.unwrap().amount_in, U256::from(min));
    }
}
