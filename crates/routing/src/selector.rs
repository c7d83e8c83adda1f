//! Best-route selection and the trade state machine.

use crate::error::RouterError;
use crate::graph::Route;
use crate::quoter::{Quote, TradeType};
use amm_router_domain::metrics::{
    calculate_effective_price, calculate_max_amount_in, calculate_min_amount_out,
    calculate_price_impact,
};
use amm_router_domain::{AmmError, Result};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Message shown when quoting succeeded on no route.
pub const NO_ROUTE_MESSAGE: &str = "No route found for this trade";

/// Message shown when every successful quote came back empty.
pub const INSUFFICIENT_RESERVES_MESSAGE: &str = "Insufficient reserves in pool";

/// Trade lifecycle as seen by a swap front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeState {
    /// Route discovery or quoting is pending.
    Loading,
    /// Inputs are missing, or no quote was usable.
    Invalid,
    /// Quoting finished but no route produced a quote.
    NoRouteFound,
    /// A best route was selected.
    Valid,
    /// A new snapshot is being fetched; the previous trade is still shown.
    Refetching,
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradeState::Loading => "LOADING",
            TradeState::Invalid => "INVALID",
            TradeState::NoRouteFound => "NO_ROUTE_FOUND",
            TradeState::Valid => "VALID",
            TradeState::Refetching => "REFETCHING",
        };
        f.write_str(name)
    }
}

impl TradeState {
    /// Whether the machine may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: TradeState) -> bool {
        matches!(
            (self, next),
            (
                TradeState::Loading,
                TradeState::Invalid | TradeState::NoRouteFound | TradeState::Valid
            ) | (TradeState::Valid, TradeState::Refetching)
                | (TradeState::Refetching, TradeState::Valid | TradeState::Loading)
        )
    }
}

/// Enforces the allowed trade state transitions.
///
/// A new request always restarts from `Loading`.
#[derive(Debug, Clone)]
pub struct TradeStateMachine {
    state: TradeState,
}

impl Default for TradeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeStateMachine {
    /// Creates a new machine in `Loading`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TradeState::Loading,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TradeState {
        self.state
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: TradeState) -> std::result::Result<(), RouterError> {
        if !self.state.can_transition_to(next) {
            return Err(RouterError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        info!(from = %self.state, to = %next, "Trade state transition");
        self.state = next;
        Ok(())
    }

    /// Restarts the lifecycle for a new request.
    pub fn reset(&mut self) {
        if self.state != TradeState::Loading {
            info!(from = %self.state, to = %TradeState::Loading, "Trade state reset");
        }
        self.state = TradeState::Loading;
    }

    /// Enters `Refetching` when a valid trade is on display. Returns false,
    /// leaving the state untouched, otherwise.
    pub fn begin_refetch(&mut self) -> bool {
        if self.state != TradeState::Valid {
            return false;
        }
        self.state = TradeState::Refetching;
        info!(from = %TradeState::Valid, to = %self.state, "Trade state transition");
        true
    }

    /// Settles a finished computation into `outcome`.
    ///
    /// From `Refetching`, a non-valid outcome passes through `Loading` first.
    pub fn resolve(&mut self, outcome: TradeState) -> std::result::Result<(), RouterError> {
        if self.state == TradeState::Refetching && outcome != TradeState::Valid {
            self.transition(TradeState::Loading)?;
        }
        self.transition(outcome)
    }
}

/// The route chosen for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub route: Route,
    pub amount_in: U256,
    pub amount_out: U256,
    pub trade_type: TradeType,
    /// The full quote behind the trade.
    pub quote: Quote,
}

impl From<Quote> for Trade {
    fn from(quote: Quote) -> Self {
        Self {
            route: quote.route.clone(),
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            trade_type: quote.trade_type,
            quote,
        }
    }
}

/// What a front-end renders for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub state: TradeState,
    pub trade: Option<Trade>,
    /// User-facing message, if any.
    pub error: Option<String>,
}

impl TradeOutcome {
    /// Outcome for a request missing one of its assets.
    #[must_use]
    pub fn missing_assets() -> Self {
        Self {
            state: TradeState::Invalid,
            trade: None,
            error: None,
        }
    }

    fn no_route(message: Option<&str>) -> Self {
        Self {
            state: TradeState::NoRouteFound,
            trade: None,
            error: message.map(str::to_string),
        }
    }
}

/// Picks the best quote among candidate routes.
pub struct RouteSelector;

impl RouteSelector {
    /// Best of `quotes` for `trade_type`: greatest output for exact-in,
    /// smallest input for exact-out. Ties keep the earlier quote.
    pub fn best(trade_type: TradeType, quotes: &[&Quote]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, quote) in quotes.iter().enumerate() {
            let better = match best {
                None => true,
                Some(b) => match trade_type {
                    TradeType::ExactIn => quote.amount_out > quotes[b].amount_out,
                    TradeType::ExactOut => quote.amount_in < quotes[b].amount_in,
                },
            };
            if better {
                best = Some(i);
            }
        }
        best
    }

    /// Resolves per-route results into a trade outcome.
    ///
    /// Market-condition failures exclude their route. Any other failure is a
    /// caller defect and is returned as an error.
    pub fn select(
        trade_type: TradeType,
        amount: U256,
        quotes: Vec<Result<Quote>>,
    ) -> Result<TradeOutcome> {
        let mut succeeded = Vec::with_capacity(quotes.len());
        for quote in quotes {
            match quote {
                Ok(quote) => succeeded.push(quote),
                Err(e) if e.is_market_condition() => {}
                Err(e) => return Err(e),
            }
        }

        if amount.is_zero() {
            return Ok(TradeOutcome::no_route(None));
        }
        if succeeded.is_empty() {
            return Ok(TradeOutcome::no_route(Some(NO_ROUTE_MESSAGE)));
        }

        let usable: Vec<&Quote> = succeeded.iter().filter(|q| q.is_usable()).collect();
        let Some(best) = Self::best(trade_type, &usable) else {
            return Ok(TradeOutcome {
                state: TradeState::Invalid,
                trade: None,
                error: Some(INSUFFICIENT_RESERVES_MESSAGE.to_string()),
            });
        };
        Ok(TradeOutcome {
            state: TradeState::Valid,
            trade: Some(Trade::from(usable[best].clone())),
            error: None,
        })
    }
}

/// Display values derived from a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSummary {
    /// Output per unit of input, 1e18-scaled.
    pub effective_price: U256,
    /// Deviation of the effective price from the route's spot rate.
    pub price_impact_bps: U256,
    /// Fee charged by the first pool, in input units.
    pub fee: U256,
    /// Least output accepted under the slippage tolerance.
    pub min_amount_out: U256,
    /// Most input spent under the slippage tolerance.
    pub max_amount_in: U256,
}

impl TradeSummary {
    /// Creates a new summary for `trade` against the route's `spot_rate`.
    pub fn new(trade: &Trade, spot_rate: U256, slippage_bps: u32) -> Result<Self> {
        if slippage_bps > 10_000 {
            return Err(AmmError::InvalidConfiguration(format!(
                "slippage {slippage_bps} bps above 100%"
            )));
        }
        let effective_price = calculate_effective_price(trade.amount_in, trade.amount_out)?;
        let (min_amount_out, max_amount_in) = match trade.trade_type {
            TradeType::ExactIn => (
                calculate_min_amount_out(trade.amount_out, slippage_bps)?,
                trade.amount_in,
            ),
            TradeType::ExactOut => (
                trade.amount_out,
                calculate_max_amount_in(trade.amount_in, slippage_bps)?,
            ),
        };
        Ok(Self {
            effective_price,
            price_impact_bps: calculate_price_impact(spot_rate, effective_price)?,
            fee: trade.quote.input_fee(),
            min_amount_out,
            max_amount_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoutablePool;
    use amm_router_domain::{AssetId, PoolId};

    fn asset(n: u8) -> AssetId {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        AssetId::new(bytes)
    }

    fn quote(tag: u8, amount_in: u64, amount_out: u64, trade_type: TradeType) -> Quote {
        Quote {
            route: Route {
                pools: vec![RoutablePool::v1(PoolId::new(asset(1), asset(tag), false))],
                asset_in: asset(1),
                asset_out: asset(2),
            },
            amount_in: U256::from(amount_in),
            amount_out: U256::from(amount_out),
            trade_type,
            hops: Vec::new(),
        }
    }

    #[test]
    fn test_exact_in_picks_greatest_output() {
        let quotes = vec![
            Ok(quote(3, 100, 90, TradeType::ExactIn)),
            Err(AmmError::InsufficientReserves),
            Ok(quote(4, 100, 95, TradeType::ExactIn)),
            Ok(quote(5, 100, 95, TradeType::ExactIn)),
        ];
        let outcome = RouteSelector::select(TradeType::ExactIn, U256::from(100), quotes).unwrap();
        assert_eq!(outcome.state, TradeState::Valid);
        let trade = outcome.trade.unwrap();
        // tie with tag 5 goes to the first discovered
        assert_eq!(trade.amount_out, U256::from(95));
        assert_eq!(trade.route.pools[0].asset_y, asset(4));
    }

    #[test]
    fn test_exact_out_picks_smallest_input() {
        let quotes = vec![
            Ok(quote(3, 120, 100, TradeType::ExactOut)),
            Ok(quote(4, 110, 100, TradeType::ExactOut)),
            Ok(quote(5, 115, 100, TradeType::ExactOut)),
        ];
        let outcome = RouteSelector::select(TradeType::ExactOut, U256::from(100), quotes).unwrap();
        assert_eq!(outcome.trade.unwrap().amount_in, U256::from(110));
    }

    #[test]
    fn test_no_successful_quote() {
        let outcome = RouteSelector::select(
            TradeType::ExactIn,
            U256::from(1),
            vec![Err(AmmError::UnknownPool("p".to_string()))],
        )
        .unwrap();
        assert_eq!(outcome.state, TradeState::NoRouteFound);
        assert_eq!(outcome.error.as_deref(), Some(NO_ROUTE_MESSAGE));

        let outcome = RouteSelector::select(TradeType::ExactIn, U256::zero(), Vec::new()).unwrap();
        assert_eq!(outcome.state, TradeState::NoRouteFound);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_only_empty_quotes_is_invalid() {
        let outcome = RouteSelector::select(
            TradeType::ExactIn,
            U256::from(1),
            vec![Ok(quote(3, 1, 0, TradeType::ExactIn))],
        )
        .unwrap();
        assert_eq!(outcome.state, TradeState::Invalid);
        assert_eq!(outcome.error.as_deref(), Some(INSUFFICIENT_RESERVES_MESSAGE));
    }

    #[test]
    fn test_configuration_errors_propagate() {
        let result = RouteSelector::select(
            TradeType::ExactIn,
            U256::from(1),
            vec![
                Ok(quote(3, 1, 1, TradeType::ExactIn)),
                Err(AmmError::InvalidConfiguration("bad".to_string())),
            ],
        );
        assert!(matches!(result, Err(AmmError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut machine = TradeStateMachine::new();
        assert_eq!(machine.state(), TradeState::Loading);
        assert!(!machine.begin_refetch());

        machine.resolve(TradeState::Valid).unwrap();
        assert!(machine.begin_refetch());
        assert_eq!(machine.state(), TradeState::Refetching);
        machine.resolve(TradeState::Valid).unwrap();
        assert_eq!(machine.state(), TradeState::Valid);

        // a refetch that loses the route passes through Loading
        assert!(machine.begin_refetch());
        machine.resolve(TradeState::NoRouteFound).unwrap();
        assert_eq!(machine.state(), TradeState::NoRouteFound);

        assert!(matches!(
            machine.transition(TradeState::Valid),
            Err(RouterError::InvalidTransition { .. })
        ));
        machine.reset();
        assert_eq!(machine.state(), TradeState::Loading);
        assert!(machine.transition(TradeState::Refetching).is_err());
    }

    #[test]
    fn test_summary() {
        let mut q = quote(3, 1_000, 2_000, TradeType::ExactIn);
        q.hops.push(crate::quoter::HopQuote {
            pool: q.route.pools[0].key,
            asset_in: asset(1),
            asset_out: asset(2),
            amount_in: U256::from(1_000),
            amount_out: U256::from(2_000),
            fee: U256::from(3),
        });
        let trade = Trade::from(q);
        // spot 2.5 vs effective 2.0 is 2000 bps
        let spot = U256::from(2_500_000_000_000_000_000u64);
        let summary = TradeSummary::new(&trade, spot, 50).unwrap();
        assert_eq!(summary.effective_price, U256::from(2_000_000_000_000_000_000u64));
        assert_eq!(summary.price_impact_bps, U256::from(2_000));
        assert_eq!(summary.fee, U256::from(3));
        // 2000 * 0.995
        assert_eq!(summary.min_amount_out, U256::from(1_990));
        assert_eq!(summary.max_amount_in, U256::from(1_000));
        assert!(TradeSummary::new(&trade, spot, 10_001).is_err());
    }
}
