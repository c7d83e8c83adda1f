//! Async routing service: fetches a snapshot, fans quoting out per route and
//! tracks the trade lifecycle.

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::graph::{Route, build_candidate_pairs, compute_all_routes};
use crate::quoter::{Quote, Quoter, TradeType};
use crate::selector::{RouteSelector, TradeOutcome, TradeState, TradeStateMachine, TradeSummary};
use crate::snapshot::{PoolSnapshot, SnapshotSource};
use amm_router_domain::AssetId;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A swap the user is composing. Either asset may still be unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub trade_type: TradeType,
    /// Fixed side of the trade, in base units.
    pub amount: U256,
    pub asset_in: Option<AssetId>,
    pub asset_out: Option<AssetId>,
}

impl TradeRequest {
    /// Creates a new exact-input request.
    pub fn exact_in(asset_in: AssetId, asset_out: AssetId, amount: U256) -> Self {
        Self {
            trade_type: TradeType::ExactIn,
            amount,
            asset_in: Some(asset_in),
            asset_out: Some(asset_out),
        }
    }

    /// Creates a new exact-output request.
    pub fn exact_out(asset_in: AssetId, asset_out: AssetId, amount: U256) -> Self {
        Self {
            trade_type: TradeType::ExactOut,
            ..Self::exact_in(asset_in, asset_out, amount)
        }
    }
}

/// Routes and selects trades against snapshots from a [`SnapshotSource`].
///
/// Requests are numbered; a result computed for a request that has since
/// been superseded is dropped rather than published.
pub struct SwapRouter<S: SnapshotSource> {
    /// Snapshot supplier.
    source: Arc<S>,
    /// Routing configuration.
    config: RouterConfig,
    /// Number of the latest request.
    generation: AtomicU64,
    /// Trade lifecycle.
    machine: Arc<RwLock<TradeStateMachine>>,
    /// Last published outcome.
    outcome: Arc<RwLock<Option<TradeOutcome>>>,
}

impl<S: SnapshotSource + 'static> SwapRouter<S> {
    /// Creates a new router.
    pub fn new(source: Arc<S>, config: RouterConfig) -> Self {
        Self {
            source,
            config,
            generation: AtomicU64::new(0),
            machine: Arc::new(RwLock::new(TradeStateMachine::new())),
            outcome: Arc::new(RwLock::new(None)),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Current trade state.
    pub async fn state(&self) -> TradeState {
        self.machine.read().await.state()
    }

    /// Last published outcome, with its state kept in step with the machine.
    pub async fn current_outcome(&self) -> Option<TradeOutcome> {
        let state = self.state().await;
        self.outcome.read().await.clone().map(|mut outcome| {
            outcome.state = state;
            outcome
        })
    }

    /// Handles a new request from scratch.
    ///
    /// Returns `None` when a newer request superseded this one before it
    /// finished.
    pub async fn quote(&self, request: TradeRequest) -> Result<Option<TradeOutcome>, RouterError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut machine = self.machine.write().await;
            machine.reset();
            *self.outcome.write().await = None;
        }
        self.run(generation, request).await
    }

    /// Re-quotes `request` on a fresh snapshot while the current trade stays
    /// on display. Falls back to a full [`quote`](Self::quote) when no valid
    /// trade is shown.
    pub async fn refresh(&self, request: TradeRequest) -> Result<Option<TradeOutcome>, RouterError> {
        let generation = {
            let mut machine = self.machine.write().await;
            machine
                .begin_refetch()
                .then(|| self.generation.fetch_add(1, Ordering::SeqCst) + 1)
        };
        match generation {
            Some(generation) => self.run(generation, request).await,
            None => self.quote(request).await,
        }
    }

    async fn run(
        &self,
        generation: u64,
        request: TradeRequest,
    ) -> Result<Option<TradeOutcome>, RouterError> {
        let outcome = match self.compute(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(generation, error = %e, "Routing request failed");
                return Err(e);
            }
        };

        // checked under the machine lock so a request that starts while this
        // one waits for it still supersedes it
        let mut machine = self.machine.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding stale routing result");
            return Ok(None);
        }

        machine.resolve(outcome.state)?;
        *self.outcome.write().await = Some(outcome.clone());
        Ok(Some(outcome))
    }

    async fn compute(&self, request: &TradeRequest) -> Result<TradeOutcome, RouterError> {
        let (Some(asset_in), Some(asset_out)) = (request.asset_in, request.asset_out) else {
            return Ok(TradeOutcome::missing_assets());
        };

        let pairs = build_candidate_pairs(asset_in, asset_out, &self.config.base_assets);
        let snapshot = Arc::new(self.source.fetch_snapshot(&pairs).await?);
        let pools = snapshot.candidate_pools(&pairs);
        let routes = compute_all_routes(asset_in, asset_out, &pools, self.config.max_hops);
        info!(
            pairs = pairs.len(),
            pools = pools.len(),
            routes = routes.len(),
            "Discovered candidate routes"
        );

        let quotes = self
            .quote_concurrently(snapshot, routes, request.amount, request.trade_type)
            .await?;
        Ok(RouteSelector::select(request.trade_type, request.amount, quotes)?)
    }

    async fn quote_concurrently(
        &self,
        snapshot: Arc<PoolSnapshot>,
        routes: Vec<Route>,
        amount: U256,
        trade_type: TradeType,
    ) -> Result<Vec<amm_router_domain::Result<Quote>>, RouterError> {
        let handles: Vec<_> = routes
            .into_iter()
            .map(|route| {
                let snapshot = Arc::clone(&snapshot);
                let config = self.config.clone();
                tokio::task::spawn_blocking(move || {
                    Quoter::new(&snapshot, &config).quote_routes(&[route], amount, trade_type)
                })
            })
            .collect();

        // awaited in spawn order so results keep discovery order
        let mut quotes = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = handle
                .await
                .map_err(|e| RouterError::Task(e.to_string()))?;
            quotes.extend(result);
        }
        Ok(quotes)
    }

    /// Display values for the current trade, priced against a fresh snapshot.
    pub async fn summarize(&self) -> Result<Option<TradeSummary>, RouterError> {
        let Some(trade) = self.current_outcome().await.and_then(|o| o.trade) else {
            return Ok(None);
        };
        let pairs = build_candidate_pairs(
            trade.route.asset_in,
            trade.route.asset_out,
            &self.config.base_assets,
        );
        let snapshot = self.source.fetch_snapshot(&pairs).await?;
        let spot_rate = Quoter::new(&snapshot, &self.config).spot_rate(&trade.route)?;
        Ok(Some(TradeSummary::new(
            &trade,
            spot_rate,
            self.config.slippage_bps,
        )?))
    }
}
