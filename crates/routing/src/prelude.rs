//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use amm_router_routing::prelude::*;
//! ```

// Configuration
pub use crate::config::{DEFAULT_MAX_HOPS, DEFAULT_SLIPPAGE_BPS, RouterConfig, parse_asset_list};

// Errors
pub use crate::error::RouterError;

// Route graph
pub use crate::graph::{
    RoutablePool, Route, build_candidate_pairs, compute_all_routes, get_pool_id_combinations,
};

// Quoting
pub use crate::quoter::{HopQuote, Quote, Quoter, TradeType};

// Selection
pub use crate::selector::{
    RouteSelector, Trade, TradeOutcome, TradeState, TradeStateMachine, TradeSummary,
};

// Service
pub use crate::service::{SwapRouter, TradeRequest};

// Snapshots
pub use crate::snapshot::{FileSnapshotSource, PoolSnapshot, SnapshotSource, StaticSnapshotSource};
