//! Errors raised by the routing service.

use crate::selector::TradeState;
use amm_router_domain::AmmError;
use thiserror::Error;

/// Failure of a routing request as a whole.
///
/// Per-route market conditions never surface here; they only exclude the
/// route they occurred on.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Pool math or configuration error that must reach the caller.
    #[error(transparent)]
    Amm(#[from] AmmError),
    /// The snapshot collaborator could not produce a snapshot.
    #[error("Snapshot fetch failed: {0}")]
    Snapshot(String),
    /// A background quoting task panicked or was cancelled.
    #[error("Quote task failed: {0}")]
    Task(String),
    /// The trade state machine was asked for a transition it does not allow.
    #[error("Invalid trade state transition from {from:?} to {to:?}")]
    InvalidTransition { from: TradeState, to: TradeState },
}
