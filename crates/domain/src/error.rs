//! Error type shared by every pricing and routing operation.

use crate::token::AssetId;
use thiserror::Error;

/// Unified error for pool math, snapshot lookups and route construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    /// A zero amount was supplied where a positive one is required.
    #[error("Amount must be strictly positive")]
    InvalidAmount,
    /// The requested output reaches the available reserve, or bin traversal
    /// ran past its bound before filling the amount.
    #[error("Insufficient reserves to fill the requested amount")]
    InsufficientReserves,
    /// Caller-side defect: mismatched arrays, zero distribution weight,
    /// out-of-range parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// 256-bit arithmetic overflowed or underflowed.
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Pool {0} not present in snapshot")]
    UnknownPool(String),
    /// Snapshot data for a pool is unusable, e.g. a derived fee of 100% or more.
    #[error("Pool {0} has unusable parameters: {1}")]
    InvalidPool(String, String),
    #[error("Asset {0} not present in snapshot")]
    UnknownAsset(AssetId),
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl AmmError {
    /// Returns true for failures caused by market state (amounts, reserves,
    /// missing pools) rather than by a bug in how the call was built.
    ///
    /// Market conditions exclude a single route from comparison; the rest
    /// must reach the caller.
    #[must_use]
    pub fn is_market_condition(&self) -> bool {
        !matches!(
            self,
            Self::InvalidConfiguration(_) | Self::InvalidIdentifier(_)
        )
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

/// Result alias used across the domain crate.
pub type Result<T> = std::result::Result<T, AmmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_condition_classification() {
        assert!(AmmError::InvalidAmount.is_market_condition());
        assert!(AmmError::InsufficientReserves.is_market_condition());
        assert!(AmmError::Overflow.is_market_condition());
        assert!(AmmError::UnknownPool("p".into()).is_market_condition());
        assert!(AmmError::InvalidPool("p".into(), "fee".into()).is_market_condition());
        assert!(!AmmError::config("bad").is_market_condition());
        assert!(!AmmError::InvalidIdentifier("0x".into()).is_market_condition());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AmmError::config("Arrays must have the same length").to_string(),
            "Invalid configuration: Arrays must have the same length"
        );
        assert_eq!(
            AmmError::InsufficientReserves.to_string(),
            "Insufficient reserves to fill the requested amount"
        );
    }
}
