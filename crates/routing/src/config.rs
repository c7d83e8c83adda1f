//! Router configuration.

use amm_router_domain::{AmmError, AmmFees, AssetId, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Default bound on the number of pools a route may chain.
pub const DEFAULT_MAX_HOPS: usize = 2;

/// Default slippage tolerance in basis points (0.5%).
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

/// Settings for route discovery, quoting and trade bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Hop budget passed to route search.
    pub max_hops: usize,
    /// Liquid assets indirect routes are funneled through.
    pub base_assets: Vec<AssetId>,
    /// Fee schedule for v1 pools.
    pub fees: AmmFees,
    /// Slippage tolerance used for min-out / max-in bounds.
    pub slippage_bps: u32,
    /// Fee applied to every v2 pool instead of its own bin-step fee.
    pub default_v2_fee_bps: Option<u32>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            base_assets: Vec::new(),
            fees: AmmFees::default(),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            default_v2_fee_bps: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AmmError::InvalidConfiguration(format!("{name}: cannot parse '{raw}'"))),
        Err(_) => Ok(None),
    }
}

impl RouterConfig {
    /// Builds a configuration from `AMM_ROUTER_*` environment variables,
    /// keeping defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(max_hops) = parse_var("AMM_ROUTER_MAX_HOPS")? {
            config.max_hops = max_hops;
        }
        if let Ok(raw) = env::var("AMM_ROUTER_BASE_ASSETS") {
            config.base_assets = parse_asset_list(&raw)?;
        }
        if let Some(slippage) = parse_var("AMM_ROUTER_SLIPPAGE_BPS")? {
            config.slippage_bps = slippage;
        }
        if let Some(fee) = parse_var("AMM_ROUTER_LP_FEE_VOLATILE")? {
            config.fees.lp_fee_volatile = fee;
        }
        if let Some(fee) = parse_var("AMM_ROUTER_LP_FEE_STABLE")? {
            config.fees.lp_fee_stable = fee;
        }
        if let Some(fee) = parse_var("AMM_ROUTER_PROTOCOL_FEE_VOLATILE")? {
            config.fees.protocol_fee_volatile = fee;
        }
        if let Some(fee) = parse_var("AMM_ROUTER_PROTOCOL_FEE_STABLE")? {
            config.fees.protocol_fee_stable = fee;
        }
        if let Some(fee) = parse_var("AMM_ROUTER_V2_FEE_BPS")? {
            config.default_v2_fee_bps = Some(fee);
        }
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no trade could be quoted under.
    pub fn validate(&self) -> Result<()> {
        if self.max_hops == 0 {
            return Err(AmmError::InvalidConfiguration(
                "max_hops must be at least 1".to_string(),
            ));
        }
        if self.slippage_bps > 10_000 {
            return Err(AmmError::InvalidConfiguration(format!(
                "slippage {} bps above 100%",
                self.slippage_bps
            )));
        }
        if let Some(fee) = self.default_v2_fee_bps.filter(|fee| *fee >= 10_000) {
            return Err(AmmError::InvalidConfiguration(format!(
                "v2 fee {fee} bps out of range"
            )));
        }
        self.fees.validate()
    }
}

/// Parses a comma-separated list of hex asset ids, skipping blanks.
pub fn parse_asset_list(raw: &str) -> Result<Vec<AssetId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AssetId::from_str)
        .collect()
}
