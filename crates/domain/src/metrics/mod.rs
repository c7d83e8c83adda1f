//! Trade and position metrics derived from quotes, in basis points or
//! 1e18 fixed point.

pub mod fees;
pub mod impermanent_loss;
pub mod price_impact;
pub mod slippage;

pub use fees::calculate_swap_fee_v2;
pub use impermanent_loss::calculate_impermanent_loss_v2;
pub use price_impact::{calculate_effective_price, calculate_price_impact};
pub use slippage::{calculate_max_amount_in, calculate_min_amount_out, validate_slippage_v2};
