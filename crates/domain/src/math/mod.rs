pub mod bin_price;
pub mod bin_swap;
pub mod constant_product;
pub mod curve;
pub mod fixed_point;
pub mod liquidity_distribution;
pub mod stable_swap;

pub use bin_price::{get_bin_price, get_price_bin_id};
pub use bin_swap::{get_amount_in_v2, get_amount_out_v2};
pub use curve::{get_amount_in, get_amount_out};
pub use fixed_point::{ONE_E_18, rounding_up_division};
pub use liquidity_distribution::LiquidityConfig;
