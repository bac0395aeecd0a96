//! Ember Core Library
//!
//! Shared primitives for the Ember token economics engine:
//! - Fixed-point unit handling and basis-point math
//! - Supply events consumed by the bridge/rollup boundary

pub mod events;
pub mod units;

pub use events::{BurnOrigin, SupplyEvent};
pub use units::{bps_of, integer_sqrt, mul_div, mul_div_ceil, BPS_DENOMINATOR, COIN};
