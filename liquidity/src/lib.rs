//! Ember Liquidity Pool
//!
//! An x*y=k automated market maker pairing the Ember token against a
//! reference asset. Owns its own reserve and position bookkeeping; shares
//! only the token's unit convention with the rest of the engine.

pub mod error;
pub mod pool;

pub use error::{PoolError, Result};
pub use pool::{LiquidityPool, Position, SwapQuote, SwapSide};
