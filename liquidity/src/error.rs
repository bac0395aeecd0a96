//! Liquidity pool error types

use thiserror::Error;

/// Liquidity pool errors
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },

    #[error("Liquidity is locked")]
    LiquidityLocked,
}

pub type Result<T> = std::result::Result<T, PoolError>;
