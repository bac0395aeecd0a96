//! Token ledger error types

use thiserror::Error;

/// Token ledger errors
///
/// All variants are local validation failures: a failed call leaves the
/// ledger unchanged.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("Insufficient supply: requested {requested}, supply {supply}")]
    InsufficientSupply { requested: u64, supply: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Schedule already contains a pending burn of {amount} due at {due_at}")]
    ScheduleExists { due_at: u64, amount: u64 },

    #[error("Caller does not hold the owner capability for this ledger")]
    Unauthorized,
}

pub type Result<T> = std::result::Result<T, TokenError>;
