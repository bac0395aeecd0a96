//! Treasury error types

use thiserror::Error;

/// Treasury errors
#[derive(Error, Debug)]
pub enum TreasuryError {
    #[error("Insufficient treasury funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Schedule already contains a pending buyback of {amount} due at {due_at}")]
    ScheduleExists { due_at: u64, amount: u64 },

    #[error("Buyback trigger already pending: {0}")]
    TriggerExists(String),

    #[error("Token ledger error: {0}")]
    Token(#[from] ember_token::TokenError),
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
