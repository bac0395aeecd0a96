//! Vesting error types

use thiserror::Error;

/// Vesting errors
#[derive(Error, Debug)]
pub enum VestingError {
    #[error("Vesting schedule already exists for {0}")]
    ScheduleExists(String),

    #[error("No vesting schedule for {0}")]
    ScheduleNotFound(String),

    #[error("Only the beneficiary may release: caller {caller}, beneficiary {beneficiary}")]
    NotBeneficiary { caller: String, beneficiary: String },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Token ledger error: {0}")]
    Token(#[from] ember_token::TokenError),
}

pub type Result<T> = std::result::Result<T, VestingError>;
