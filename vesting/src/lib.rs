//! Ember Vesting Module
//!
//! Per-beneficiary cliff + linear vesting over balances custodied in the
//! Token Ledger. Vesting accrues from each schedule's start; the cliff only
//! gates when accrued tokens become releasable.

pub mod book;
pub mod error;

pub use book::{VestingBook, VestingSchedule};
pub use error::{Result, VestingError};
