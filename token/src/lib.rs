//! Ember Token Ledger
//!
//! Per-account balances and total supply for the deflationary Ember token:
//! - Transfers with burn/reward deflation while trading is enabled
//! - Direct and scheduled burns, gated by an owner capability
//! - An incrementally maintained holder index for pro-rata rewards
//!
//! The Treasury and Vesting components mutate this ledger only through the
//! capability-gated surface; the ledger knows nothing about them.

pub mod error;
pub mod ledger;
pub mod schedule;

pub use error::{Result, TokenError};
pub use ledger::{OwnerCap, SupplyStats, TokenLedger, TransferOutcome, REWARD_EXCLUDES_PARTIES};
pub use schedule::ScheduledBurn;
