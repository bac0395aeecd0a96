//! Ember Treasury Module
//!
//! Holds the named-asset balance ledger, allocation records, and the
//! buyback/burn program. All three buyback paths (manual, scheduled,
//! condition-triggered) spend treasury balance and burn the bought tokens
//! through the Token Ledger's owner capability.

pub mod buyback;
pub mod error;
pub mod vault;

pub use buyback::{BuybackRecord, BuybackTrigger, ScheduledBuyback, TriggerCondition};
pub use error::{Result, TreasuryError};
pub use vault::{Allocation, Treasury};
