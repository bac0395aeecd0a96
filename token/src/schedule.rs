//! Scheduled burn entries

use serde::{Deserialize, Serialize};

/// A due-time-gated burn that executes at most once
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledBurn {
    pub due_at: u64,
    pub amount: u64,
    pub executed: bool,
}

impl ScheduledBurn {
    pub fn new(due_at: u64, amount: u64) -> Self {
        Self {
            due_at,
            amount,
            executed: false,
        }
    }

    /// Whether this entry should execute at `now`
    pub fn is_due(&self, now: u64) -> bool {
        !self.executed && self.due_at <= now
    }
}
