//! Vesting schedules and release accounting

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ember_core::units::mul_div;
use ember_token::TokenLedger;

use crate::error::{Result, VestingError};

/// One beneficiary's linear vesting schedule
///
/// Vesting accrues linearly from `start` over `duration`; `cliff` only gates
/// when the accrued amount becomes visible. At the cliff the whole ramp
/// accrued so far unlocks at once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VestingSchedule {
    pub start: u64,
    pub cliff: u64,
    pub duration: u64,
    pub total_allocation: u64,
    pub released: u64,
    pub initialized: bool,
}

impl VestingSchedule {
    /// Amount vested at `at_time`
    pub fn vested_amount(&self, at_time: u64) -> u64 {
        if at_time < self.cliff {
            0
        } else if at_time >= self.start + self.duration {
            self.total_allocation
        } else {
            mul_div(self.total_allocation, at_time - self.start, self.duration)
        }
    }

    /// Vested but not yet released
    ///
    /// Saturating: an as-of query earlier than what has already been
    /// released (historical timestamps, a regressed clock) reports 0.
    pub fn releasable(&self, now: u64) -> u64 {
        self.vested_amount(now).saturating_sub(self.released)
    }
}

/// All vesting schedules, keyed by beneficiary
///
/// The book custodies the vested balances under one Token Ledger account;
/// that account is registered fee-exempt at configuration time so releases
/// are plain balance moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestingBook {
    custody_account: String,
    schedules: HashMap<String, VestingSchedule>,
}

impl VestingBook {
    pub fn new(custody_account: &str) -> Self {
        Self {
            custody_account: custody_account.to_string(),
            schedules: HashMap::new(),
        }
    }

    /// One-time schedule creation for a beneficiary
    pub fn create_vesting_schedule(
        &mut self,
        beneficiary: &str,
        start: u64,
        cliff_duration: u64,
        duration: u64,
        total_allocation: u64,
    ) -> Result<()> {
        if self.schedules.contains_key(beneficiary) {
            return Err(VestingError::ScheduleExists(beneficiary.to_string()));
        }
        if duration == 0 || total_allocation == 0 {
            return Err(VestingError::InvalidSchedule(
                "duration and allocation must be positive".to_string(),
            ));
        }
        if cliff_duration > duration {
            return Err(VestingError::InvalidSchedule(
                "cliff cannot extend past the vesting end".to_string(),
            ));
        }

        self.schedules.insert(
            beneficiary.to_string(),
            VestingSchedule {
                start,
                cliff: start + cliff_duration,
                duration,
                total_allocation,
                released: 0,
                initialized: true,
            },
        );
        log::info!(
            "vesting schedule for {}: {} over {}s (cliff {}s)",
            beneficiary,
            total_allocation,
            duration,
            cliff_duration
        );
        Ok(())
    }

    pub fn vested_amount(&self, beneficiary: &str, at_time: u64) -> Result<u64> {
        Ok(self.get(beneficiary)?.vested_amount(at_time))
    }

    pub fn releasable(&self, beneficiary: &str, now: u64) -> Result<u64> {
        Ok(self.get(beneficiary)?.releasable(now))
    }

    /// Release everything currently releasable to the beneficiary.
    ///
    /// Only the beneficiary may call this. Moves the amount from the custody
    /// account through the Token Ledger; `released` grows by exactly the
    /// moved amount and never exceeds `total_allocation`. Releasing with
    /// nothing vested is a no-op returning 0.
    pub fn release(
        &mut self,
        ledger: &mut TokenLedger,
        caller: &str,
        beneficiary: &str,
        now: u64,
    ) -> Result<u64> {
        if caller != beneficiary {
            return Err(VestingError::NotBeneficiary {
                caller: caller.to_string(),
                beneficiary: beneficiary.to_string(),
            });
        }
        let amount = self.get(beneficiary)?.releasable(now);
        if amount == 0 {
            return Ok(0);
        }

        // Ledger side first: a transfer failure leaves the schedule intact.
        ledger.transfer(&self.custody_account, beneficiary, amount)?;

        let schedule = self
            .schedules
            .get_mut(beneficiary)
            .expect("schedule presence checked above");
        schedule.released += amount;
        log::info!(
            "vesting release to {}: {} ({} of {} released)",
            beneficiary,
            amount,
            schedule.released,
            schedule.total_allocation
        );
        Ok(amount)
    }

    pub fn custody_account(&self) -> &str {
        &self.custody_account
    }

    pub fn schedule(&self, beneficiary: &str) -> Option<&VestingSchedule> {
        self.schedules.get(beneficiary)
    }

    fn get(&self, beneficiary: &str) -> Result<&VestingSchedule> {
        self.schedules
            .get(beneficiary)
            .ok_or_else(|| VestingError::ScheduleNotFound(beneficiary.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::units::COIN;

    const T: u64 = 1_700_000_000;

    fn book_with_schedule() -> VestingBook {
        let mut book = VestingBook::new("vesting-custody");
        book.create_vesting_schedule("alice", T, 3_600, 7_200, 10_000 * COIN)
            .unwrap();
        book
    }

    #[test]
    fn test_schedule_is_one_time() {
        let mut book = book_with_schedule();
        let err = book
            .create_vesting_schedule("alice", T, 0, 100, COIN)
            .unwrap_err();
        assert!(matches!(err, VestingError::ScheduleExists(_)));
        // the original schedule is untouched
        assert_eq!(book.schedule("alice").unwrap().duration, 7_200);
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let mut book = VestingBook::new("vesting-custody");
        assert!(matches!(
            book.create_vesting_schedule("bob", T, 0, 0, COIN),
            Err(VestingError::InvalidSchedule(_))
        ));
        assert!(matches!(
            book.create_vesting_schedule("bob", T, 200, 100, COIN),
            Err(VestingError::InvalidSchedule(_))
        ));
        assert!(book.schedule("bob").is_none());
    }

    #[test]
    fn test_vested_amount_ramp() {
        let book = book_with_schedule();

        // nothing visible before the cliff
        assert_eq!(book.vested_amount("alice", T + 3_599).unwrap(), 0);

        // at the cliff the ramp from `start` unlocks at once: 3600/7200 = 50%
        assert_eq!(book.vested_amount("alice", T + 3_600).unwrap(), 5_000 * COIN);

        // linear from start, not from the cliff
        assert_eq!(book.vested_amount("alice", T + 5_400).unwrap(), 7_500 * COIN);

        // fully vested at and after start + duration
        assert_eq!(book.vested_amount("alice", T + 7_200).unwrap(), 10_000 * COIN);
        assert_eq!(book.vested_amount("alice", T + 7_201).unwrap(), 10_000 * COIN);
    }

    #[test]
    fn test_releasable_with_earlier_timestamp_after_release() {
        let mut book = book_with_schedule();
        // mark half the allocation as already released
        book.schedules.get_mut("alice").unwrap().released = 5_000 * COIN;

        // queries earlier than what was released report 0, they never underflow
        assert_eq!(book.releasable("alice", T).unwrap(), 0);
        assert_eq!(book.releasable("alice", T + 3_599).unwrap(), 0);
        assert_eq!(book.releasable("alice", T + 3_600).unwrap(), 0);
        // and the ramp resumes past the released mark
        assert_eq!(book.releasable("alice", T + 5_400).unwrap(), 2_500 * COIN);
    }

    #[test]
    fn test_unknown_beneficiary() {
        let book = book_with_schedule();
        assert!(matches!(
            book.vested_amount("mallory", T),
            Err(VestingError::ScheduleNotFound(_))
        ));
    }
}
