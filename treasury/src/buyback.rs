//! Buyback program: manual, scheduled, and condition-triggered
//!
//! Every path funnels through one burn-and-record routine so a
//! `BuybackRecord` means the same thing regardless of how the buyback was
//! initiated. The treasury spends its primary asset and burns the bought
//! tokens through the Token Ledger's owner capability.

use serde::{Deserialize, Serialize};

use ember_core::units::{mul_div, COIN};
use ember_token::{OwnerCap, TokenLedger};

use crate::error::{Result, TreasuryError};
use crate::vault::Treasury;

/// Completed buyback, appended on every successful path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuybackRecord {
    pub amount_spent: u64,
    pub tokens_bought: u64,
    pub price: u64,
}

/// A due-time-gated buyback that executes at most once
///
/// `target_price` is a maximum acceptable price: a due entry executes only
/// when the injected market price is at or below it, and stays pending
/// otherwise. Sizing always uses the market price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledBuyback {
    pub due_at: u64,
    pub amount: u64,
    pub target_price: u64,
    pub executed: bool,
}

/// Market condition a trigger fires on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TriggerCondition {
    /// Fires when the market price drops below the threshold
    #[serde(rename = "price_drop")]
    PriceBelow,
    /// Fires when the market price rises above the threshold
    #[serde(rename = "price_rise")]
    PriceAbove,
}

impl TriggerCondition {
    pub fn fires(&self, current_price: u64, threshold: u64) -> bool {
        match self {
            TriggerCondition::PriceBelow => current_price < threshold,
            TriggerCondition::PriceAbove => current_price > threshold,
        }
    }
}

/// A condition-based rule authorizing a one-time buyback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuybackTrigger {
    pub name: String,
    pub condition: TriggerCondition,
    pub threshold: u64,
    pub amount: u64,
    pub executed: bool,
}

impl Treasury {
    /// Spend primary-asset funds to buy and burn tokens at `token_price`
    /// (primary units per whole token).
    ///
    /// Returns the number of tokens bought and burned. The token-side burn
    /// happens before any treasury mutation, so a ledger failure leaves the
    /// treasury untouched.
    pub fn execute_buyback(
        &mut self,
        ledger: &mut TokenLedger,
        cap: &OwnerCap,
        amount_to_spend: u64,
        token_price: u64,
    ) -> Result<u64> {
        self.run_buyback(ledger, cap, amount_to_spend, token_price)
    }

    /// Append an unexecuted scheduled buyback
    pub fn add_scheduled_buyback(
        &mut self,
        due_at: u64,
        amount: u64,
        target_price: u64,
    ) -> Result<()> {
        if amount == 0 || target_price == 0 {
            return Err(TreasuryError::InvalidAmount(
                "scheduled buyback amount and target price must be positive".to_string(),
            ));
        }
        let duplicate = self
            .scheduled_buybacks
            .iter()
            .any(|e| !e.executed && e.due_at == due_at && e.amount == amount);
        if duplicate {
            return Err(TreasuryError::ScheduleExists { due_at, amount });
        }
        self.scheduled_buybacks.push(ScheduledBuyback {
            due_at,
            amount,
            target_price,
            executed: false,
        });
        Ok(())
    }

    /// Gate execution of the buyback schedule (scheduling stays open)
    pub fn set_auto_buyback_enabled(&mut self, enabled: bool) {
        self.auto_buyback_enabled = enabled;
    }

    /// Execute every due, unexecuted scheduled buyback whose target price
    /// admits the current market price; returns the total tokens bought.
    ///
    /// Entries the treasury or ledger cannot fund are deferred, not failed;
    /// each entry executes at most once.
    pub fn execute_scheduled_buybacks(
        &mut self,
        ledger: &mut TokenLedger,
        cap: &OwnerCap,
        now: u64,
        current_price: u64,
    ) -> Result<u64> {
        if current_price == 0 {
            return Err(TreasuryError::InvalidAmount(
                "market price must be positive".to_string(),
            ));
        }
        if !self.auto_buyback_enabled {
            return Ok(0);
        }

        let mut total = 0u64;
        for i in 0..self.scheduled_buybacks.len() {
            let (amount, target_price) = {
                let entry = &self.scheduled_buybacks[i];
                if entry.executed || entry.due_at > now {
                    continue;
                }
                (entry.amount, entry.target_price)
            };
            if current_price > target_price {
                continue;
            }
            match self.run_buyback(ledger, cap, amount, current_price) {
                Ok(tokens) => {
                    self.scheduled_buybacks[i].executed = true;
                    total += tokens;
                }
                Err(e) => {
                    log::warn!("scheduled buyback of {} deferred: {}", amount, e);
                }
            }
        }
        Ok(total)
    }

    /// Register a one-time condition-based buyback rule
    pub fn add_buyback_trigger(
        &mut self,
        name: &str,
        condition: TriggerCondition,
        threshold: u64,
        amount: u64,
    ) -> Result<()> {
        if amount == 0 || threshold == 0 {
            return Err(TreasuryError::InvalidAmount(
                "trigger amount and threshold must be positive".to_string(),
            ));
        }
        if self.triggers.iter().any(|t| !t.executed && t.name == name) {
            return Err(TreasuryError::TriggerExists(name.to_string()));
        }
        self.triggers.push(BuybackTrigger {
            name: name.to_string(),
            condition,
            threshold,
            amount,
            executed: false,
        });
        Ok(())
    }

    /// Fire every matching, unexecuted trigger against the market price;
    /// returns the total tokens bought. Each trigger fires at most once.
    pub fn check_buyback_triggers(
        &mut self,
        ledger: &mut TokenLedger,
        cap: &OwnerCap,
        current_price: u64,
        condition: TriggerCondition,
    ) -> Result<u64> {
        if current_price == 0 {
            return Err(TreasuryError::InvalidAmount(
                "market price must be positive".to_string(),
            ));
        }

        let mut total = 0u64;
        for i in 0..self.triggers.len() {
            let (name, amount) = {
                let trigger = &self.triggers[i];
                if trigger.executed
                    || trigger.condition != condition
                    || !trigger.condition.fires(current_price, trigger.threshold)
                {
                    continue;
                }
                (trigger.name.clone(), trigger.amount)
            };
            match self.run_buyback(ledger, cap, amount, current_price) {
                Ok(tokens) => {
                    self.triggers[i].executed = true;
                    total += tokens;
                    log::info!("trigger {} fired at price {}: {} tokens", name, current_price, tokens);
                }
                Err(e) => {
                    log::warn!("trigger {} deferred: {}", name, e);
                }
            }
        }
        Ok(total)
    }

    pub fn buyback_history(&self) -> &[BuybackRecord] {
        &self.buyback_history
    }

    pub fn scheduled_buybacks(&self) -> &[ScheduledBuyback] {
        &self.scheduled_buybacks
    }

    pub fn triggers(&self) -> &[BuybackTrigger] {
        &self.triggers
    }

    /// The single burn-and-record path behind all three buyback surfaces
    fn run_buyback(
        &mut self,
        ledger: &mut TokenLedger,
        cap: &OwnerCap,
        amount_to_spend: u64,
        token_price: u64,
    ) -> Result<u64> {
        if amount_to_spend == 0 || token_price == 0 {
            return Err(TreasuryError::InvalidAmount(
                "buyback spend and price must be positive".to_string(),
            ));
        }
        let available = self.primary_balance();
        if amount_to_spend > available {
            return Err(TreasuryError::InsufficientFunds {
                requested: amount_to_spend,
                available,
            });
        }
        let tokens_bought = mul_div(amount_to_spend, COIN, token_price);
        if tokens_bought == 0 {
            return Err(TreasuryError::InvalidAmount(
                "spend too small to buy any token at this price".to_string(),
            ));
        }

        // Token side first: a ledger failure must leave the treasury intact.
        ledger.burn_for_buyback(cap, tokens_bought)?;

        self.debit_primary(amount_to_spend);
        self.buyback_history.push(BuybackRecord {
            amount_spent: amount_to_spend,
            tokens_bought,
            price: token_price,
        });
        log::info!(
            "buyback: spent {} for {} tokens at price {}",
            amount_to_spend,
            tokens_bought,
            token_price
        );
        Ok(tokens_bought)
    }
}
