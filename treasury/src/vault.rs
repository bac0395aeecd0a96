//! Treasury balance vault and allocations

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::buyback::{BuybackRecord, BuybackTrigger, ScheduledBuyback};
use crate::error::{Result, TreasuryError};

/// A named earmark of treasury funds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    pub name: String,
    pub amount: u64,
    pub purpose: String,
}

/// The treasury: named-asset balances, allocations, and the buyback program
///
/// `signers`/`required_signatures` describe the multi-signature policy;
/// signature collection itself happens outside this core, so every call here
/// is treated as already authorized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treasury {
    pub(crate) signers: BTreeSet<String>,
    pub(crate) required_signatures: u32,
    pub(crate) primary_asset: String,
    pub(crate) balances: HashMap<String, u64>,
    pub(crate) allocations: Vec<Allocation>,
    pub(crate) buyback_history: Vec<BuybackRecord>,
    pub(crate) scheduled_buybacks: Vec<ScheduledBuyback>,
    pub(crate) triggers: Vec<BuybackTrigger>,
    pub(crate) auto_buyback_enabled: bool,
}

impl Treasury {
    pub fn new(primary_asset: &str, signers: Vec<String>, required_signatures: u32) -> Self {
        Self {
            signers: signers.into_iter().collect(),
            required_signatures,
            primary_asset: primary_asset.to_string(),
            balances: HashMap::new(),
            allocations: Vec::new(),
            buyback_history: Vec::new(),
            scheduled_buybacks: Vec::new(),
            triggers: Vec::new(),
            auto_buyback_enabled: false,
        }
    }

    /// Deposit funds into a named asset balance
    pub fn add_funds(&mut self, asset: &str, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(TreasuryError::InvalidAmount(
                "deposit amount must be positive".to_string(),
            ));
        }
        *self.balances.entry(asset.to_string()).or_insert(0) += amount;
        log::debug!("treasury: {} {} deposited", amount, asset);
        Ok(())
    }

    /// Earmark primary-asset funds under a named allocation
    pub fn allocate_funds(&mut self, name: &str, amount: u64, purpose: &str) -> Result<()> {
        if amount == 0 {
            return Err(TreasuryError::InvalidAmount(
                "allocation amount must be positive".to_string(),
            ));
        }
        let available = self.primary_balance();
        if amount > available {
            return Err(TreasuryError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        self.debit_primary(amount);
        self.allocations.push(Allocation {
            name: name.to_string(),
            amount,
            purpose: purpose.to_string(),
        });
        log::info!("treasury: {} allocated to {}", amount, name);
        Ok(())
    }

    pub fn balance(&self, asset: &str) -> u64 {
        self.balances.get(asset).copied().unwrap_or(0)
    }

    pub fn primary_balance(&self) -> u64 {
        self.balance(&self.primary_asset)
    }

    pub fn primary_asset(&self) -> &str {
        &self.primary_asset
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn signers(&self) -> &BTreeSet<String> {
        &self.signers
    }

    pub fn required_signatures(&self) -> u32 {
        self.required_signatures
    }

    pub(crate) fn debit_primary(&mut self, amount: u64) {
        let balance = self
            .balances
            .get_mut(&self.primary_asset)
            .expect("debit is preceded by a balance check");
        *balance -= amount;
    }
}
