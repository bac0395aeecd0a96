//! Token ledger state and operations

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use ember_core::events::{BurnOrigin, SupplyEvent};
use ember_core::units::{bps_of, BPS_DENOMINATOR};

use crate::error::{Result, TokenError};
use crate::schedule::ScheduledBurn;

/// Reward distribution policy: sender and recipient of the transfer are
/// excluded from the pro-rata reward split.
pub const REWARD_EXCLUDES_PARTIES: bool = true;

static NEXT_LEDGER_ID: AtomicU64 = AtomicU64::new(1);

/// Unforgeable owner capability for one ledger instance
///
/// Issued exactly once at genesis. Not cloneable: whichever component holds
/// the value holds the privileged burn/schedule surface, and reassigning the
/// capability is moving the value.
#[derive(Debug)]
pub struct OwnerCap {
    ledger_id: u64,
}

/// Breakdown of a committed transfer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Amount credited to the recipient
    pub received: u64,
    /// Amount burned out of total supply
    pub burned: u64,
    /// Amount distributed pro-rata across eligible holders
    pub reward_pool: u64,
}

/// Supply snapshot for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyStats {
    pub genesis_supply: u64,
    pub total_supply: u64,
    pub total_burned: u64,
    pub holder_count: usize,
}

/// The Ember token ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    ledger_id: u64,
    total_supply: u64,
    genesis_supply: u64,
    total_burned: u64,
    balances: HashMap<String, u64>,
    /// Accounts with a non-zero balance, maintained on every zero↔nonzero
    /// transition. Ordered so reward truncation is deterministic.
    holders: BTreeSet<String>,
    burn_rate_bps: u64,
    reward_rate_bps: u64,
    trading_enabled: bool,
    bot_protection: bool,
    burn_schedule_enabled: bool,
    fee_exempt: HashSet<String>,
    schedule: Vec<ScheduledBurn>,
    /// Account that absorbs privileged burns and reward dust
    owner: String,
    events: Vec<SupplyEvent>,
}

impl TokenLedger {
    /// Create the ledger at genesis with the full supply assigned to the
    /// deployer, and issue the one owner capability.
    ///
    /// Fails `InvalidAmount` on a zero supply or on rates that do not leave
    /// room for the recipient (`burn + reward` must stay below 100%).
    pub fn genesis(
        deployer: &str,
        initial_supply: u64,
        burn_rate_bps: u64,
        reward_rate_bps: u64,
    ) -> Result<(Self, OwnerCap)> {
        if initial_supply == 0 {
            return Err(TokenError::InvalidAmount(
                "genesis supply must be positive".to_string(),
            ));
        }
        validate_rates(burn_rate_bps, reward_rate_bps)?;

        let ledger_id = NEXT_LEDGER_ID.fetch_add(1, Ordering::Relaxed);
        let mut ledger = Self {
            ledger_id,
            total_supply: initial_supply,
            genesis_supply: initial_supply,
            total_burned: 0,
            balances: HashMap::new(),
            holders: BTreeSet::new(),
            burn_rate_bps,
            reward_rate_bps,
            trading_enabled: false,
            bot_protection: false,
            burn_schedule_enabled: false,
            fee_exempt: HashSet::new(),
            schedule: Vec::new(),
            owner: deployer.to_string(),
            events: vec![SupplyEvent::Minted {
                amount: initial_supply,
            }],
        };
        ledger.credit(deployer, initial_supply);

        log::info!(
            "Token ledger {} created: supply {} assigned to {}",
            ledger_id,
            initial_supply,
            deployer
        );
        Ok((ledger, OwnerCap { ledger_id }))
    }

    fn check_cap(&self, cap: &OwnerCap) -> Result<()> {
        if cap.ledger_id != self.ledger_id {
            return Err(TokenError::Unauthorized);
        }
        Ok(())
    }

    /// Transfer `amount` from `from` to `to`.
    ///
    /// While trading is enabled (and not suppressed by bot protection or a
    /// fee exemption on either party) the deflation model applies: a burn
    /// share leaves the supply and a reward share is split pro-rata across
    /// the other non-zero holders. Otherwise this is a plain balance move.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<TransferOutcome> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount(
                "transfer amount must be positive".to_string(),
            ));
        }
        if from == to {
            return Err(TokenError::InvalidAmount(
                "sender and recipient must differ".to_string(),
            ));
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let deflation_active = self.trading_enabled
            && !self.bot_protection
            && !self.fee_exempt.contains(from)
            && !self.fee_exempt.contains(to);

        let (burned, reward_pool) = if deflation_active {
            (
                bps_of(amount, self.burn_rate_bps),
                bps_of(amount, self.reward_rate_bps),
            )
        } else {
            (0, 0)
        };
        let received = amount - burned - reward_pool;

        // Pro-rata split over pre-transfer balances, parties excluded.
        let mut shares: Vec<(String, u64)> = Vec::new();
        let mut distributed = 0u64;
        if reward_pool > 0 {
            let eligible: Vec<&String> = self
                .holders
                .iter()
                .filter(|h| h.as_str() != from && h.as_str() != to)
                .collect();
            let eligible_total: u64 = eligible.iter().map(|h| self.balance_of(h)).sum();
            if eligible_total > 0 {
                for holder in eligible {
                    let share = ember_core::units::mul_div(
                        reward_pool,
                        self.balance_of(holder),
                        eligible_total,
                    );
                    if share > 0 {
                        shares.push((holder.clone(), share));
                        distributed += share;
                    }
                }
            }
        }
        let dust = reward_pool - distributed;

        // Commit
        self.debit(from, amount);
        self.credit(to, received);
        for (holder, share) in shares {
            self.credit(&holder, share);
        }
        if dust > 0 {
            let owner = self.owner.clone();
            self.credit(&owner, dust);
        }
        if burned > 0 {
            self.total_supply -= burned;
            self.total_burned += burned;
            self.events.push(SupplyEvent::Burned {
                amount: burned,
                origin: BurnOrigin::TransferFee,
            });
        }

        log::debug!(
            "transfer {} -> {}: amount {}, received {}, burned {}, reward {}",
            from,
            to,
            amount,
            received,
            burned,
            reward_pool
        );
        Ok(TransferOutcome {
            received,
            burned,
            reward_pool,
        })
    }

    /// Privileged burn out of the owner account and total supply
    pub fn burn_tokens(&mut self, cap: &OwnerCap, amount: u64) -> Result<()> {
        self.burn_from_owner(cap, amount, BurnOrigin::Direct)
    }

    /// Privileged burn attributed to the treasury buyback program
    ///
    /// Same semantics as `burn_tokens`; only the event attribution differs.
    pub fn burn_for_buyback(&mut self, cap: &OwnerCap, amount: u64) -> Result<()> {
        self.burn_from_owner(cap, amount, BurnOrigin::Buyback)
    }

    fn burn_from_owner(&mut self, cap: &OwnerCap, amount: u64, origin: BurnOrigin) -> Result<()> {
        self.check_cap(cap)?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount(
                "burn amount must be positive".to_string(),
            ));
        }
        if amount > self.total_supply {
            return Err(TokenError::InsufficientSupply {
                requested: amount,
                supply: self.total_supply,
            });
        }
        let available = self.balance_of(&self.owner);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let owner = self.owner.clone();
        self.debit(&owner, amount);
        self.total_supply -= amount;
        self.total_burned += amount;
        self.events.push(SupplyEvent::Burned { amount, origin });

        log::info!("burned {} ({:?}), supply now {}", amount, origin, self.total_supply);
        Ok(())
    }

    /// Append an unexecuted scheduled burn
    ///
    /// Fails `ScheduleExists` if an equivalent entry is already pending.
    pub fn add_scheduled_burn(&mut self, cap: &OwnerCap, due_at: u64, amount: u64) -> Result<()> {
        self.check_cap(cap)?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount(
                "scheduled burn amount must be positive".to_string(),
            ));
        }
        let duplicate = self
            .schedule
            .iter()
            .any(|e| !e.executed && e.due_at == due_at && e.amount == amount);
        if duplicate {
            return Err(TokenError::ScheduleExists { due_at, amount });
        }
        self.schedule.push(ScheduledBurn::new(due_at, amount));
        Ok(())
    }

    /// Gate execution of the burn schedule (scheduling stays open)
    pub fn set_burn_schedule_enabled(&mut self, cap: &OwnerCap, enabled: bool) -> Result<()> {
        self.check_cap(cap)?;
        self.burn_schedule_enabled = enabled;
        Ok(())
    }

    /// Execute every due, unexecuted scheduled burn; returns the total burned.
    ///
    /// Burns absorb from the owner account. A due entry the owner balance
    /// cannot cover stays pending and is retried on a later scan. Returns 0
    /// and mutates nothing when the schedule is disabled or nothing is due.
    pub fn execute_scheduled_burns(&mut self, cap: &OwnerCap, now: u64) -> Result<u64> {
        self.check_cap(cap)?;
        if !self.burn_schedule_enabled {
            return Ok(0);
        }

        let mut total = 0u64;
        for i in 0..self.schedule.len() {
            let (due, amount) = {
                let entry = &self.schedule[i];
                if !entry.is_due(now) {
                    continue;
                }
                (entry.due_at, entry.amount)
            };
            if amount > self.balance_of(&self.owner) || amount > self.total_supply {
                log::warn!("scheduled burn of {} due at {} deferred: reserve too low", amount, due);
                continue;
            }
            let owner = self.owner.clone();
            self.debit(&owner, amount);
            self.total_supply -= amount;
            self.total_burned += amount;
            self.events.push(SupplyEvent::Burned {
                amount,
                origin: BurnOrigin::Scheduled,
            });
            self.schedule[i].executed = true;
            total += amount;
        }
        if total > 0 {
            log::info!("scheduled burns executed at {}: {} burned", now, total);
        }
        Ok(total)
    }

    /// Reassign the owner account (the balance absorbing privileged burns).
    ///
    /// The capability value itself moves between components by Rust move
    /// semantics; this re-points the absorbing account, e.g. to the treasury
    /// reserve.
    pub fn transfer_ownership(&mut self, cap: &OwnerCap, new_owner: &str) -> Result<()> {
        self.check_cap(cap)?;
        log::info!("owner account changed: {} -> {}", self.owner, new_owner);
        self.owner = new_owner.to_string();
        Ok(())
    }

    pub fn set_trading_enabled(&mut self, cap: &OwnerCap, enabled: bool) -> Result<()> {
        self.check_cap(cap)?;
        self.trading_enabled = enabled;
        Ok(())
    }

    /// Bot protection suppresses deflation while enabled
    pub fn set_bot_protection(&mut self, cap: &OwnerCap, enabled: bool) -> Result<()> {
        self.check_cap(cap)?;
        self.bot_protection = enabled;
        Ok(())
    }

    /// Exempt an account (e.g. treasury or vesting custody) from deflation
    pub fn set_fee_exempt(&mut self, cap: &OwnerCap, account: &str, exempt: bool) -> Result<()> {
        self.check_cap(cap)?;
        if exempt {
            self.fee_exempt.insert(account.to_string());
        } else {
            self.fee_exempt.remove(account);
        }
        Ok(())
    }

    /// Update the deflation rates; together they must stay below 100%
    pub fn set_rates(&mut self, cap: &OwnerCap, burn_bps: u64, reward_bps: u64) -> Result<()> {
        self.check_cap(cap)?;
        validate_rates(burn_bps, reward_bps)?;
        self.burn_rate_bps = burn_bps;
        self.reward_rate_bps = reward_bps;
        Ok(())
    }

    pub fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    pub fn owner_account(&self) -> &str {
        &self.owner
    }

    pub fn scheduled_burns(&self) -> &[ScheduledBurn] {
        &self.schedule
    }

    pub fn events(&self) -> &[SupplyEvent] {
        &self.events
    }

    pub fn supply_stats(&self) -> SupplyStats {
        SupplyStats {
            genesis_supply: self.genesis_supply,
            total_supply: self.total_supply,
            total_burned: self.total_burned,
            holder_count: self.holders.len(),
        }
    }

    fn credit(&mut self, account: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let balance = self.balances.entry(account.to_string()).or_insert(0);
        if *balance == 0 {
            self.holders.insert(account.to_string());
        }
        *balance += amount;
    }

    fn debit(&mut self, account: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let balance = self
            .balances
            .get_mut(account)
            .expect("debit of unknown account is checked by callers");
        *balance -= amount;
        if *balance == 0 {
            self.holders.remove(account);
        }
    }
}

fn validate_rates(burn_bps: u64, reward_bps: u64) -> Result<()> {
    if burn_bps + reward_bps >= BPS_DENOMINATOR {
        return Err(TokenError::InvalidAmount(format!(
            "burn + reward rates must stay below {} bps",
            BPS_DENOMINATOR
        )));
    }
    Ok(())
}
