//! Constant-product pool state and operations

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ember_core::units::{bps_of, integer_sqrt, mul_div};

use crate::error::{PoolError, Result};

/// Which reserve the swap input enters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SwapSide {
    Token,
    Paired,
}

/// Quoted result of a swap: output amount and the fee retained by the pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapQuote {
    pub amount_out: u64,
    pub fee: u64,
}

/// A user's recorded liquidity position
///
/// Created on the first `add_liquidity` call and accumulated on later ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub token_amount: u64,
    pub paired_amount: u64,
    pub lp_shares: u64,
    pub duration_days: u64,
}

/// x*y=k pool for one trading pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityPool {
    pool_id: String,
    fee_bps: u64,
    total_liquidity: u64,
    token_reserve: u64,
    paired_reserve: u64,
    total_volume: u64,
    liquidity_locked: bool,
    lock_duration_days: u64,
    positions: HashMap<String, Position>,
}

impl LiquidityPool {
    pub fn new(pool_id: &str, fee_bps: u64) -> Self {
        Self {
            pool_id: pool_id.to_string(),
            fee_bps,
            total_liquidity: 0,
            token_reserve: 0,
            paired_reserve: 0,
            total_volume: 0,
            liquidity_locked: false,
            lock_duration_days: 0,
            positions: HashMap::new(),
        }
    }

    /// Deposit both assets and mint LP shares.
    ///
    /// The first depositor sets the price and receives the geometric mean of
    /// the deposit. Later depositors receive the min-ratio share; the full
    /// deposited amounts enter the reserves, so any ratio excess is a
    /// donation to the pool and mints no shares.
    pub fn add_liquidity(
        &mut self,
        user: &str,
        token_amount: u64,
        paired_amount: u64,
        duration_days: u64,
    ) -> Result<u64> {
        if token_amount == 0 || paired_amount == 0 {
            return Err(PoolError::InvalidAmount(
                "both deposit amounts must be positive".to_string(),
            ));
        }
        if duration_days == 0 {
            return Err(PoolError::InvalidDuration(
                "deposit duration must be positive".to_string(),
            ));
        }

        let minted = if self.total_liquidity == 0 {
            integer_sqrt(token_amount as u128 * paired_amount as u128) as u64
        } else {
            let from_token = mul_div(token_amount, self.total_liquidity, self.token_reserve);
            let from_paired = mul_div(paired_amount, self.total_liquidity, self.paired_reserve);
            from_token.min(from_paired)
        };
        if minted == 0 {
            return Err(PoolError::InvalidAmount(
                "deposit too small to mint a share".to_string(),
            ));
        }

        self.token_reserve += token_amount;
        self.paired_reserve += paired_amount;
        self.total_liquidity += minted;

        let position = self.positions.entry(user.to_string()).or_insert(Position {
            token_amount: 0,
            paired_amount: 0,
            lp_shares: 0,
            duration_days: 0,
        });
        position.token_amount += token_amount;
        position.paired_amount += paired_amount;
        position.lp_shares += minted;
        position.duration_days = position.duration_days.max(duration_days);

        log::debug!(
            "pool {}: {} added {}/{} for {} shares",
            self.pool_id,
            user,
            token_amount,
            paired_amount,
            minted
        );
        Ok(minted)
    }

    /// Redeem LP shares for a proportional cut of both reserves.
    pub fn remove_liquidity(&mut self, user: &str, lp_amount: u64) -> Result<(u64, u64)> {
        if self.liquidity_locked {
            return Err(PoolError::LiquidityLocked);
        }
        if lp_amount == 0 {
            return Err(PoolError::InvalidAmount(
                "redeemed share amount must be positive".to_string(),
            ));
        }
        if lp_amount > self.total_liquidity {
            return Err(PoolError::InsufficientLiquidity {
                requested: lp_amount,
                available: self.total_liquidity,
            });
        }
        let held = self.positions.get(user).map(|p| p.lp_shares).unwrap_or(0);
        if lp_amount > held {
            return Err(PoolError::InsufficientLiquidity {
                requested: lp_amount,
                available: held,
            });
        }

        let token_out = mul_div(lp_amount, self.token_reserve, self.total_liquidity);
        let paired_out = mul_div(lp_amount, self.paired_reserve, self.total_liquidity);

        self.token_reserve -= token_out;
        self.paired_reserve -= paired_out;
        self.total_liquidity -= lp_amount;

        let remaining = held - lp_amount;
        if remaining == 0 {
            self.positions.remove(user);
        } else if let Some(position) = self.positions.get_mut(user) {
            position.token_amount = mul_div(position.token_amount, remaining, held);
            position.paired_amount = mul_div(position.paired_amount, remaining, held);
            position.lp_shares = remaining;
        }

        log::debug!(
            "pool {}: {} removed {} shares for {}/{}",
            self.pool_id,
            user,
            lp_amount,
            token_out,
            paired_out
        );
        Ok((token_out, paired_out))
    }

    /// Quote a swap without touching the reserves.
    ///
    /// `k` is taken before the fee-adjusted deposit; the new output reserve
    /// is rounded up so a committed swap can never shrink the product.
    pub fn calculate_swap_output(&self, side: SwapSide, amount_in: u64) -> Result<SwapQuote> {
        if amount_in == 0 {
            return Err(PoolError::InvalidAmount(
                "swap input must be positive".to_string(),
            ));
        }
        let (input_reserve, output_reserve) = self.reserves_for(side);
        if input_reserve == 0 || output_reserve == 0 {
            return Err(PoolError::InsufficientLiquidity {
                requested: amount_in,
                available: 0,
            });
        }

        let fee = bps_of(amount_in, self.fee_bps);
        let amount_in_with_fee = amount_in - fee;
        let k = input_reserve as u128 * output_reserve as u128;
        let new_output_reserve =
            k.div_ceil(input_reserve as u128 + amount_in_with_fee as u128) as u64;
        let amount_out = output_reserve - new_output_reserve;

        Ok(SwapQuote { amount_out, fee })
    }

    /// Execute a swap, committing the reserve changes.
    pub fn swap(&mut self, user: &str, side: SwapSide, amount_in: u64) -> Result<SwapQuote> {
        let quote = self.calculate_swap_output(side, amount_in)?;

        match side {
            SwapSide::Token => {
                self.token_reserve += amount_in;
                self.paired_reserve -= quote.amount_out;
            }
            SwapSide::Paired => {
                self.paired_reserve += amount_in;
                self.token_reserve -= quote.amount_out;
            }
        }
        self.total_volume += amount_in;

        log::debug!(
            "pool {}: {} swapped {} ({:?} in) for {}",
            self.pool_id,
            user,
            amount_in,
            side,
            quote.amount_out
        );
        Ok(quote)
    }

    /// Block all liquidity removal until unlocked.
    pub fn lock_liquidity(&mut self, duration_days: u64) -> Result<()> {
        if duration_days == 0 {
            return Err(PoolError::InvalidDuration(
                "lock duration must be positive".to_string(),
            ));
        }
        self.liquidity_locked = true;
        self.lock_duration_days = duration_days;
        log::info!("pool {}: liquidity locked for {} days", self.pool_id, duration_days);
        Ok(())
    }

    pub fn unlock_liquidity(&mut self) {
        self.liquidity_locked = false;
        self.lock_duration_days = 0;
        log::info!("pool {}: liquidity unlocked", self.pool_id);
    }

    fn reserves_for(&self, input_side: SwapSide) -> (u64, u64) {
        match input_side {
            SwapSide::Token => (self.token_reserve, self.paired_reserve),
            SwapSide::Paired => (self.paired_reserve, self.token_reserve),
        }
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    pub fn reserves(&self) -> (u64, u64) {
        (self.token_reserve, self.paired_reserve)
    }

    pub fn constant_product(&self) -> u128 {
        self.token_reserve as u128 * self.paired_reserve as u128
    }

    pub fn total_liquidity(&self) -> u64 {
        self.total_liquidity
    }

    pub fn total_volume(&self) -> u64 {
        self.total_volume
    }

    pub fn is_locked(&self) -> bool {
        self.liquidity_locked
    }

    pub fn position(&self, user: &str) -> Option<&Position> {
        self.positions.get(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::units::COIN;

    fn seeded_pool() -> LiquidityPool {
        let mut pool = LiquidityPool::new("ember-usd", 30);
        pool.add_liquidity("alice", 1_000_000 * COIN, 1_000_000 * COIN, 30)
            .unwrap();
        pool
    }

    #[test]
    fn test_first_deposit_sets_geometric_mean() {
        let mut pool = LiquidityPool::new("ember-usd", 30);
        let minted = pool
            .add_liquidity("alice", 1_000_000 * COIN, 1_000_000 * COIN, 30)
            .unwrap();
        assert_eq!(minted, 1_000_000 * COIN);
        assert_eq!(pool.reserves(), (1_000_000 * COIN, 1_000_000 * COIN));
        assert_eq!(pool.total_liquidity(), 1_000_000 * COIN);
    }

    #[test]
    fn test_add_liquidity_validation() {
        let mut pool = LiquidityPool::new("ember-usd", 30);
        assert!(matches!(
            pool.add_liquidity("alice", 0, COIN, 30),
            Err(PoolError::InvalidAmount(_))
        ));
        assert!(matches!(
            pool.add_liquidity("alice", COIN, COIN, 0),
            Err(PoolError::InvalidDuration(_))
        ));
        assert_eq!(pool.total_liquidity(), 0);
    }

    #[test]
    fn test_subsequent_deposit_min_ratio() {
        let mut pool = seeded_pool();
        // matched ratio mints proportionally
        let minted = pool
            .add_liquidity("bob", 100_000 * COIN, 100_000 * COIN, 60)
            .unwrap();
        assert_eq!(minted, 100_000 * COIN);

        // excess on one side is a donation: shares follow the lesser ratio
        let minted = pool
            .add_liquidity("carol", 100_000 * COIN, 200_000 * COIN, 30)
            .unwrap();
        assert_eq!(minted, 100_000 * COIN);
        let (_, paired) = pool.reserves();
        assert_eq!(paired, 1_300_000 * COIN);
    }

    #[test]
    fn test_position_accumulates() {
        let mut pool = seeded_pool();
        pool.add_liquidity("bob", 50_000 * COIN, 50_000 * COIN, 10).unwrap();
        pool.add_liquidity("bob", 50_000 * COIN, 50_000 * COIN, 90).unwrap();
        let position = pool.position("bob").unwrap();
        assert_eq!(position.token_amount, 100_000 * COIN);
        assert_eq!(position.lp_shares, 100_000 * COIN);
        assert_eq!(position.duration_days, 90);
    }

    #[test]
    fn test_swap_scenario_million_reserves() {
        // reserves 1,000,000 / 1,000,000, fee 0.3%, 100 token in
        let mut pool = seeded_pool();
        let k_before = pool.constant_product();

        let quote = pool.calculate_swap_output(SwapSide::Token, 100 * COIN).unwrap();
        assert_eq!(quote.fee, 30_000_000); // 0.3 COIN
        assert_eq!(quote.amount_out, 9_969_006_090); // ≈ 99.69 paired

        // the quote is a pure read
        assert_eq!(pool.constant_product(), k_before);
        assert_eq!(pool.total_volume(), 0);

        let committed = pool.swap("bob", SwapSide::Token, 100 * COIN).unwrap();
        assert_eq!(committed, quote);
        assert_eq!(pool.total_volume(), 100 * COIN);
        // retained fee grows k
        assert!(pool.constant_product() > k_before);
    }

    #[test]
    fn test_zero_fee_swap_preserves_product() {
        let mut pool = LiquidityPool::new("ember-usd", 0);
        pool.add_liquidity("alice", 100 * COIN, 100 * COIN, 30).unwrap();
        let k_before = pool.constant_product();
        let quote = pool.swap("bob", SwapSide::Token, 100 * COIN).unwrap();
        assert_eq!(quote.amount_out, 50 * COIN);
        assert_eq!(pool.constant_product(), k_before);
    }

    #[test]
    fn test_product_never_decreases_over_swaps() {
        let mut pool = seeded_pool();
        let mut k = pool.constant_product();
        for i in 1..=20u64 {
            let side = if i % 2 == 0 { SwapSide::Token } else { SwapSide::Paired };
            pool.swap("bob", side, i * 7 * COIN).unwrap();
            let k_after = pool.constant_product();
            assert!(k_after >= k);
            k = k_after;
        }
    }

    #[test]
    fn test_remove_liquidity_proportional() {
        let mut pool = seeded_pool();
        pool.add_liquidity("bob", 250_000 * COIN, 250_000 * COIN, 30).unwrap();

        let (token_out, paired_out) = pool.remove_liquidity("bob", 250_000 * COIN).unwrap();
        assert_eq!(token_out, 250_000 * COIN);
        assert_eq!(paired_out, 250_000 * COIN);
        assert!(pool.position("bob").is_none());
        assert_eq!(pool.total_liquidity(), 1_000_000 * COIN);
    }

    #[test]
    fn test_remove_liquidity_bounded_by_own_share() {
        let mut pool = seeded_pool();
        pool.add_liquidity("bob", 100_000 * COIN, 100_000 * COIN, 30).unwrap();

        // bob cannot take alice's share
        let err = pool.remove_liquidity("bob", 200_000 * COIN).unwrap_err();
        assert!(matches!(err, PoolError::InsufficientLiquidity { .. }));

        // nor can anyone exceed the pool
        let err = pool.remove_liquidity("alice", 2_000_000 * COIN).unwrap_err();
        assert!(matches!(err, PoolError::InsufficientLiquidity { .. }));
        assert_eq!(pool.total_liquidity(), 1_100_000 * COIN);
    }

    #[test]
    fn test_partial_removal_scales_position() {
        let mut pool = seeded_pool();
        pool.remove_liquidity("alice", 400_000 * COIN).unwrap();
        let position = pool.position("alice").unwrap();
        assert_eq!(position.lp_shares, 600_000 * COIN);
        assert_eq!(position.token_amount, 600_000 * COIN);
        assert_eq!(pool.total_liquidity(), 600_000 * COIN);
    }

    #[test]
    fn test_lock_blocks_removal() {
        let mut pool = seeded_pool();
        pool.lock_liquidity(90).unwrap();
        assert!(pool.is_locked());

        let err = pool.remove_liquidity("alice", COIN).unwrap_err();
        assert!(matches!(err, PoolError::LiquidityLocked));

        pool.unlock_liquidity();
        assert!(pool.remove_liquidity("alice", COIN).is_ok());
    }

    #[test]
    fn test_pool_snapshot_roundtrip() {
        let mut pool = seeded_pool();
        pool.swap("bob", SwapSide::Token, 100 * COIN).unwrap();

        let json = serde_json::to_string(&pool).unwrap();
        let restored: LiquidityPool = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.reserves(), pool.reserves());
        assert_eq!(restored.total_liquidity(), pool.total_liquidity());
        assert_eq!(restored.total_volume(), pool.total_volume());
        assert_eq!(restored.position("alice"), pool.position("alice"));
    }

    #[test]
    fn test_lock_duration_validation() {
        let mut pool = seeded_pool();
        assert!(matches!(
            pool.lock_liquidity(0),
            Err(PoolError::InvalidDuration(_))
        ));
        assert!(!pool.is_locked());
    }
}
