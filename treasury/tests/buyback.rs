//! Cross-component buyback flow: treasury spending against the token ledger

use ember_core::events::{BurnOrigin, SupplyEvent};
use ember_core::units::COIN;
use ember_token::TokenLedger;
use ember_treasury::{Treasury, TriggerCondition};

#[test]
fn test_full_buyback_program() {
    let (mut ledger, cap) = TokenLedger::genesis("reserve", 10_000_000 * COIN, 0, 0).unwrap();
    let mut treasury = Treasury::new("usd", vec!["mn1".to_string(), "mn2".to_string()], 2);
    treasury.add_funds("usd", 50_000 * COIN).unwrap();

    // manual buyback: 10,000 usd at 2 usd/token
    let bought = treasury
        .execute_buyback(&mut ledger, &cap, 10_000 * COIN, 2 * COIN)
        .unwrap();
    assert_eq!(bought, 5_000 * COIN);

    // scheduled buyback at a 2 usd ceiling, executed once the market dips
    treasury.add_scheduled_buyback(1_000, 10_000 * COIN, 2 * COIN).unwrap();
    treasury.set_auto_buyback_enabled(true);
    let bought = treasury
        .execute_scheduled_buybacks(&mut ledger, &cap, 2_000, COIN)
        .unwrap();
    assert_eq!(bought, 10_000 * COIN);

    // dip trigger below 1 usd
    treasury
        .add_buyback_trigger("dip", TriggerCondition::PriceBelow, COIN, 10_000 * COIN)
        .unwrap();
    let bought = treasury
        .check_buyback_triggers(&mut ledger, &cap, COIN / 2, TriggerCondition::PriceBelow)
        .unwrap();
    assert_eq!(bought, 20_000 * COIN);

    // every burned token is attributable to the buyback program
    assert_eq!(treasury.primary_balance(), 20_000 * COIN);
    assert_eq!(treasury.buyback_history().len(), 3);
    assert_eq!(ledger.total_supply(), (10_000_000 - 35_000) * COIN);
    let buyback_burns: u64 = ledger
        .events()
        .iter()
        .filter_map(|e| match e {
            SupplyEvent::Burned {
                amount,
                origin: BurnOrigin::Buyback,
            } => Some(*amount),
            _ => None,
        })
        .sum();
    assert_eq!(buyback_burns, 35_000 * COIN);
}

#[test]
fn test_rescan_after_success_is_harmless() {
    let (mut ledger, cap) = TokenLedger::genesis("reserve", 1_000_000 * COIN, 0, 0).unwrap();
    let mut treasury = Treasury::new("usd", vec!["mn1".to_string()], 1);
    treasury.add_funds("usd", 5_000 * COIN).unwrap();
    treasury.add_scheduled_buyback(100, 1_000 * COIN, COIN).unwrap();
    treasury
        .add_buyback_trigger("dip", TriggerCondition::PriceBelow, 2 * COIN, 1_000 * COIN)
        .unwrap();
    treasury.set_auto_buyback_enabled(true);

    treasury
        .execute_scheduled_buybacks(&mut ledger, &cap, 200, COIN)
        .unwrap();
    treasury
        .check_buyback_triggers(&mut ledger, &cap, COIN, TriggerCondition::PriceBelow)
        .unwrap();
    let supply = ledger.total_supply();
    let spent = treasury.primary_balance();

    // identical re-scans: zero additional effect
    assert_eq!(
        treasury
            .execute_scheduled_buybacks(&mut ledger, &cap, 200, COIN)
            .unwrap(),
        0
    );
    assert_eq!(
        treasury
            .check_buyback_triggers(&mut ledger, &cap, COIN, TriggerCondition::PriceBelow)
            .unwrap(),
        0
    );
    assert_eq!(ledger.total_supply(), supply);
    assert_eq!(treasury.primary_balance(), spent);
    assert_eq!(treasury.buyback_history().len(), 2);
}
