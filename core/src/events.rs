//! Supply events
//!
//! Every change to the token's total supply is observable as an event so the
//! cross-chain bridge and rollup subsystem can attribute it to a specific
//! operation. This core only emits; it never consumes.

use serde::{Deserialize, Serialize};

/// Where a supply-reducing burn originated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BurnOrigin {
    /// Direct privileged burn by the owner capability
    Direct,
    /// A due entry of the on-ledger burn schedule
    Scheduled,
    /// Treasury buyback program (manual, scheduled, or triggered)
    Buyback,
    /// Deflationary fee taken on a transfer
    TransferFee,
}

/// Supply-level event, attributable to one operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SupplyEvent {
    Burned { amount: u64, origin: BurnOrigin },
    Minted { amount: u64 },
    Locked { amount: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_roundtrip() {
        let event = SupplyEvent::Burned {
            amount: 1_000,
            origin: BurnOrigin::Buyback,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SupplyEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
