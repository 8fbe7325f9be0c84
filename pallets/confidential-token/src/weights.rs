//! Weights for pallet-confidential-token.

use frame_support::weights::{constants::RocksDbWeight, Weight};

pub trait WeightInfo {
    fn mint() -> Weight;
    fn burn() -> Weight;
    fn confidential_transfer() -> Weight;
    fn confidential_transfer_from() -> Weight;
    fn confidential_transfer_from_with_permit() -> Weight;
    fn incompatible() -> Weight;
}

impl WeightInfo for () {
    // Storage: `Balances` (r:1 w:1), `TotalSupply` (r:1 w:1)
    // Storage: `IndicatedBalance` (r:1 w:1), `IndicatedSupply` (r:1 w:1)
    fn mint() -> Weight {
        Weight::from_parts(40_000_000, 6_000).saturating_add(RocksDbWeight::get().reads_writes(4, 4))
    }
    fn burn() -> Weight {
        Weight::from_parts(42_000_000, 6_000).saturating_add(RocksDbWeight::get().reads_writes(4, 4))
    }
    // Storage: `Balances` (r:2 w:2), `IndicatedBalance` (r:2 w:2)
    fn confidential_transfer() -> Weight {
        Weight::from_parts(48_000_000, 7_000).saturating_add(RocksDbWeight::get().reads_writes(4, 4))
    }
    // + `Operators::Operators` (r:1)
    fn confidential_transfer_from() -> Weight {
        Weight::from_parts(52_000_000, 9_000).saturating_add(RocksDbWeight::get().reads_writes(5, 4))
    }
    // + `Operators::ConsumedPermits` (r:1 w:1), signature check
    fn confidential_transfer_from_with_permit() -> Weight {
        Weight::from_parts(110_000_000, 9_000).saturating_add(RocksDbWeight::get().reads_writes(5, 5))
    }
    fn incompatible() -> Weight {
        Weight::from_parts(5_000_000, 0)
    }
}
