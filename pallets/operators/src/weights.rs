//! Weights for pallet-operators.

use frame_support::weights::{constants::RocksDbWeight, Weight};

pub trait WeightInfo {
    fn set_operator() -> Weight;
}

impl WeightInfo for () {
    // Storage: `Operators::Operators` (r:0 w:1)
    fn set_operator() -> Weight {
        Weight::from_parts(12_000_000, 3_500).saturating_add(RocksDbWeight::get().writes(1))
    }
}
