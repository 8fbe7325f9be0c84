//! Indicator counters: the public face of every balance.

use super::*;
use confidential_token_primitives::indicator as ring;

#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub(crate) enum Direction {
    Credit,
    Debit,
}

/// A counter move derived from one new handle.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub(crate) struct Step {
    pub tick: Tick,
    pub counter: u16,
}

impl<T: Config> Pallet<T> {
    /// Move `current` by the tick `handle` derives to in `domain`.
    pub(crate) fn indicator_step(
        current: u16,
        domain: TickDomain,
        handle: &Handle,
        direction: Direction,
    ) -> Step {
        let tick = T::Ticks::derive(domain, handle);
        let counter = match direction {
            Direction::Credit => ring::credit(current, tick),
            Direction::Debit => ring::debit(current, tick),
        };
        Step { tick, counter }
    }

    pub fn indicated_balance(asset: T::AssetId, who: &T::AccountId) -> u16 {
        IndicatedBalance::<T>::get(asset, who)
    }

    pub fn indicated_supply(asset: T::AssetId) -> u16 {
        IndicatedSupply::<T>::get(asset)
    }

    /// Displayed value of one counter step.
    pub fn tick_size(asset: T::AssetId) -> u128 {
        ring::tick_size(T::AssetMetadata::decimals(asset))
    }

    /// Displayed balance: counter times tick size. Not the real balance.
    pub fn balance_of(asset: T::AssetId, who: &T::AccountId) -> u128 {
        ring::display(Self::indicated_balance(asset, who), T::AssetMetadata::decimals(asset))
    }

    /// Displayed supply: counter times tick size. Not the real supply.
    pub fn total_supply(asset: T::AssetId) -> u128 {
        ring::display(Self::indicated_supply(asset), T::AssetMetadata::decimals(asset))
    }

    /// Tick the current balance handle of `who` derives to, i.e. the credit tick of the last
    /// operation that left `who` with this handle.
    pub fn account_tick(asset: T::AssetId, who: &T::AccountId) -> Option<Tick> {
        Balances::<T>::get(asset, who).map(|handle| T::Ticks::derive(TickDomain::Account, &handle))
    }
}
