//! Indicator arithmetic.
//!
//! Public counters live in the ring `[1, TICK_BASE - 1]`. Every ledger mutation moves a
//! counter by a tick derived from the new ciphertext handle, so the public value changes on
//! every mutation without tracking the plaintext. Counter `0` marks a counter that was never
//! moved; the ring formulas take it as input unchanged, which makes a first credit land
//! exactly on the tick.

use crate::{blake2_256, Handle};
use core::marker::PhantomData;
use frame_support::{pallet_prelude::*, traits::Get};

/// Public delta applied to a counter, always in `[1, TICK_BASE - 1]`.
pub type Tick = u16;

pub const TICK_BASE: u16 = 10_000;
/// `log10(TICK_BASE)`
pub const TICK_DIGITS: u8 = 4;

const RING: i32 = TICK_BASE as i32 - 1;

/// Move `counter` forward by `tick`.
pub fn credit(counter: u16, tick: Tick) -> u16 {
    ((i32::from(counter) - 1 + i32::from(tick)).rem_euclid(RING) + 1) as u16
}

/// Move `counter` backward by `tick`.
pub fn debit(counter: u16, tick: Tick) -> u16 {
    ((i32::from(counter) - 1 - i32::from(tick)).rem_euclid(RING) + 1) as u16
}

/// Map a 256 bit digest onto a tick.
pub fn tick_from_digest(digest: &[u8; 32]) -> Tick {
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(word) % RING as u64) as Tick + 1
}

/// Value of one counter step for a token with `decimals`: `10^(decimals - 4)`, at least 1.
pub fn tick_size(decimals: u8) -> u128 {
    let exp = decimals.saturating_sub(TICK_DIGITS);
    10u128.checked_pow(u32::from(exp)).unwrap_or(u128::MAX)
}

/// Displayed decimal value of a counter.
pub fn display(counter: u16, decimals: u8) -> u128 {
    u128::from(counter).saturating_mul(tick_size(decimals))
}

/// Which counter a tick is derived for.
#[derive(Clone, Copy, PartialEq, Eq, Encode, RuntimeDebug)]
pub enum TickDomain {
    Account,
    TotalSupply,
}

/// Source of ticks. Implementations must only look at the handle (never at a plaintext)
/// so an observer cannot reproduce a tick from the amount moved.
pub trait TickDerivation {
    fn derive(domain: TickDomain, handle: &Handle) -> Tick;
}

/// Keyed Blake2b-256 over `(domain, handle)`.
pub struct Blake2Ticks<Key>(PhantomData<Key>);

impl<Key: Get<[u8; 32]>> TickDerivation for Blake2Ticks<Key> {
    fn derive(domain: TickDomain, handle: &Handle) -> Tick {
        let digest = blake2_256(&(b"confidential-token/tick", Key::get(), domain, handle).encode());
        tick_from_digest(&digest)
    }
}
