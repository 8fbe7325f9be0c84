//! Types and traits for indicator-balance confidential token crates
#![cfg_attr(not(feature = "std"), no_std)]

use blake2::{digest::consts::U32, Blake2b, Digest};
use frame_support::{pallet_prelude::*, BoundedVec};
use parity_scale_codec::DecodeWithMemTracking;
use sp_std::prelude::*;

pub mod indicator;
pub mod permit;

pub use indicator::{Blake2Ticks, Tick, TickDerivation, TickDomain, TICK_BASE};
pub use permit::{permit_digest, AuthorizationError, PermitVerifier, TransferPermit};

/// Opaque reference to a ciphertext held by the encryption backend.
pub type Handle = [u8; 32];
/// Handle of a balance that was never written. Backends read it as encrypted zero.
pub const ZERO_HANDLE: Handle = [0u8; 32];

/// Binding of a permit to one specific encrypted amount.
pub type Commitment = [u8; 32];

/// Proof/aux data blob the backend uses to authenticate an encrypted input.
pub type MaxProofLen = ConstU32<8192>;
pub type InputProof = BoundedVec<u8, MaxProofLen>;

/// Encrypted amount supplied by a caller, validated by the backend on use.
#[derive(
    Clone, PartialEq, Eq, Encode, Decode, DecodeWithMemTracking, RuntimeDebug, TypeInfo, MaxEncodedLen,
)]
pub struct EncryptedInput {
    /// Ciphertext handle registered with the backend.
    pub handle: Handle,
    /// Encrypted type tag (bit width of the plaintext).
    pub utype: u8,
    /// Security domain the ciphertext belongs to.
    pub security_zone: u8,
    /// Authenticity proof over the input.
    pub signature: InputProof,
}

impl EncryptedInput {
    /// Commitment a permit must carry to authorize moving this input.
    /// The proof blob is not part of it.
    pub fn commitment(&self) -> Commitment {
        blake2_256(&(self.handle, self.utype, self.security_zone).encode())
    }
}

/// Result of a homomorphic debit.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub struct Debit {
    /// New balance handle after the debit.
    pub balance: Handle,
    /// Handle of the amount actually removed.
    pub debited: Handle,
}

/// Homomorphic encryption backend holding the plaintexts behind every handle.
///
/// Every operation returns a fresh handle; handles are never mutated in place.
pub trait ConfidentialBackend<AccountId, Balance> {
    /// Trivially encrypt a public amount (mint/burn).
    fn encrypt(amount: Balance) -> Result<Handle, DispatchError>;

    /// Validate an externally produced encrypted input submitted by `who`.
    fn verify_input(input: &EncryptedInput, who: &AccountId) -> Result<Handle, DispatchError>;

    /// `balance + amount`
    fn credit(balance: &Handle, amount: &Handle) -> Result<Handle, DispatchError>;

    /// `balance - amount`. How an insufficient balance is handled is up to the backend
    /// and is reported through `Debit::debited`.
    fn debit(balance: &Handle, amount: &Handle) -> Result<Debit, DispatchError>;

    /// Grant `who` the right to decrypt `handle`.
    fn allow(handle: &Handle, who: &AccountId) -> Result<(), DispatchError>;
}

/// Metadata provider per asset (names, symbols, etc.).
pub trait AssetMetadataProvider<AssetId> {
    fn name(asset: AssetId) -> Vec<u8>;
    fn symbol(asset: AssetId) -> Vec<u8>;
    fn decimals(asset: AssetId) -> u8;
}

impl<AssetId> AssetMetadataProvider<AssetId> for () {
    fn name(_: AssetId) -> Vec<u8> {
        Vec::new()
    }
    fn symbol(_: AssetId) -> Vec<u8> {
        Vec::new()
    }
    fn decimals(_: AssetId) -> u8 {
        0
    }
}

// Operator

pub trait OperatorRegistry<AccountId, AssetId, BlockNumber> {
    /// Return true if `operator` is currently authorized to operate for (`holder`, `asset`) at `now`.
    fn is_operator(
        holder: &AccountId,
        asset: &AssetId,
        operator: &AccountId,
        now: BlockNumber,
    ) -> bool;
}

impl<AccountId, AssetId, BlockNumber> OperatorRegistry<AccountId, AssetId, BlockNumber> for () {
    fn is_operator(
        _holder: &AccountId,
        _asset: &AssetId,
        _operator: &AccountId,
        _now: BlockNumber,
    ) -> bool {
        false
    }
}

// Helpers

/// The reserved "no account" identity: every encoded byte is zero.
pub fn is_null_account<AccountId: Encode>(who: &AccountId) -> bool {
    who.using_encoded(|bytes| bytes.iter().all(|b| *b == 0))
}

/// Blake2b with a 256 bit output.
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
