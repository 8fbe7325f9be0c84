//! Delegated transfer authorization types.

use crate::{blake2_256, Commitment};
use frame_support::pallet_prelude::*;
use parity_scale_codec::DecodeWithMemTracking;

/// Structured type string the permit typehash is derived from.
pub const PERMIT_TYPE: &[u8] = b"TransferPermit(AssetId asset,AccountId owner,AccountId spender,AccountId recipient,bytes32 valueHash,BlockNumber deadline)";

/// Why a delegated transfer was refused.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub enum AuthorizationError {
    UnauthorizedSpender,
    PermitExpired,
    PermitReplayed,
    PermitAmountMismatch,
}

/// Owner-signed, single use authorization to move one specific encrypted amount.
#[derive(Clone, PartialEq, Eq, Encode, Decode, DecodeWithMemTracking, RuntimeDebug, TypeInfo)]
pub struct TransferPermit<AccountId, BlockNumber, Signature> {
    pub owner: AccountId,
    pub spender: AccountId,
    pub recipient: AccountId,
    /// `EncryptedInput::commitment` of the amount this permit covers.
    pub value_hash: Commitment,
    /// Last block (exclusive) the permit can be used in.
    pub deadline: BlockNumber,
    /// Owner signature over `permit_digest`.
    pub signature: Signature,
}

/// Message the owner signs.
///
/// `domain` ties signatures to one chain and deployment.
pub fn permit_digest<AccountId: Encode, AssetId: Encode, BlockNumber: Encode>(
    domain: &[u8; 32],
    asset: &AssetId,
    owner: &AccountId,
    spender: &AccountId,
    recipient: &AccountId,
    value_hash: &Commitment,
    deadline: &BlockNumber,
) -> [u8; 32] {
    let typehash = blake2_256(PERMIT_TYPE);
    blake2_256(&(typehash, domain, asset, owner, spender, recipient, value_hash, deadline).encode())
}

/// Checks and consumes signed permits.
pub trait PermitVerifier<AccountId, AssetId> {
    type Permit: Parameter;

    /// Accept `permit` for `caller` moving `commitment` from `owner` to `recipient`.
    /// On success the permit can never be accepted again.
    fn consume(
        asset: &AssetId,
        caller: &AccountId,
        owner: &AccountId,
        recipient: &AccountId,
        commitment: &Commitment,
        permit: &Self::Permit,
    ) -> Result<(), AuthorizationError>;
}

impl<AccountId, AssetId> PermitVerifier<AccountId, AssetId> for () {
    type Permit = ();

    fn consume(
        _asset: &AssetId,
        _caller: &AccountId,
        _owner: &AccountId,
        _recipient: &AccountId,
        _commitment: &Commitment,
        _permit: &Self::Permit,
    ) -> Result<(), AuthorizationError> {
        Err(AuthorizationError::UnauthorizedSpender)
    }
}
