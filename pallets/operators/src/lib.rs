//! **pallet-operators**
//!
//! Delegation registry for confidential tokens. An owner can let a third party move funds
//! out of their encrypted balance in two ways:
//! - a standing **operator grant**: one `(spender, expiry)` slot per (asset, owner), rewritten
//!   by every `set_operator` call and valid while the current block is below `expiry`;
//! - a one shot **transfer permit**: an owner signature over (asset, owner, spender, recipient,
//!   amount commitment, deadline). Each signed message is accepted at most once; its digest is
//!   recorded with its deadline when consumed and dropped by `on_idle` once the deadline
//!   has passed, since the deadline check alone then rejects it.
//!
//! The ledger pallet reads grants through [`OperatorRegistry`] and consumes permits through
//! [`PermitVerifier`]. Neither path writes ledger state here.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use confidential_token_primitives::{
    blake2_256, permit_digest, AuthorizationError, Commitment, OperatorRegistry, PermitVerifier,
    TransferPermit,
};
use frame_support::pallet_prelude::*;
use frame_system::pallet_prelude::*;
use sp_runtime::traits::{IdentifyAccount, Verify, Zero};

pub use pallet::*;
pub use weights::WeightInfo;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;
pub mod weights;

#[cfg(test)]
mod mock;

const LOG_TARGET: &str = "runtime::operators";

/// Permit shape accepted by a runtime using this pallet.
pub type PermitOf<T> = TransferPermit<
    <T as frame_system::Config>::AccountId,
    BlockNumberFor<T>,
    <T as Config>::Signature,
>;

/// Standing grant held for one (asset, owner).
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct OperatorGrant<AccountId, BlockNumber> {
    pub spender: AccountId,
    /// First block in which the grant no longer applies.
    pub expiry: BlockNumber,
}

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// Emit events.
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type AssetId: Parameter + Member + Copy + Ord + Default + MaxEncodedLen + TypeInfo;

        /// Signature owners produce over permit digests.
        type Signature: Verify<Signer = Self::Signer> + Parameter;
        type Signer: IdentifyAccount<AccountId = Self::AccountId>;

        type WeightInfo: WeightInfo;
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// Current grant per (asset, owner). A new grant replaces the old one.
    #[pallet::storage]
    pub type Operators<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AssetId,
        Blake2_128Concat,
        T::AccountId,
        OperatorGrant<T::AccountId, BlockNumberFor<T>>,
        OptionQuery,
    >;

    /// Digests of permits already used, with the permit deadline.
    #[pallet::storage]
    pub type ConsumedPermits<T: Config> =
        StorageMap<_, Identity, [u8; 32], BlockNumberFor<T>, OptionQuery>;

    /// Last digest visited by the pruning scan. `None` restarts from the first entry.
    #[pallet::storage]
    pub type PruneCursor<T: Config> = StorageValue<_, [u8; 32], OptionQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// `owner` let `spender` operate on `asset` until block `expiry`.
        OperatorSet {
            asset: T::AssetId,
            owner: T::AccountId,
            spender: T::AccountId,
            expiry: BlockNumberFor<T>,
        },
        /// A signed permit was used and can not be used again.
        PermitConsumed {
            asset: T::AssetId,
            owner: T::AccountId,
            spender: T::AccountId,
            digest: [u8; 32],
        },
    }

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        fn on_idle(now: BlockNumberFor<T>, remaining_weight: Weight) -> Weight {
            Self::prune_consumed(now, remaining_weight)
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Record `spender` as the single operator for the caller's `asset` balance.
        ///
        /// Overwrites any previous grant. An `expiry` at or below the current block leaves
        /// no valid grant behind, which is how a grant is revoked.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::set_operator())]
        pub fn set_operator(
            origin: OriginFor<T>,
            asset: T::AssetId,
            spender: T::AccountId,
            expiry: BlockNumberFor<T>,
        ) -> DispatchResult {
            let owner = ensure_signed(origin)?;
            Operators::<T>::insert(
                asset,
                &owner,
                OperatorGrant { spender: spender.clone(), expiry },
            );
            log::debug!(
                target: LOG_TARGET,
                "operator set: asset={asset:?} owner={owner:?} spender={spender:?} expiry={expiry:?}",
            );
            Self::deposit_event(Event::OperatorSet { asset, owner, spender, expiry });
            Ok(())
        }
    }
}

impl<T: Config> Pallet<T> {
    /// Grant currently recorded for `owner`, valid or not.
    pub fn operator_of(
        asset: T::AssetId,
        owner: &T::AccountId,
    ) -> Option<OperatorGrant<T::AccountId, BlockNumberFor<T>>> {
        Operators::<T>::get(asset, owner)
    }

    pub fn is_consumed(digest: &[u8; 32]) -> bool {
        ConsumedPermits::<T>::contains_key(digest)
    }

    /// Drops consumed digests whose deadline is at or below `now`, resuming after the
    /// previous scan's last entry. Visits no more entries than `limit` can pay for.
    pub fn prune_consumed(now: BlockNumberFor<T>, limit: Weight) -> Weight {
        let db = T::DbWeight::get();
        let per_entry = db.reads_writes(1, 1);
        let mut used = db.reads_writes(1, 1);
        if limit.any_lt(used) {
            return Weight::zero();
        }

        let cursor = PruneCursor::<T>::get();
        let entries = match cursor {
            Some(last) => {
                ConsumedPermits::<T>::iter_from(ConsumedPermits::<T>::hashed_key_for(last))
            }
            None => ConsumedPermits::<T>::iter(),
        };

        let mut expired = Vec::new();
        let mut last_seen = None;
        let mut finished = true;
        for (digest, deadline) in entries {
            if limit.any_lt(used.saturating_add(per_entry)) {
                finished = false;
                break;
            }
            used.saturating_accrue(per_entry);
            if deadline <= now {
                expired.push(digest);
            }
            last_seen = Some(digest);
        }

        for digest in &expired {
            ConsumedPermits::<T>::remove(digest);
        }
        match (finished, last_seen) {
            (true, _) => PruneCursor::<T>::kill(),
            (false, Some(last)) => PruneCursor::<T>::put(last),
            (false, None) => {}
        }
        if !expired.is_empty() {
            log::debug!(target: LOG_TARGET, "pruned {} consumed permits", expired.len());
        }
        used
    }

    /// Separates permits of this chain from permits signed for any other.
    pub fn permit_domain() -> [u8; 32] {
        let genesis = frame_system::Pallet::<T>::block_hash(BlockNumberFor::<T>::zero());
        blake2_256(&(b"confidential-token", genesis).encode())
    }

    /// Digest an owner signs to authorize one transfer.
    pub fn permit_digest(
        asset: &T::AssetId,
        owner: &T::AccountId,
        spender: &T::AccountId,
        recipient: &T::AccountId,
        value_hash: &Commitment,
        deadline: &BlockNumberFor<T>,
    ) -> [u8; 32] {
        permit_digest(
            &Self::permit_domain(),
            asset,
            owner,
            spender,
            recipient,
            value_hash,
            deadline,
        )
    }
}

impl<T: Config> OperatorRegistry<T::AccountId, T::AssetId, BlockNumberFor<T>> for Pallet<T> {
    fn is_operator(
        holder: &T::AccountId,
        asset: &T::AssetId,
        operator: &T::AccountId,
        now: BlockNumberFor<T>,
    ) -> bool {
        Operators::<T>::get(asset, holder)
            .is_some_and(|grant| &grant.spender == operator && now < grant.expiry)
    }
}

impl<T: Config> PermitVerifier<T::AccountId, T::AssetId> for Pallet<T> {
    type Permit = PermitOf<T>;

    fn consume(
        asset: &T::AssetId,
        caller: &T::AccountId,
        owner: &T::AccountId,
        recipient: &T::AccountId,
        commitment: &Commitment,
        permit: &Self::Permit,
    ) -> Result<(), AuthorizationError> {
        if &permit.owner != owner || &permit.spender != caller || &permit.recipient != recipient {
            return Err(AuthorizationError::UnauthorizedSpender);
        }
        let now = frame_system::Pallet::<T>::block_number();
        if now >= permit.deadline {
            return Err(AuthorizationError::PermitExpired);
        }
        if &permit.value_hash != commitment {
            return Err(AuthorizationError::PermitAmountMismatch);
        }

        let digest = Self::permit_digest(
            asset,
            owner,
            caller,
            recipient,
            &permit.value_hash,
            &permit.deadline,
        );
        if ConsumedPermits::<T>::contains_key(digest) {
            return Err(AuthorizationError::PermitReplayed);
        }
        if !permit.signature.verify(&digest[..], owner) {
            return Err(AuthorizationError::UnauthorizedSpender);
        }

        ConsumedPermits::<T>::insert(digest, permit.deadline);
        log::debug!(
            target: LOG_TARGET,
            "permit consumed: asset={asset:?} owner={owner:?} spender={caller:?}",
        );
        Self::deposit_event(Event::PermitConsumed {
            asset: *asset,
            owner: owner.clone(),
            spender: caller.clone(),
            digest,
        });
        Ok(())
    }
}
