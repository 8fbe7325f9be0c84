//! **pallet-confidential-token**
//!
//! Multi-asset token ledger whose balances and supply exist only as ciphertext handles of an
//! external homomorphic encryption backend, fronted by an ERC20 shaped surface.
//!
//! Every balance change moves a public *indicator* counter by a tick derived from the new
//! ciphertext handle. The tick is what the `Transfer` event reports and the counter is what
//! `balance_of` / `total_supply` display, so explorers see every change happen without learning
//! how much moved.
//!
//! Entry points:
//! - `mint` / `burn`: issuer-only, plaintext amount encrypted by the backend;
//! - `confidential_transfer`: caller moves an encrypted input to `to`;
//! - `confidential_transfer_from`: operator moves an owner's funds (see `pallet-operators`);
//! - `confidential_transfer_from_with_permit`: spender presents a one shot owner permit;
//! - `transfer` / `transfer_from` / `approve` (and the `allowance` read): plaintext ERC20
//!   entry points, always rejected with `IncompatibleFunction`.
//!
//! Reads:
//! - `balance_of`, `total_supply`: displayed indicator value (`counter * tick_size`);
//! - `confidential_balance_of`, `confidential_total_supply`: raw handles;
//! - `is_confidential_token`, `balance_of_is_indicator`, `tick_size`, metadata.
//!
//! Guards and authorization run before the backend is touched. Ledger storage is written only
//! after every backend call of the operation has returned.

#![cfg_attr(not(feature = "std"), no_std)]

use confidential_token_primitives::{
    is_null_account, AssetMetadataProvider, AuthorizationError, ConfidentialBackend,
    EncryptedInput, Handle, OperatorRegistry, PermitVerifier, Tick, TickDerivation, TickDomain,
    TICK_BASE,
};
use frame_support::pallet_prelude::*;
use frame_system::pallet_prelude::*;
use sp_std::prelude::*;

pub use pallet::*;
pub use weights::WeightInfo;

mod indicator;
mod ledger;
pub mod weights;

use indicator::Direction;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;


pub(crate) const LOG_TARGET: &str = "runtime::confidential-token";

/// Permit type accepted by `confidential_transfer_from_with_permit`.
pub type PermitOf<T> = <<T as Config>::Permits as PermitVerifier<
    <T as frame_system::Config>::AccountId,
    <T as Config>::AssetId,
>>::Permit;

/// Produces valid backend inputs and grants for benchmarks.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, AssetId, Balance, Permit> {
    /// An input `who` can submit that encrypts `amount`.
    fn encrypted_input(amount: Balance, who: &AccountId) -> EncryptedInput;
    /// Make `spender` a valid operator of `owner`.
    fn grant_operator(asset: AssetId, owner: &AccountId, spender: &AccountId);
    /// An unexpired permit from `owner` for moving `input` to `recipient`.
    fn permit(
        asset: AssetId,
        owner: &AccountId,
        spender: &AccountId,
        recipient: &AccountId,
        input: &EncryptedInput,
    ) -> Permit;
}

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// Emit events.
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type AssetId: Parameter + Member + Copy + Ord + Default + MaxEncodedLen + TypeInfo;
        type Balance: Parameter + Member + Copy + Default + MaxEncodedLen + TypeInfo;

        /// Homomorphic encryption backend holding the plaintexts.
        type Backend: ConfidentialBackend<Self::AccountId, Self::Balance>;

        /// Maps new ciphertext handles to indicator ticks.
        type Ticks: TickDerivation;

        /// Standing delegations checked by `confidential_transfer_from`.
        type Operators: OperatorRegistry<Self::AccountId, Self::AssetId, BlockNumberFor<Self>>;

        /// One shot delegations consumed by `confidential_transfer_from_with_permit`.
        type Permits: PermitVerifier<Self::AccountId, Self::AssetId>;

        /// Name, symbol and decimals. Decimals set the displayed tick size.
        type AssetMetadata: AssetMetadataProvider<Self::AssetId>;

        /// Origin allowed to mint and burn.
        type IssuerOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        type WeightInfo: WeightInfo;

        #[cfg(feature = "runtime-benchmarks")]
        type BenchmarkHelper: BenchmarkHelper<
            Self::AccountId,
            Self::AssetId,
            Self::Balance,
            PermitOf<Self>,
        >;
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ------------------------------ Ciphertext ledger ------------------------------

    /// Encrypted balance handle per (asset, account).
    #[pallet::storage]
    pub type Balances<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AssetId,
        Blake2_128Concat,
        T::AccountId,
        Handle,
        OptionQuery,
    >;

    /// Encrypted total supply handle per asset.
    #[pallet::storage]
    pub type TotalSupply<T: Config> = StorageMap<_, Blake2_128Concat, T::AssetId, Handle, OptionQuery>;

    // ------------------------------ Indicator counters -----------------------------

    /// Public counter per (asset, account), in `[1, TICK_BASE - 1]` once touched. 0 = untouched.
    #[pallet::storage]
    pub type IndicatedBalance<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AssetId,
        Blake2_128Concat,
        T::AccountId,
        u16,
        ValueQuery,
    >;

    /// Public supply counter per asset, same range as `IndicatedBalance`.
    #[pallet::storage]
    pub type IndicatedSupply<T: Config> = StorageMap<_, Blake2_128Concat, T::AssetId, u16, ValueQuery>;

    #[pallet::extra_constants]
    impl<T: Config> Pallet<T> {
        /// Indicator counters wrap within `[1, TickBase - 1]`.
        #[pallet::constant_name(TickBase)]
        fn tick_base() -> u16 {
            TICK_BASE
        }
    }

    // ------------------------------ Events / Errors --------------------------------

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// A balance changed. `None` stands for the null account (mint source, burn
        /// destination). `amount` is the indicator tick, never the real amount.
        Transfer {
            asset: T::AssetId,
            from: Option<T::AccountId>,
            to: Option<T::AccountId>,
            amount: Tick,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Recipient is the null account.
        InvalidReceiver,
        /// Source is the null account.
        InvalidSender,
        /// Caller holds no valid grant or permit for the owner.
        UnauthorizedSpender,
        /// Permit deadline has passed.
        PermitExpired,
        /// Permit was already used.
        PermitReplayed,
        /// Permit covers a different encrypted amount.
        PermitAmountMismatch,
        /// Plaintext amounts are not supported by a confidential token.
        IncompatibleFunction,
        /// The encryption backend did not produce a valid handle.
        BackendFailure,
    }

    impl<T> From<AuthorizationError> for Error<T> {
        fn from(err: AuthorizationError) -> Self {
            match err {
                AuthorizationError::UnauthorizedSpender => Error::<T>::UnauthorizedSpender,
                AuthorizationError::PermitExpired => Error::<T>::PermitExpired,
                AuthorizationError::PermitReplayed => Error::<T>::PermitReplayed,
                AuthorizationError::PermitAmountMismatch => Error::<T>::PermitAmountMismatch,
            }
        }
    }

    // ------------------------------ Calls ------------------------------------------

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Create `amount` new tokens in `to`'s encrypted balance.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::mint())]
        pub fn mint(
            origin: OriginFor<T>,
            asset: T::AssetId,
            to: T::AccountId,
            amount: T::Balance,
        ) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            ensure!(!is_null_account(&to), Error::<T>::InvalidReceiver);

            let tick = Self::do_mint(asset, &to, amount)?;
            Self::deposit_event(Event::Transfer { asset, from: None, to: Some(to), amount: tick });
            Ok(())
        }

        /// Destroy up to `amount` tokens of `from`. How a short balance is handled is decided
        /// by the backend.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::burn())]
        pub fn burn(
            origin: OriginFor<T>,
            asset: T::AssetId,
            from: T::AccountId,
            amount: T::Balance,
        ) -> DispatchResult {
            T::IssuerOrigin::ensure_origin(origin)?;
            ensure!(!is_null_account(&from), Error::<T>::InvalidSender);

            let tick = Self::do_burn(asset, &from, amount)?;
            Self::deposit_event(Event::Transfer { asset, from: Some(from), to: None, amount: tick });
            Ok(())
        }

        /// Move the encrypted `input` amount from the caller to `to`.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::confidential_transfer())]
        pub fn confidential_transfer(
            origin: OriginFor<T>,
            asset: T::AssetId,
            to: T::AccountId,
            input: EncryptedInput,
        ) -> DispatchResult {
            let from = ensure_signed(origin)?;
            Self::ensure_parties(&from, &to)?;

            let amount = Self::accept_input(&input, &from)?;
            Self::transfer_and_emit(asset, from, to, &amount)
        }

        /// Move the encrypted `input` amount from `owner` to `to` as `owner`'s operator.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::confidential_transfer_from())]
        pub fn confidential_transfer_from(
            origin: OriginFor<T>,
            asset: T::AssetId,
            owner: T::AccountId,
            to: T::AccountId,
            input: EncryptedInput,
        ) -> DispatchResult {
            let spender = ensure_signed(origin)?;
            Self::ensure_parties(&owner, &to)?;

            let now = frame_system::Pallet::<T>::block_number();
            ensure!(
                T::Operators::is_operator(&owner, &asset, &spender, now),
                Error::<T>::UnauthorizedSpender
            );

            let amount = Self::accept_input(&input, &spender)?;
            Self::transfer_and_emit(asset, owner, to, &amount)
        }

        /// Move the encrypted `input` amount from `owner` to `to` under an owner-signed permit.
        /// No operator grant is needed. The permit is spent by this call.
        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::confidential_transfer_from_with_permit())]
        pub fn confidential_transfer_from_with_permit(
            origin: OriginFor<T>,
            asset: T::AssetId,
            owner: T::AccountId,
            to: T::AccountId,
            input: EncryptedInput,
            permit: PermitOf<T>,
        ) -> DispatchResult {
            let spender = ensure_signed(origin)?;
            Self::ensure_parties(&owner, &to)?;

            T::Permits::consume(&asset, &spender, &owner, &to, &input.commitment(), &permit)
                .map_err(Error::<T>::from)?;

            let amount = Self::accept_input(&input, &spender)?;
            Self::transfer_and_emit(asset, owner, to, &amount)
        }

        /// Plaintext ERC20 transfer. Always fails.
        #[pallet::call_index(5)]
        #[pallet::weight(T::WeightInfo::incompatible())]
        pub fn transfer(
            origin: OriginFor<T>,
            _asset: T::AssetId,
            _to: T::AccountId,
            _amount: T::Balance,
        ) -> DispatchResult {
            ensure_signed(origin)?;
            Err(Error::<T>::IncompatibleFunction.into())
        }

        /// Plaintext ERC20 transfer-from. Always fails.
        #[pallet::call_index(6)]
        #[pallet::weight(T::WeightInfo::incompatible())]
        pub fn transfer_from(
            origin: OriginFor<T>,
            _asset: T::AssetId,
            _from: T::AccountId,
            _to: T::AccountId,
            _amount: T::Balance,
        ) -> DispatchResult {
            ensure_signed(origin)?;
            Err(Error::<T>::IncompatibleFunction.into())
        }

        /// Plaintext ERC20 approval. Always fails.
        #[pallet::call_index(7)]
        #[pallet::weight(T::WeightInfo::incompatible())]
        pub fn approve(
            origin: OriginFor<T>,
            _asset: T::AssetId,
            _spender: T::AccountId,
            _amount: T::Balance,
        ) -> DispatchResult {
            ensure_signed(origin)?;
            Err(Error::<T>::IncompatibleFunction.into())
        }
    }
}

// ------------------------------ Operations ------------------------------------------

impl<T: Config> Pallet<T> {
    fn ensure_parties(from: &T::AccountId, to: &T::AccountId) -> DispatchResult {
        ensure!(!is_null_account(from), Error::<T>::InvalidSender);
        ensure!(!is_null_account(to), Error::<T>::InvalidReceiver);
        Ok(())
    }

    /// Returns the account tick reported by the event.
    pub(crate) fn do_mint(
        asset: T::AssetId,
        to: &T::AccountId,
        amount: T::Balance,
    ) -> Result<Tick, DispatchError> {
        let (balance, supply) = Self::ledger_mint(asset, to, amount)?;

        let account = Self::indicator_step(
            IndicatedBalance::<T>::get(asset, to),
            TickDomain::Account,
            &balance,
            Direction::Credit,
        );
        let total = Self::indicator_step(
            IndicatedSupply::<T>::get(asset),
            TickDomain::TotalSupply,
            &supply,
            Direction::Credit,
        );

        Self::write_balance(asset, to, balance);
        Self::write_supply(asset, supply);
        IndicatedBalance::<T>::insert(asset, to, account.counter);
        IndicatedSupply::<T>::insert(asset, total.counter);

        log::debug!(
            target: LOG_TARGET,
            "mint: asset={asset:?} to={to:?} tick={} supply_tick={}",
            account.tick,
            total.tick,
        );
        Ok(account.tick)
    }

    /// Returns the account tick reported by the event.
    pub(crate) fn do_burn(
        asset: T::AssetId,
        from: &T::AccountId,
        amount: T::Balance,
    ) -> Result<Tick, DispatchError> {
        let (balance, supply) = Self::ledger_burn(asset, from, amount)?;

        let account = Self::indicator_step(
            IndicatedBalance::<T>::get(asset, from),
            TickDomain::Account,
            &balance,
            Direction::Debit,
        );
        let total = Self::indicator_step(
            IndicatedSupply::<T>::get(asset),
            TickDomain::TotalSupply,
            &supply,
            Direction::Debit,
        );

        Self::write_balance(asset, from, balance);
        Self::write_supply(asset, supply);
        IndicatedBalance::<T>::insert(asset, from, account.counter);
        IndicatedSupply::<T>::insert(asset, total.counter);

        log::debug!(
            target: LOG_TARGET,
            "burn: asset={asset:?} from={from:?} tick={} supply_tick={}",
            account.tick,
            total.tick,
        );
        Ok(account.tick)
    }

    /// Debit `from`, credit `to`, move both counters. Returns the credit side tick.
    pub(crate) fn do_transfer(
        asset: T::AssetId,
        from: &T::AccountId,
        to: &T::AccountId,
        amount: &Handle,
    ) -> Result<Tick, DispatchError> {
        let (from_balance, to_balance) = Self::ledger_transfer(asset, from, to, amount)?;

        let debited = Self::indicator_step(
            IndicatedBalance::<T>::get(asset, from),
            TickDomain::Account,
            &from_balance,
            Direction::Debit,
        );
        // a self transfer credits the counter it just debited
        let to_counter = if from == to {
            debited.counter
        } else {
            IndicatedBalance::<T>::get(asset, to)
        };
        let credited =
            Self::indicator_step(to_counter, TickDomain::Account, &to_balance, Direction::Credit);

        Self::write_balance(asset, from, from_balance);
        Self::write_balance(asset, to, to_balance);
        IndicatedBalance::<T>::insert(asset, from, debited.counter);
        IndicatedBalance::<T>::insert(asset, to, credited.counter);

        log::debug!(
            target: LOG_TARGET,
            "transfer: asset={asset:?} from={from:?} to={to:?} ticks=-{}/+{}",
            debited.tick,
            credited.tick,
        );
        Ok(credited.tick)
    }

    fn transfer_and_emit(
        asset: T::AssetId,
        from: T::AccountId,
        to: T::AccountId,
        amount: &Handle,
    ) -> DispatchResult {
        let tick = Self::do_transfer(asset, &from, &to, amount)?;
        Self::deposit_event(Event::Transfer { asset, from: Some(from), to: Some(to), amount: tick });
        Ok(())
    }

    // ------------------------------ Reads ------------------------------------------

    /// Capability marker for composing contracts.
    pub fn is_confidential_token() -> bool {
        true
    }

    /// `balance_of` reports an indicator, not a balance.
    pub fn balance_of_is_indicator() -> bool {
        true
    }

    /// Plaintext allowances do not exist.
    pub fn allowance(
        _asset: T::AssetId,
        _owner: &T::AccountId,
        _spender: &T::AccountId,
    ) -> Result<T::Balance, DispatchError> {
        Err(Error::<T>::IncompatibleFunction.into())
    }

    // Names avoid clashing with FRAME's `name()`
    pub fn asset_name(asset: T::AssetId) -> Vec<u8> {
        T::AssetMetadata::name(asset)
    }
    pub fn asset_symbol(asset: T::AssetId) -> Vec<u8> {
        T::AssetMetadata::symbol(asset)
    }
    pub fn asset_decimals(asset: T::AssetId) -> u8 {
        T::AssetMetadata::decimals(asset)
    }
}
