//! Ciphertext ledger: encrypted balances and supply.
//!
//! Every mutation goes through the backend and yields fresh handles. Nothing here decrypts or
//! branches on an amount. The `ledger_*` functions only compute; callers store the results
//! with `write_balance` / `write_supply` once the whole operation has succeeded.

use super::*;
use confidential_token_primitives::{Debit, ZERO_HANDLE};

impl<T: Config> Pallet<T> {
    /// Encrypted balance handle of `who`, `ZERO_HANDLE` if never written.
    pub fn confidential_balance_of(asset: T::AssetId, who: &T::AccountId) -> Handle {
        Balances::<T>::get(asset, who).unwrap_or(ZERO_HANDLE)
    }

    /// Encrypted supply handle, `ZERO_HANDLE` before the first mint.
    pub fn confidential_total_supply(asset: T::AssetId) -> Handle {
        TotalSupply::<T>::get(asset).unwrap_or(ZERO_HANDLE)
    }

    /// Validate a caller supplied encrypted amount.
    pub(crate) fn accept_input(
        input: &EncryptedInput,
        who: &T::AccountId,
    ) -> Result<Handle, Error<T>> {
        Self::backend("verify_input", T::Backend::verify_input(input, who))
    }

    /// New (balance, supply) handles after minting `amount` to `to`.
    pub(crate) fn ledger_mint(
        asset: T::AssetId,
        to: &T::AccountId,
        amount: T::Balance,
    ) -> Result<(Handle, Handle), Error<T>> {
        let amount = Self::backend("encrypt", T::Backend::encrypt(amount))?;
        let balance = Self::backend(
            "credit",
            T::Backend::credit(&Self::confidential_balance_of(asset, to), &amount),
        )?;
        let supply = Self::backend(
            "credit",
            T::Backend::credit(&Self::confidential_total_supply(asset), &amount),
        )?;
        Self::backend("allow", T::Backend::allow(&balance, to))?;
        Ok((balance, supply))
    }

    /// New (balance, supply) handles after burning `amount` from `from`. Supply drops by what
    /// the backend actually debited.
    pub(crate) fn ledger_burn(
        asset: T::AssetId,
        from: &T::AccountId,
        amount: T::Balance,
    ) -> Result<(Handle, Handle), Error<T>> {
        let amount = Self::backend("encrypt", T::Backend::encrypt(amount))?;
        let Debit { balance, debited } = Self::backend(
            "debit",
            T::Backend::debit(&Self::confidential_balance_of(asset, from), &amount),
        )?;
        let supply = Self::backend(
            "debit",
            T::Backend::debit(&Self::confidential_total_supply(asset), &debited),
        )?
        .balance;
        Self::backend("allow", T::Backend::allow(&balance, from))?;
        Ok((balance, supply))
    }

    /// New (from, to) handles after moving `amount`. `to` receives what was debited.
    pub(crate) fn ledger_transfer(
        asset: T::AssetId,
        from: &T::AccountId,
        to: &T::AccountId,
        amount: &Handle,
    ) -> Result<(Handle, Handle), Error<T>> {
        let Debit { balance: from_balance, debited } = Self::backend(
            "debit",
            T::Backend::debit(&Self::confidential_balance_of(asset, from), amount),
        )?;
        let to_before = if from == to {
            from_balance
        } else {
            Self::confidential_balance_of(asset, to)
        };
        let to_balance = Self::backend("credit", T::Backend::credit(&to_before, &debited))?;

        Self::backend("allow", T::Backend::allow(&from_balance, from))?;
        Self::backend("allow", T::Backend::allow(&to_balance, to))?;
        Ok((from_balance, to_balance))
    }

    pub(crate) fn write_balance(asset: T::AssetId, who: &T::AccountId, handle: Handle) {
        Balances::<T>::insert(asset, who, handle);
    }

    pub(crate) fn write_supply(asset: T::AssetId, handle: Handle) {
        TotalSupply::<T>::insert(asset, handle);
    }

    fn backend<R>(op: &'static str, result: Result<R, DispatchError>) -> Result<R, Error<T>> {
        result.map_err(|err| {
            log::warn!(target: LOG_TARGET, "backend {op} failed: {err:?}");
            Error::<T>::BackendFailure
        })
    }
}
