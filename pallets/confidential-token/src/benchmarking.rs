//! Benchmarking setup for pallet-confidential-token

use super::*;
use frame_benchmarking::v2::*;
use frame_system::RawOrigin;

/// Give `who` a balance so debits have something to work on.
fn fund<T: Config>(asset: T::AssetId, who: &T::AccountId) {
    Pallet::<T>::do_mint(asset, who, T::Balance::default()).expect("backend available");
}

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn mint() -> Result<(), BenchmarkError> {
        let origin =
            T::IssuerOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let to: T::AccountId = account("recipient", 0, 0);
        let asset = T::AssetId::default();
        fund::<T>(asset, &to);

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, asset, to.clone(), T::Balance::default());

        assert!(Balances::<T>::contains_key(asset, &to));
        Ok(())
    }

    #[benchmark]
    fn burn() -> Result<(), BenchmarkError> {
        let origin =
            T::IssuerOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let from: T::AccountId = account("holder", 0, 0);
        let asset = T::AssetId::default();
        fund::<T>(asset, &from);
        let before = Pallet::<T>::confidential_balance_of(asset, &from);

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, asset, from.clone(), T::Balance::default());

        assert_ne!(Pallet::<T>::confidential_balance_of(asset, &from), before);
        Ok(())
    }

    #[benchmark]
    fn confidential_transfer() {
        let caller: T::AccountId = whitelisted_caller();
        let recipient: T::AccountId = account("recipient", 0, 0);
        let asset = T::AssetId::default();
        fund::<T>(asset, &caller);
        fund::<T>(asset, &recipient);
        let input = T::BenchmarkHelper::encrypted_input(T::Balance::default(), &caller);

        #[extrinsic_call]
        _(RawOrigin::Signed(caller.clone()), asset, recipient.clone(), input);

        assert!(Balances::<T>::contains_key(asset, &recipient));
    }

    #[benchmark]
    fn confidential_transfer_from() {
        let spender: T::AccountId = whitelisted_caller();
        let owner: T::AccountId = account("owner", 0, 0);
        let recipient: T::AccountId = account("recipient", 0, 0);
        let asset = T::AssetId::default();
        fund::<T>(asset, &owner);
        fund::<T>(asset, &recipient);
        T::BenchmarkHelper::grant_operator(asset, &owner, &spender);
        let input = T::BenchmarkHelper::encrypted_input(T::Balance::default(), &spender);

        #[extrinsic_call]
        _(RawOrigin::Signed(spender), asset, owner, recipient.clone(), input);

        assert!(Balances::<T>::contains_key(asset, &recipient));
    }

    #[benchmark]
    fn confidential_transfer_from_with_permit() {
        let spender: T::AccountId = whitelisted_caller();
        let owner: T::AccountId = account("owner", 0, 0);
        let recipient: T::AccountId = account("recipient", 0, 0);
        let asset = T::AssetId::default();
        fund::<T>(asset, &owner);
        fund::<T>(asset, &recipient);
        let input = T::BenchmarkHelper::encrypted_input(T::Balance::default(), &spender);
        let permit = T::BenchmarkHelper::permit(asset, &owner, &spender, &recipient, &input);

        #[extrinsic_call]
        _(RawOrigin::Signed(spender), asset, owner, recipient.clone(), input, permit);

        assert!(Balances::<T>::contains_key(asset, &recipient));
    }

    #[benchmark]
    fn incompatible() {
        let caller: T::AccountId = whitelisted_caller();
        let to: T::AccountId = account("recipient", 0, 0);

        #[block]
        {
            let result = Pallet::<T>::transfer(
                RawOrigin::Signed(caller).into(),
                T::AssetId::default(),
                to,
                T::Balance::default(),
            );
            assert!(result.is_err());
        }
    }

    impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Runtime);
}
