//! Benchmarking setup for pallet-operators

use super::*;
use frame_benchmarking::v2::*;
use frame_system::RawOrigin;

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn set_operator() {
        let caller: T::AccountId = whitelisted_caller();
        let spender: T::AccountId = account("spender", 0, 0);
        let asset = T::AssetId::default();
        let expiry: BlockNumberFor<T> = 100u32.into();

        // Overwriting an existing grant is the heavier path.
        Operators::<T>::insert(
            asset,
            &caller,
            OperatorGrant { spender: account("previous", 0, 0), expiry },
        );

        #[extrinsic_call]
        set_operator(RawOrigin::Signed(caller.clone()), asset, spender.clone(), expiry);

        assert_eq!(Operators::<T>::get(asset, &caller).map(|g| g.spender), Some(spender));
    }

    impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Runtime);
}
