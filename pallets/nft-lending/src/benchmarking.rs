#![cfg(feature = "runtime-benchmarks")]
use super::*;
use frame_benchmarking::{account, benchmarks, impl_benchmark_test_suite};
use frame_system::RawOrigin;

fn funded_administrator<T: Config>() -> T::AccountId {
	let admin = account::<T::AccountId>("admin", 0, 0);
	Administrator::<T>::put(&admin);
	let _ = T::Currency::make_free_balance_be(&admin, BalanceOf::<T>::from(1_000_000u32));
	admin
}

benchmarks! {
	set_interest_rate {
		let admin = funded_administrator::<T>();
		let rate: BalanceOf<T> = 100u32.into();
	}: _(RawOrigin::Signed(admin), rate)
	verify {
		assert_eq!(InterestRatePerDay::<T>::get(), rate);
	}

	deposit_reserve {
		let admin = funded_administrator::<T>();
		let amount: BalanceOf<T> = 10_000u32.into();
	}: _(RawOrigin::Signed(admin.clone()), amount)
	verify {
		assert_eq!(Reserves::<T>::get(&admin), amount);
	}

	withdraw_reserve {
		let admin = funded_administrator::<T>();
		let amount: BalanceOf<T> = 10_000u32.into();
		Pallet::<T>::deposit_reserve(RawOrigin::Signed(admin.clone()).into(), amount)
			.expect("deposit should not fail");
	}: _(RawOrigin::Signed(admin.clone()), amount)
	verify {
		assert_eq!(Reserves::<T>::get(&admin), Zero::zero());
	}

	transfer_administration {
		let admin = funded_administrator::<T>();
		let successor = account::<T::AccountId>("successor", 0, 0);
	}: _(RawOrigin::Signed(admin), successor.clone())
	verify {
		assert_eq!(Administrator::<T>::get(), Some(successor));
	}
}

impl_benchmark_test_suite!(
	Pallet,
	crate::mock::TestExternalitiesBuilder::default().build(),
	crate::mock::MockRuntime,
);
