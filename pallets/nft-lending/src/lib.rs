//! # NFT lending pallet for runtime
//!
//! This pallet provides functionality for extending currency loans against
//! non-fungible collateral held in an external custody service.
//!
//! To open a loan, the administrator calls `create_loan` for a borrower who
//! owns the collateral and has authorised the engine to take custody of it.
//! The engine locks the collateral, disburses the principal and records the
//! loan against the interest rate configured at that moment.
//!
//! To settle a loan, anyone calls `repay_loan` tendering at least the total
//! amount due; the overpayment is refunded, the collateral returns to the
//! borrower and the loan record is deleted. Loan ids are never reused.
//!
//! When the collateral's market price no longer covers the debt, the
//! administrator calls `liquidate_loan` and keeps the collateral in lieu of
//! repayment.
//!
//! All registry mutations commit before any external transfer is issued and
//! every mutating entry point is guarded against reentrant invocation, so a
//! hostile custody or currency implementation can never observe or leave a
//! half-updated registry.
#![cfg_attr(not(feature = "std"), no_std)]
use common_traits::NonFungibleCustody;
use frame_support::dispatch::DispatchResult;
use frame_support::ensure;
use frame_support::traits::{Currency, ExistenceRequirement, Get, Time};
use frame_support::transactional;

use sp_runtime::traits::{AccountIdConversion, CheckedAdd, One, Zero};
use sp_runtime::DispatchError;
use sp_std::convert::TryInto;
use sp_std::vec::Vec;

pub use pallet::*;

#[cfg(test)]
mod mock;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod math;
pub mod types;
pub mod weights;

pub use types::{Asset, LoanData};
pub use weights::WeightInfo;

pub type AccountIdOf<T> = <T as frame_system::Config>::AccountId;
pub type BalanceOf<T> =
	<<T as Config>::Currency as Currency<AccountIdOf<T>>>::Balance;
pub type AssetOf<T> = Asset<<T as Config>::ClassId, <T as Config>::InstanceId>;
pub type LoanDataOf<T> =
	LoanData<AccountIdOf<T>, <T as Config>::ClassId, <T as Config>::InstanceId, BalanceOf<T>>;

#[frame_support::pallet]
pub mod pallet {
	// Import various types used to declare pallet in scope.
	use super::*;
	use frame_support::pallet_prelude::*;
	use frame_support::PalletId;
	use frame_system::pallet_prelude::*;
	use sp_runtime::traits::AtLeast32BitUnsigned;

	#[pallet::pallet]
	#[pallet::generate_store(pub (super) trait Store)]
	pub struct Pallet<T>(_);

	#[pallet::config]
	pub trait Config: frame_system::Config {
		/// The overarching event type.
		type Event: From<Event<Self>> + IsType<<Self as frame_system::Config>::Event>;

		/// The loan identifier type.
		type LoanId: Parameter
			+ Member
			+ MaybeSerializeDeserialize
			+ AtLeast32BitUnsigned
			+ Copy
			+ Default;

		/// The collateral class id type.
		type ClassId: Parameter + Member + MaybeSerializeDeserialize + Copy + Default;

		/// The collateral instance id type.
		type InstanceId: Parameter + Member + MaybeSerializeDeserialize + Copy + Default;

		/// The custody service that holds collateral assets and can
		/// transfer them on the engine's behalf.
		type Custody: NonFungibleCustody<AssetOf<Self>, AccountIdOf<Self>>;

		/// The currency loans are denominated in.
		type Currency: Currency<Self::AccountId>;

		/// A way for us to fetch the time of the current block, in seconds.
		type Time: frame_support::traits::Time;

		/// PalletID of this lending module.
		#[pallet::constant]
		type PalletId: Get<PalletId>;

		/// Type representing the weight of this pallet.
		type WeightInfo: WeightInfo;
	}

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {}

	/// Stores the loan info for a given loan id. A missing entry means the
	/// loan was repaid, liquidated or never created.
	#[pallet::storage]
	#[pallet::getter(fn get_loan)]
	pub(super) type Loans<T: Config> =
		StorageMap<_, Blake2_128Concat, T::LoanId, LoanDataOf<T>, OptionQuery>;

	#[pallet::type_value]
	pub fn OnNextLoanIdEmpty<T: Config>() -> T::LoanId {
		// always start the loan ID from 1 instead of zero
		One::one()
	}

	/// Stores the next loan id to be assigned. Only ever incremented;
	/// closed loan ids are never handed out again.
	#[pallet::storage]
	#[pallet::getter(fn next_loan_id)]
	pub(super) type NextLoanId<T: Config> =
		StorageValue<_, T::LoanId, ValueQuery, OnNextLoanIdEmpty<T>>;

	/// Stores the ids of a borrower's open loans.
	///
	/// The order of ids is not meaningful: removal swaps the target with
	/// the last element before shrinking, so callers must not rely on it.
	#[pallet::storage]
	#[pallet::getter(fn loans_of)]
	pub(super) type BorrowerLoans<T: Config> =
		StorageMap<_, Blake2_128Concat, T::AccountId, Vec<T::LoanId>, ValueQuery>;

	/// Stores the ids of all open loans, in no meaningful order.
	#[pallet::storage]
	#[pallet::getter(fn active_loans)]
	pub(super) type ActiveLoans<T: Config> = StorageValue<_, Vec<T::LoanId>, ValueQuery>;

	/// Stores the operating currency each administrator identity has
	/// deposited and not yet withdrawn. Orthogonal to loan accounting.
	#[pallet::storage]
	#[pallet::getter(fn reserve_of)]
	pub(super) type Reserves<T: Config> =
		StorageMap<_, Blake2_128Concat, T::AccountId, BalanceOf<T>, ValueQuery>;

	/// Stores the rate applied to loans created from now on. Existing
	/// loans keep the rate they were created with.
	#[pallet::storage]
	#[pallet::getter(fn interest_rate_per_day)]
	pub(super) type InterestRatePerDay<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

	/// Stores the account allowed to create and liquidate loans and to
	/// manage the reserve.
	#[pallet::storage]
	#[pallet::getter(fn administrator)]
	pub(super) type Administrator<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

	/// Set while a mutating entry point is executing. Any nested call into
	/// a guarded entry point while this is set is rejected.
	#[pallet::storage]
	pub(super) type EngineLocked<T: Config> = StorageValue<_, bool, ValueQuery>;

	// The genesis config type.
	#[pallet::genesis_config]
	pub struct GenesisConfig<T: Config> {
		pub administrator: Option<T::AccountId>,
		pub interest_rate_per_day: BalanceOf<T>,
	}

	// The default value for the genesis config type.
	#[cfg(feature = "std")]
	impl<T: Config> Default for GenesisConfig<T> {
		fn default() -> Self {
			Self {
				administrator: None,
				interest_rate_per_day: Zero::zero(),
			}
		}
	}

	// The build of genesis for the pallet.
	#[pallet::genesis_build]
	impl<T: Config> GenesisBuild<T> for GenesisConfig<T> {
		fn build(&self) {
			if let Some(administrator) = &self.administrator {
				<Administrator<T>>::put(administrator);
			}
			<InterestRatePerDay<T>>::put(self.interest_rate_per_day);
		}
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		/// emits when a new loan is created. \[loan_id, borrower, collateral, principal, rate_per_day\]
		LoanCreated(T::LoanId, T::AccountId, AssetOf<T>, BalanceOf<T>, BalanceOf<T>),

		/// emits when a loan is repaid in full. Carries the net amount the
		/// engine retained. \[loan_id, borrower, retained\]
		LoanRepaid(T::LoanId, T::AccountId, BalanceOf<T>),

		/// emits when a loan's collateral is seized. \[loan_id, collateral\]
		LoanLiquidated(T::LoanId, AssetOf<T>),

		/// emits when the rate for future loans changes. \[rate_per_day\]
		InterestRateSet(BalanceOf<T>),

		/// emits when operating currency is deposited. \[who, amount\]
		ReserveDeposited(T::AccountId, BalanceOf<T>),

		/// emits when operating currency is withdrawn. \[who, amount\]
		ReserveWithdrawn(T::AccountId, BalanceOf<T>),

		/// emits when administration moves to a new account. \[new_administrator\]
		AdministrationTransferred(T::AccountId),
	}

	#[pallet::error]
	pub enum Error<T> {
		/// Emits when loan doesn't exist.
		LoanNotFound,

		/// Emits when the borrower is the null identity.
		InvalidBorrower,

		/// Emits when the caller tries to open a loan for itself.
		SelfLoanNotAllowed,

		/// Emits when the engine holds less currency than the operation needs.
		InsufficientEngineFunds,

		/// Emits when the borrower doesn't own the offered collateral.
		CollateralNotOwnedByBorrower,

		/// Emits when the engine was not authorised to transfer the collateral.
		CollateralNotApproved,

		/// Emits when the tendered amount is below the total due.
		InsufficientRepayment,

		/// Emits when the market price still covers principal and debt.
		LoanNotLiquidatable,

		/// Emits when a restricted call is made by a non-administrator.
		NotAdministrator,

		/// Emits when a guarded entry point is re-entered mid-operation.
		ReentrantCall,

		/// Emits when a deposit of zero is attempted.
		ZeroAmount,

		/// Emits when a withdrawal exceeds the caller's recorded reserve.
		ReserveTooLow,

		/// Emits when the loan id counter is exhausted.
		NextLoanIdOverflow,

		/// Emits when interest arithmetic overflows the balance type.
		AmountOverflow,

		/// Emits when epoch time is overflowed.
		EpochTimeOverflow,
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Opens a new loan for `borrower` against the given collateral.
		///
		/// Restricted to the administrator. The borrower must own the
		/// collateral and have authorised the engine to take custody of
		/// it, and the engine must hold at least `principal`. The loan is
		/// registered before custody and disbursal transfers run; if
		/// either transfer fails the registration is unwound as a unit.
		#[pallet::weight(<T as Config>::WeightInfo::create_loan())]
		#[transactional]
		pub fn create_loan(
			origin: OriginFor<T>,
			borrower: T::AccountId,
			collateral: AssetOf<T>,
			principal: BalanceOf<T>,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			let (loan_id, rate_per_day) = Self::with_engine_lock(|| {
				Self::do_create_loan(who, borrower.clone(), collateral, principal)
			})?;
			Self::deposit_event(Event::<T>::LoanCreated(
				loan_id,
				borrower,
				collateral,
				principal,
				rate_per_day,
			));
			Ok(())
		}

		/// Settles the given loan in full.
		///
		/// The caller tenders `tendered_amount`; anything above the total
		/// due is refunded to the caller, the collateral returns to the
		/// borrower and the loan record is deleted.
		#[pallet::weight(<T as Config>::WeightInfo::repay_loan())]
		#[transactional]
		pub fn repay_loan(
			origin: OriginFor<T>,
			loan_id: T::LoanId,
			tendered_amount: BalanceOf<T>,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			let (borrower, retained) = Self::with_engine_lock(|| {
				Self::do_repay_loan(who, loan_id, tendered_amount)
			})?;
			Self::deposit_event(Event::<T>::LoanRepaid(loan_id, borrower, retained));
			Ok(())
		}

		/// Seizes the collateral of an underwater loan.
		///
		/// Restricted to the administrator. Permitted only while the
		/// market price is below the principal or the total due exceeds
		/// the market price. No currency changes hands.
		#[pallet::weight(<T as Config>::WeightInfo::liquidate_loan())]
		#[transactional]
		pub fn liquidate_loan(
			origin: OriginFor<T>,
			loan_id: T::LoanId,
			current_market_price: BalanceOf<T>,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			let collateral = Self::with_engine_lock(|| {
				Self::do_liquidate_loan(who, loan_id, current_market_price)
			})?;
			Self::deposit_event(Event::<T>::LoanLiquidated(loan_id, collateral));
			Ok(())
		}

		/// Sets the rate applied to loans created from now on.
		#[pallet::weight(<T as Config>::WeightInfo::set_interest_rate())]
		#[transactional]
		pub fn set_interest_rate(
			origin: OriginFor<T>,
			rate_per_day: BalanceOf<T>,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::with_engine_lock(|| Self::do_set_interest_rate(who, rate_per_day))?;
			Self::deposit_event(Event::<T>::InterestRateSet(rate_per_day));
			Ok(())
		}

		/// Deposits operating currency into the engine.
		#[pallet::weight(<T as Config>::WeightInfo::deposit_reserve())]
		#[transactional]
		pub fn deposit_reserve(origin: OriginFor<T>, amount: BalanceOf<T>) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::with_engine_lock(|| Self::do_deposit_reserve(who.clone(), amount))?;
			Self::deposit_event(Event::<T>::ReserveDeposited(who, amount));
			Ok(())
		}

		/// Withdraws previously deposited operating currency.
		#[pallet::weight(<T as Config>::WeightInfo::withdraw_reserve())]
		#[transactional]
		pub fn withdraw_reserve(origin: OriginFor<T>, amount: BalanceOf<T>) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::with_engine_lock(|| Self::do_withdraw_reserve(who.clone(), amount))?;
			Self::deposit_event(Event::<T>::ReserveWithdrawn(who, amount));
			Ok(())
		}

		/// Hands administration to a new account.
		#[pallet::weight(<T as Config>::WeightInfo::transfer_administration())]
		#[transactional]
		pub fn transfer_administration(
			origin: OriginFor<T>,
			new_administrator: T::AccountId,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::with_engine_lock(|| {
				Self::ensure_administrator(&who)?;
				<Administrator<T>>::put(&new_administrator);
				Ok(())
			})?;
			Self::deposit_event(Event::<T>::AdministrationTransferred(new_administrator));
			Ok(())
		}
	}
}

impl<T: Config> Pallet<T> {
	/// returns the account_id of the lending pallet
	pub fn account_id() -> T::AccountId {
		T::PalletId::get().into_account()
	}

	/// returns the currency the engine holds and can disburse
	pub fn total_funds() -> BalanceOf<T> {
		T::Currency::free_balance(&Self::account_id())
	}

	/// returns the total due on the given loan at the current time
	pub fn amount_owed(loan_id: T::LoanId) -> Result<BalanceOf<T>, DispatchError> {
		let loan = Loans::<T>::get(loan_id).ok_or(Error::<T>::LoanNotFound)?;
		let now = Self::now()?;
		math::amount_due(loan.principal, loan.rate_per_day, loan.start, now)
			.ok_or_else(|| Error::<T>::AmountOverflow.into())
	}

	/// returns whether the given loan is eligible for liquidation at the
	/// given market price; the same comparison `liquidate_loan` applies
	pub fn is_underwater(
		loan_id: T::LoanId,
		current_market_price: BalanceOf<T>,
	) -> Result<bool, DispatchError> {
		let loan = Loans::<T>::get(loan_id).ok_or(Error::<T>::LoanNotFound)?;
		let total_due = Self::amount_owed(loan_id)?;
		Ok(current_market_price < loan.principal || total_due > current_market_price)
	}

	fn ensure_administrator(who: &T::AccountId) -> DispatchResult {
		ensure!(
			<Administrator<T>>::get().as_ref() == Some(who),
			Error::<T>::NotAdministrator
		);
		Ok(())
	}

	/// Runs `f` with the engine's mutual-exclusion lock taken. A nested
	/// invocation from inside a custody or currency transfer finds the
	/// lock set and fails without touching the registry.
	fn with_engine_lock<R>(
		f: impl FnOnce() -> Result<R, DispatchError>,
	) -> Result<R, DispatchError> {
		ensure!(!EngineLocked::<T>::get(), Error::<T>::ReentrantCall);
		EngineLocked::<T>::put(true);
		let result = f();
		EngineLocked::<T>::kill();
		result
	}

	fn now() -> Result<u64, DispatchError> {
		let now = T::Time::now();
		TryInto::<u64>::try_into(now).map_err(|_| Error::<T>::EpochTimeOverflow.into())
	}

	/// registers a loan and indexes it, returning the assigned id
	fn insert_loan(loan: LoanDataOf<T>) -> Result<T::LoanId, DispatchError> {
		let loan_id = NextLoanId::<T>::get();
		let next_loan_id = loan_id
			.checked_add(&One::one())
			.ok_or(Error::<T>::NextLoanIdOverflow)?;
		NextLoanId::<T>::put(next_loan_id);

		BorrowerLoans::<T>::append(&loan.borrower, loan_id);
		ActiveLoans::<T>::append(loan_id);
		Loans::<T>::insert(loan_id, loan);
		Ok(loan_id)
	}

	/// deletes a loan record and unindexes its id
	fn remove_loan(loan_id: T::LoanId, borrower: &T::AccountId) {
		Loans::<T>::remove(loan_id);
		BorrowerLoans::<T>::mutate_exists(borrower, |maybe_ids| {
			if let Some(ids) = maybe_ids {
				Self::swap_remove_id(ids, loan_id);
				if ids.is_empty() {
					*maybe_ids = None;
				}
			}
		});
		ActiveLoans::<T>::mutate(|ids| Self::swap_remove_id(ids, loan_id));
	}

	/// removes `loan_id` from an index by swapping in the last element
	/// and shrinking; index order is not preserved
	fn swap_remove_id(ids: &mut Vec<T::LoanId>, loan_id: T::LoanId) {
		if let Some(position) = ids.iter().position(|id| *id == loan_id) {
			ids.swap_remove(position);
		}
	}

	fn do_create_loan(
		caller: T::AccountId,
		borrower: T::AccountId,
		collateral: AssetOf<T>,
		principal: BalanceOf<T>,
	) -> Result<(T::LoanId, BalanceOf<T>), DispatchError> {
		Self::ensure_administrator(&caller)?;
		ensure!(
			borrower != T::AccountId::default(),
			Error::<T>::InvalidBorrower
		);
		ensure!(borrower != caller, Error::<T>::SelfLoanNotAllowed);
		ensure!(
			principal <= Self::total_funds(),
			Error::<T>::InsufficientEngineFunds
		);

		// the borrower must own the collateral and have authorised us to
		// take custody of it
		let owner = T::Custody::owner_of(collateral)
			.ok_or(Error::<T>::CollateralNotOwnedByBorrower)?;
		ensure!(owner == borrower, Error::<T>::CollateralNotOwnedByBorrower);
		ensure!(
			T::Custody::is_approved_for_all(borrower.clone(), Self::account_id()),
			Error::<T>::CollateralNotApproved
		);

		// register the loan before any external transfer runs
		let rate_per_day = InterestRatePerDay::<T>::get();
		let start = Self::now()?;
		let loan_id = Self::insert_loan(LoanData {
			borrower: borrower.clone(),
			collateral,
			principal,
			rate_per_day,
			start,
		})?;

		// lock the collateral, then disburse the principal
		T::Custody::transfer(borrower.clone(), Self::account_id(), collateral)?;
		T::Currency::transfer(
			&Self::account_id(),
			&borrower,
			principal,
			ExistenceRequirement::KeepAlive,
		)?;

		Ok((loan_id, rate_per_day))
	}

	fn do_repay_loan(
		caller: T::AccountId,
		loan_id: T::LoanId,
		tendered_amount: BalanceOf<T>,
	) -> Result<(T::AccountId, BalanceOf<T>), DispatchError> {
		let loan = Loans::<T>::get(loan_id).ok_or(Error::<T>::LoanNotFound)?;

		let now = Self::now()?;
		let total_due = math::amount_due(loan.principal, loan.rate_per_day, loan.start, now)
			.ok_or(Error::<T>::AmountOverflow)?;
		ensure!(
			tendered_amount >= total_due,
			Error::<T>::InsufficientRepayment
		);
		let excess = tendered_amount - total_due;

		// the removal is the last registry mutation; from here on only
		// external transfers run, and a failure unwinds the whole call
		Self::remove_loan(loan_id, &loan.borrower);

		T::Currency::transfer(
			&caller,
			&Self::account_id(),
			tendered_amount,
			ExistenceRequirement::AllowDeath,
		)?;
		if !excess.is_zero() {
			T::Currency::transfer(
				&Self::account_id(),
				&caller,
				excess,
				ExistenceRequirement::KeepAlive,
			)?;
		}
		T::Custody::transfer(Self::account_id(), loan.borrower.clone(), loan.collateral)?;

		Ok((loan.borrower, total_due))
	}

	fn do_liquidate_loan(
		caller: T::AccountId,
		loan_id: T::LoanId,
		current_market_price: BalanceOf<T>,
	) -> Result<AssetOf<T>, DispatchError> {
		Self::ensure_administrator(&caller)?;
		let loan = Loans::<T>::get(loan_id).ok_or(Error::<T>::LoanNotFound)?;

		let now = Self::now()?;
		let total_due = math::amount_due(loan.principal, loan.rate_per_day, loan.start, now)
			.ok_or(Error::<T>::AmountOverflow)?;
		ensure!(
			current_market_price < loan.principal || total_due > current_market_price,
			Error::<T>::LoanNotLiquidatable
		);

		Self::remove_loan(loan_id, &loan.borrower);

		// the administrator keeps the asset in lieu of repayment
		T::Custody::transfer(Self::account_id(), caller, loan.collateral)?;

		Ok(loan.collateral)
	}

	fn do_set_interest_rate(caller: T::AccountId, rate_per_day: BalanceOf<T>) -> DispatchResult {
		Self::ensure_administrator(&caller)?;
		InterestRatePerDay::<T>::put(rate_per_day);
		Ok(())
	}

	fn do_deposit_reserve(caller: T::AccountId, amount: BalanceOf<T>) -> DispatchResult {
		Self::ensure_administrator(&caller)?;
		ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

		Reserves::<T>::try_mutate(&caller, |reserve| -> DispatchResult {
			*reserve = reserve
				.checked_add(&amount)
				.ok_or(Error::<T>::AmountOverflow)?;
			Ok(())
		})?;

		T::Currency::transfer(
			&caller,
			&Self::account_id(),
			amount,
			ExistenceRequirement::AllowDeath,
		)?;
		Ok(())
	}

	fn do_withdraw_reserve(caller: T::AccountId, amount: BalanceOf<T>) -> DispatchResult {
		Self::ensure_administrator(&caller)?;

		let reserve = Reserves::<T>::get(&caller);
		ensure!(amount <= reserve, Error::<T>::ReserveTooLow);
		ensure!(
			amount <= Self::total_funds(),
			Error::<T>::InsufficientEngineFunds
		);
		Reserves::<T>::insert(&caller, reserve - amount);

		T::Currency::transfer(
			&Self::account_id(),
			&caller,
			amount,
			ExistenceRequirement::KeepAlive,
		)?;
		Ok(())
	}
}
