// Copyright 2021 Centrifuge Foundation (centrifuge.io).
// This file is part of Centrifuge chain project.

// Centrifuge is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version (see http://www.gnu.org/licenses).

// Centrifuge is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Testing environment for the NFT lending pallet
//!
//! The main components implemented in this mock module is a mock runtime,
//! an in-memory double of the custody service and some helper functions.
use crate::{self as pallet_nft_lending, Asset};
use common_traits::NonFungibleCustody;
use frame_support::dispatch::DispatchResult;
use frame_support::{parameter_types, traits::GenesisBuild, PalletId};
use sp_core::H256;
use sp_io::TestExternalities;
use sp_runtime::{
	testing::Header,
	traits::{BlakeTwo256, IdentityLookup},
	DispatchError,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

type UncheckedExtrinsic = frame_system::mocking::MockUncheckedExtrinsic<MockRuntime>;
type Block = frame_system::mocking::MockBlock<MockRuntime>;

pub type AccountId = u64;
pub type Balance = u128;
pub type ClassId = u64;
pub type InstanceId = u128;
pub type LoanId = u64;
pub type CollateralOf = Asset<ClassId, InstanceId>;

// Build mock runtime
frame_support::construct_runtime!(
	pub enum MockRuntime where
		Block = Block,
		NodeBlock = Block,
		UncheckedExtrinsic = UncheckedExtrinsic,
	{
		System: frame_system::{Pallet, Call, Config, Storage, Event<T>},
		Balances: pallet_balances::{Pallet, Call, Config<T>, Storage, Event<T>},
		Timestamp: pallet_timestamp::{Pallet, Call, Storage, Inherent},
		NftLending: pallet_nft_lending::{Pallet, Call, Config<T>, Storage, Event<T>},
	}
);

// Parameterize FRAME system pallet
parameter_types! {
	pub const BlockHashCount: u64 = 250;
}

impl frame_system::Config for MockRuntime {
	type BaseCallFilter = frame_support::traits::Everything;
	type BlockWeights = ();
	type BlockLength = ();
	type Origin = Origin;
	type Call = Call;
	type Index = u64;
	type BlockNumber = u64;
	type Hash = H256;
	type Hashing = BlakeTwo256;
	type AccountId = AccountId;
	type Lookup = IdentityLookup<Self::AccountId>;
	type Header = Header;
	type Event = Event;
	type BlockHashCount = BlockHashCount;
	type DbWeight = ();
	type Version = ();
	type PalletInfo = PalletInfo;
	type AccountData = pallet_balances::AccountData<Balance>;
	type OnNewAccount = ();
	type OnKilledAccount = ();
	type SystemWeightInfo = ();
	type SS58Prefix = ();
	type OnSetCode = ();
}

// Parameterize FRAME balances pallet
parameter_types! {
	pub const ExistentialDeposit: u64 = 1;
}

impl pallet_balances::Config for MockRuntime {
	type Balance = Balance;
	type DustRemoval = ();
	type Event = Event;
	type ExistentialDeposit = ExistentialDeposit;
	type AccountStore = System;
	type WeightInfo = ();
	type MaxLocks = ();
	type MaxReserves = ();
	type ReserveIdentifier = ();
}

// Implement FRAME timestamp pallet configuration trait for the mock runtime
impl pallet_timestamp::Config for MockRuntime {
	type Moment = u64;
	type OnTimestampSet = ();
	type MinimumPeriod = ();
	type WeightInfo = ();
}

parameter_types! {
	pub const LendingPalletId: PalletId = PalletId(*b"pal/lend");
}

impl pallet_nft_lending::Config for MockRuntime {
	type Event = Event;
	type LoanId = LoanId;
	type ClassId = ClassId;
	type InstanceId = InstanceId;
	type Custody = MockCustody;
	type Currency = Balances;
	type Time = Timestamp;
	type PalletId = LendingPalletId;
	type WeightInfo = ();
}

pub(crate) const ADMIN: AccountId = 0x1;
pub(crate) const BORROWER: AccountId = 0x2;
pub(crate) const OTHER: AccountId = 0x3;

pub(crate) const COLLECTION: ClassId = 7;

// A fixed point in time, in seconds, that the mock clock starts from.
pub(crate) const GENESIS_TIME: u64 = 1_600_000_000;

thread_local! {
	static OWNERS: RefCell<HashMap<(ClassId, InstanceId), AccountId>> = RefCell::new(HashMap::new());
	static OPERATORS: RefCell<HashSet<(AccountId, AccountId)>> = RefCell::new(HashSet::new());
	static DENY_TRANSFERS: RefCell<bool> = RefCell::new(false);
	static REENTER_WITH: RefCell<Option<ReentryCall>> = RefCell::new(None);
	static REENTRY_OUTCOME: RefCell<Option<DispatchResult>> = RefCell::new(None);
}

/// A call the custody double replays into the pallet from inside a
/// transfer, emulating a custody service that calls back mid-operation.
#[derive(Clone)]
pub enum ReentryCall {
	Create {
		caller: AccountId,
		borrower: AccountId,
		collateral: CollateralOf,
		principal: Balance,
	},
	Repay {
		caller: AccountId,
		loan_id: LoanId,
		amount: Balance,
	},
	Liquidate {
		caller: AccountId,
		loan_id: LoanId,
		price: Balance,
	},
}

/// In-memory double of the external custody service.
pub struct MockCustody;

impl MockCustody {
	pub fn mint(owner: AccountId, asset: CollateralOf) {
		OWNERS.with(|owners| owners.borrow_mut().insert(asset.destruct(), owner));
	}

	pub fn set_approval_for_all(owner: AccountId, operator: AccountId) {
		OPERATORS.with(|operators| operators.borrow_mut().insert((owner, operator)));
	}

	pub fn owner(asset: CollateralOf) -> Option<AccountId> {
		OWNERS.with(|owners| owners.borrow().get(&asset.destruct()).copied())
	}

	/// Makes every subsequent transfer fail, keeping ownership untouched.
	pub fn deny_transfers() {
		DENY_TRANSFERS.with(|deny| *deny.borrow_mut() = true);
	}

	/// Arms the double to dispatch `call` from inside the next transfer.
	pub fn reenter_with(call: ReentryCall) {
		REENTER_WITH.with(|reenter| *reenter.borrow_mut() = Some(call));
	}

	/// The outcome of the last armed reentrant dispatch, if it ran.
	pub fn reentry_outcome() -> Option<DispatchResult> {
		REENTRY_OUTCOME.with(|outcome| outcome.borrow_mut().take())
	}

	fn reset() {
		OWNERS.with(|owners| owners.borrow_mut().clear());
		OPERATORS.with(|operators| operators.borrow_mut().clear());
		DENY_TRANSFERS.with(|deny| *deny.borrow_mut() = false);
		REENTER_WITH.with(|reenter| *reenter.borrow_mut() = None);
		REENTRY_OUTCOME.with(|outcome| *outcome.borrow_mut() = None);
	}
}

impl NonFungibleCustody<CollateralOf, AccountId> for MockCustody {
	fn owner_of(asset: CollateralOf) -> Option<AccountId> {
		Self::owner(asset)
	}

	fn is_approved_for_all(owner: AccountId, operator: AccountId) -> bool {
		OPERATORS.with(|operators| operators.borrow().contains(&(owner, operator)))
	}

	fn transfer(from: AccountId, to: AccountId, asset: CollateralOf) -> DispatchResult {
		// an armed double calls back into the pallet before completing
		// the transfer, like a hostile custody service would
		if let Some(call) = REENTER_WITH.with(|reenter| reenter.borrow_mut().take()) {
			let outcome = match call {
				ReentryCall::Create {
					caller,
					borrower,
					collateral,
					principal,
				} => NftLending::create_loan(Origin::signed(caller), borrower, collateral, principal),
				ReentryCall::Repay {
					caller,
					loan_id,
					amount,
				} => NftLending::repay_loan(Origin::signed(caller), loan_id, amount),
				ReentryCall::Liquidate {
					caller,
					loan_id,
					price,
				} => NftLending::liquidate_loan(Origin::signed(caller), loan_id, price),
			};
			REENTRY_OUTCOME.with(|slot| *slot.borrow_mut() = Some(outcome));
		}

		if DENY_TRANSFERS.with(|deny| *deny.borrow()) {
			return Err(DispatchError::Other("custody transfer rejected"));
		}

		OWNERS.with(|owners| {
			let mut owners = owners.borrow_mut();
			let key = asset.destruct();
			match owners.get(&key) {
				Some(owner) if *owner == from => {
					owners.insert(key, to);
					Ok(())
				}
				_ => Err(DispatchError::Other("custody transfer rejected")),
			}
		})
	}
}

// Test externalities builder
//
// This type is mainly used for mocking storage in tests. It is the type alias
// for an in-memory, hashmap-based externalities implementation.
pub struct TestExternalitiesBuilder {}

// Default trait implementation for test externalities builder
impl Default for TestExternalitiesBuilder {
	fn default() -> Self {
		Self {}
	}
}

impl TestExternalitiesBuilder {
	// Build a genesis storage key/value store
	pub(crate) fn build(self) -> TestExternalities {
		MockCustody::reset();

		let mut storage = frame_system::GenesisConfig::default()
			.build_storage::<MockRuntime>()
			.unwrap();

		pallet_balances::GenesisConfig::<MockRuntime> {
			balances: vec![
				(ADMIN, 10_000),
				(BORROWER, 1_000),
				(OTHER, 1_000),
				// the engine's disbursable funds
				(NftLending::account_id(), 5_000),
			],
		}
		.assimilate_storage(&mut storage)
		.unwrap();

		pallet_nft_lending::GenesisConfig::<MockRuntime> {
			administrator: Some(ADMIN),
			interest_rate_per_day: 0,
		}
		.assimilate_storage(&mut storage)
		.unwrap();

		let mut externalities = TestExternalities::new(storage);
		externalities.execute_with(|| {
			System::set_block_number(1);
			Timestamp::set_timestamp(GENESIS_TIME);
		});
		externalities
	}
}
