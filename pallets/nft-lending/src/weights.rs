// Copyright 2021 Centrifuge GmbH (centrifuge.io).
// This file is part of Centrifuge chain project.

// Centrifuge is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version (see http://www.gnu.org/licenses).

// Centrifuge is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! NFT lending pallet's extrinsics weight information
//!
//! Note that the following weights are used only for development.
//! In fact, weights should be calculated using runtime benchmarking.

use frame_support::weights::{constants::RocksDbWeight, Weight};

pub trait WeightInfo {
	fn create_loan() -> Weight;
	fn repay_loan() -> Weight;
	fn liquidate_loan() -> Weight;
	fn set_interest_rate() -> Weight;
	fn deposit_reserve() -> Weight;
	fn withdraw_reserve() -> Weight;
	fn transfer_administration() -> Weight;
}

impl WeightInfo for () {
	fn create_loan() -> Weight {
		(195_000_000 as Weight).saturating_add(RocksDbWeight::get().reads_writes(7, 6))
	}

	fn repay_loan() -> Weight {
		(185_000_000 as Weight).saturating_add(RocksDbWeight::get().reads_writes(7, 6))
	}

	fn liquidate_loan() -> Weight {
		(160_000_000 as Weight).saturating_add(RocksDbWeight::get().reads_writes(6, 5))
	}

	fn set_interest_rate() -> Weight {
		(25_000_000 as Weight).saturating_add(RocksDbWeight::get().reads_writes(2, 1))
	}

	fn deposit_reserve() -> Weight {
		(95_000_000 as Weight).saturating_add(RocksDbWeight::get().reads_writes(3, 2))
	}

	fn withdraw_reserve() -> Weight {
		(95_000_000 as Weight).saturating_add(RocksDbWeight::get().reads_writes(3, 2))
	}

	fn transfer_administration() -> Weight {
		(25_000_000 as Weight).saturating_add(RocksDbWeight::get().reads_writes(2, 1))
	}
}
