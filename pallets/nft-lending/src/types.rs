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

//! Types used by the NFT lending pallet

use codec::{Decode, Encode};
use scale_info::TypeInfo;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

/// A global identifier for a collateral asset held in custody.
/// Composed of a class and an instance id.
#[derive(Encode, Decode, Copy, Clone, PartialEq, Eq, Default, Debug, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct Asset<ClassId, InstanceId>(pub ClassId, pub InstanceId);

impl<ClassId, InstanceId> Asset<ClassId, InstanceId> {
	pub fn destruct(self) -> (ClassId, InstanceId) {
		(self.0, self.1)
	}
}

/// The data structure for storing loan info.
///
/// A loan is immutable once written: it is only ever removed again, never
/// updated in place. The rate is snapshotted at creation so that later
/// changes to the configured rate cannot alter what an existing borrower
/// owes.
#[derive(Encode, Decode, Clone, PartialEq, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize, Debug))]
pub struct LoanData<AccountId, ClassId, InstanceId, Balance> {
	/// The account the principal was disbursed to.
	pub borrower: AccountId,
	/// The asset locked in the engine's custody for the lifetime of the loan.
	pub collateral: Asset<ClassId, InstanceId>,
	/// The amount disbursed, in the smallest currency unit.
	pub principal: Balance,
	/// Daily interest in units of 1/100_000 of the principal.
	pub rate_per_day: Balance,
	/// Creation time in seconds.
	pub start: u64,
}
