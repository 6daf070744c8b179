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

//! # A common trait lib for the lending runtime
//!
//! This crate provides the port traits the lending pallet is loosely
//! coupled against: the custody service holding non-fungible collateral
//! and the off-chain floor price feed driving liquidation triggers.

// Ensure we're `no_std` when compiling for WebAssembly.
#![cfg_attr(not(feature = "std"), no_std)]

use frame_support::dispatch::DispatchResult;

/// An abstraction over a custodial service for non-fungible assets.
///
/// The lending pallet never touches asset storage directly; it only asks
/// the custody service who owns an asset, whether an operator has been
/// authorised for an owner's assets, and to move an asset between two
/// identities. Implementations decide what an asset identifier is and how
/// transfers are executed.
pub trait NonFungibleCustody<AssetId, AccountId> {
	/// Returns the current owner of `asset`, or `None` if the asset is
	/// unknown to the custody service.
	fn owner_of(asset: AssetId) -> Option<AccountId>;

	/// Whether `owner` has authorised `operator` to transfer any of the
	/// assets it owns.
	fn is_approved_for_all(owner: AccountId, operator: AccountId) -> bool;

	/// Moves `asset` from `from` to `to`.
	///
	/// Fails if the ownership or authorisation preconditions do not hold
	/// at call time.
	fn transfer(from: AccountId, to: AccountId, asset: AssetId) -> DispatchResult;
}

/// A source of off-chain floor prices for collateral classes.
///
/// Consumed by the layer that triggers liquidation checks. The lending
/// core itself takes the market price as a call argument and never reads
/// the feed directly.
pub trait PriceFeed<ClassId, Balance> {
	/// The latest floor price quoted for the given class, or `None` when
	/// no quote is available.
	fn floor_price(class: ClassId) -> Option<Balance>;
}
