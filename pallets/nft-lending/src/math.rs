use sp_arithmetic::traits::AtLeast32BitUnsigned;
use sp_std::convert::TryFrom;

/// Seconds in a day, the accrual granularity.
pub const SECONDS_PER_DAY: u64 = 86400;

/// The rate denominator: a `rate_per_day` of 100_000 doubles the
/// principal every day.
pub const RATE_DIVISOR: u32 = 100_000;

/// returns the number of whole days between `start` and `now`
///
/// A clock running behind the loan's start time clamps to zero elapsed
/// days instead of underflowing.
pub fn days_elapsed(start: u64, now: u64) -> u64 {
	now.saturating_sub(start) / SECONDS_PER_DAY
}

/// calculates the interest accrued over `days` whole days
///
/// The division is applied once to the full product, so truncation only
/// ever drops sub-unit remainders of the combined term and the borrower
/// is never charged a rounded-up unit per day.
pub fn interest_accrued<Balance>(principal: Balance, rate_per_day: Balance, days: u64) -> Option<Balance>
where
	Balance: AtLeast32BitUnsigned + Copy,
{
	let days = Balance::try_from(days).ok()?;
	principal
		.checked_mul(&rate_per_day)?
		.checked_mul(&days)?
		.checked_div(&Balance::from(RATE_DIVISOR))
}

/// calculates the total amount due on a loan at `now`
///
/// Returns `None` when any intermediate product overflows; callers must
/// reject the operation rather than wrap.
pub fn amount_due<Balance>(principal: Balance, rate_per_day: Balance, start: u64, now: u64) -> Option<Balance>
where
	Balance: AtLeast32BitUnsigned + Copy,
{
	let interest = interest_accrued(principal, rate_per_day, days_elapsed(start, now))?;
	principal.checked_add(&interest)
}
