//! Integer division helpers.
//!
//! Every quantity in the search is a non-negative machine word, so the
//! helpers are defined for non-negative dividends and positive divisors
//! only. Call sites clamp differences (`saturating_sub` / `checked_sub`)
//! before dividing.

/// Ceiling of `dividend / divisor`.
#[inline]
pub(crate) fn ceil_div(dividend: u64, divisor: u64) -> u64 {
    debug_assert!(divisor > 0, "division by zero");
    dividend / divisor + u64::from(dividend % divisor != 0)
}

/// Floor of `dividend / divisor`.
#[inline]
pub(crate) fn floor_div(dividend: u64, divisor: u64) -> u64 {
    debug_assert!(divisor > 0, "division by zero");
    dividend / divisor
}
