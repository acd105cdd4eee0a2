//! Fixed-point money helpers.
//!
//! Every monetary figure in fixedledger is a [`Decimal`] carried at
//! [`MONEY_SCALE`] decimal places. Periodic charges are truncated toward zero
//! so that the residue of a division is always non-negative and can be folded
//! into the final period of a schedule.

use rust_decimal::{Decimal, RoundingStrategy};

/// A monetary amount in the book's (single) currency.
pub type Money = Decimal;

/// Number of decimal places carried by monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to money scale, half away from zero.
///
/// Used for amounts the ledger derives itself, such as a salvage value
/// computed from a salvage rate. Caller-supplied amounts are never rounded;
/// they are rejected unless [`is_money_scaled`] holds.
#[must_use]
pub fn round_money(value: Decimal) -> Money {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncate an amount to money scale.
///
/// Used for periodic charges so that `n * truncate(base / n) <= base`.
///
/// ```
/// use fixedledger_core::money::truncate_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(truncate_money(dec!(333.3333)), dec!(333.33));
/// assert_eq!(truncate_money(dec!(0.009)), dec!(0.00));
/// ```
#[must_use]
pub fn truncate_money(value: Decimal) -> Money {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero)
}

/// Check that an amount has no more precision than money scale allows.
///
/// ```
/// use fixedledger_core::money::is_money_scaled;
/// use rust_decimal_macros::dec;
///
/// assert!(is_money_scaled(dec!(12000.50)));
/// assert!(!is_money_scaled(dec!(12000.005)));
/// ```
#[must_use]
pub fn is_money_scaled(value: Decimal) -> bool {
    value == truncate_money(value)
}
