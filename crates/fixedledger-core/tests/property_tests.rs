//! Property-based tests for the core model.
//!
//! Run with: cargo test -p fixedledger-core --test `property_tests`

use chrono::{Days, NaiveDate};
use fixedledger_core::money::{is_money_scaled, round_money, truncate_money};
use fixedledger_core::PostingCadence;
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000_000i64, 0u32..=6).prop_map(|(n, scale)| Decimal::new(n, scale))
}

fn arb_cadence() -> impl Strategy<Value = PostingCadence> {
    prop_oneof![
        Just(PostingCadence::Monthly),
        Just(PostingCadence::Quarterly),
        Just(PostingCadence::SemiAnnual),
        Just(PostingCadence::Annual),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2060, 1u32..=12, 1u32..=31).prop_filter_map("valid date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

// ============================================================================
// Money
// ============================================================================

proptest! {
    #[test]
    fn prop_truncated_charges_never_exceed_base(base in arb_amount(), periods in 1u32..1200) {
        let base = round_money(base);
        let charge = truncate_money(base / Decimal::from(periods));
        let residue = base - charge * Decimal::from(periods);
        prop_assert!(is_money_scaled(charge));
        prop_assert!(residue >= Decimal::ZERO);
        prop_assert!(residue < Decimal::new(i64::from(periods), 2));
    }

    #[test]
    fn prop_rounding_is_idempotent(value in arb_amount()) {
        let rounded = round_money(value);
        prop_assert!(is_money_scaled(rounded));
        prop_assert_eq!(round_money(rounded), rounded);
        prop_assert!((rounded - value).abs() <= Decimal::new(5, 3));
    }
}

// ============================================================================
// Posting periods
// ============================================================================

proptest! {
    #[test]
    fn prop_periods_are_contiguous(
        in_service in arb_date(),
        cadence in arb_cadence(),
        period in 1u32..600,
    ) {
        let start = cadence.period_start(in_service, period).unwrap();
        let end = cadence.period_end(in_service, period).unwrap();
        let next_start = cadence.period_start(in_service, period + 1).unwrap();
        prop_assert!(start <= end);
        prop_assert_eq!(end + Days::new(1), next_start);
    }

    #[test]
    fn prop_first_period_starts_in_service(in_service in arb_date(), cadence in arb_cadence()) {
        prop_assert_eq!(cadence.period_start(in_service, 1), Some(in_service));
        prop_assert_eq!(cadence.period_start(in_service, 0), None);
    }
}
