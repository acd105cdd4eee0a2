//! Property-based tests for the lifecycle engine.
//!
//! Run with: cargo test -p fixedledger-lifecycle --test `property_tests`

use chrono::{Months, NaiveDate};
use fixedledger_core::{
    AssetStatus, BookType, Classification, DepreciationMethod, DisposalType, PostingCadence,
};
use fixedledger_lifecycle::{
    calculate_disposal_gain_loss, Asset, BookSpec, DisposalSpec, LifecycleEngine, NewAsset,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_money(max_cents: i64) -> impl Strategy<Value = Decimal> {
    (0i64..=max_cents).prop_map(|n| Decimal::new(n, 2))
}

fn arb_cost_and_salvage() -> impl Strategy<Value = (Decimal, Decimal)> {
    (1i64..100_000_000i64, 0u32..=50u32).prop_map(|(cents, pct)| {
        let cost = Decimal::new(cents, 2);
        let salvage = (cost * Decimal::from(pct) / Decimal::ONE_HUNDRED).round_dp(2);
        (cost, salvage)
    })
}

fn arb_method() -> impl Strategy<Value = DepreciationMethod> {
    prop_oneof![
        Just(DepreciationMethod::StraightLine),
        (1i64..=100i64).prop_map(|n| DepreciationMethod::declining_balance(Decimal::new(n, 2))),
        (1i64..=100i64)
            .prop_map(|n| DepreciationMethod::declining_balance_with_switch(Decimal::new(n, 2))),
    ]
}

fn in_service() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn capitalized(
    engine: &LifecycleEngine,
    cost: Decimal,
    salvage: Decimal,
    life: u32,
    method: DepreciationMethod,
) -> Asset {
    let request = NewAsset::new("FA-P", "Asset", Classification::new("Machinery"), in_service())
        .with_book(
            BookSpec::new(BookType::Statutory)
                .with_life(life)
                .with_method(method)
                .with_salvage_value(salvage)
                .with_cadence(PostingCadence::Monthly),
        );
    let mut asset = engine.create_asset(request, "prop").unwrap();
    engine
        .acquire_and_capitalize(&mut asset, in_service(), cost, &[], "prop")
        .unwrap();
    asset
}

fn month_end(period: u32) -> NaiveDate {
    in_service() + Months::new(period) - chrono::Days::new(1)
}

// ============================================================================
// Posting properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_posting_is_monotonic_and_bounded(
        (cost, salvage) in arb_cost_and_salvage(),
        life in 1u32..60,
        method in arb_method(),
    ) {
        let engine = LifecycleEngine::new();
        let mut asset = capitalized(&engine, cost, salvage, life, method);

        let mut previous_accumulated = Decimal::ZERO;
        let mut previous_value = cost;
        for period in 1..=life {
            let result = engine.post_depreciation(
                &mut asset,
                BookType::Statutory,
                month_end(period),
                None,
                "prop",
            );
            let book = asset.primary().unwrap();
            if result.is_err() {
                prop_assert!(book.is_fully_depreciated());
                break;
            }
            prop_assert!(book.accumulated_depreciation >= previous_accumulated);
            prop_assert!(book.book_value() <= previous_value);
            prop_assert!(book.book_value() >= salvage);
            prop_assert!(book.book_value() <= cost);
            previous_accumulated = book.accumulated_depreciation;
            previous_value = book.book_value();
        }

        let book = asset.primary().unwrap();
        prop_assert_eq!(book.accumulated_depreciation, cost - salvage);
        prop_assert_eq!(book.book_value(), salvage);
        prop_assert_eq!(asset.status, AssetStatus::FullyDepreciated);
    }

    #[test]
    fn prop_impairment_only_lowers_value(
        (cost, salvage) in arb_cost_and_salvage(),
        life in 2u32..36,
        posted in 0u32..12,
        fraction in 0u32..100,
    ) {
        let engine = LifecycleEngine::new();
        let mut asset = capitalized(&engine, cost, salvage, life, DepreciationMethod::StraightLine);
        for period in 1..=posted.min(life - 1) {
            engine
                .post_depreciation(&mut asset, BookType::Statutory, month_end(period), None, "prop")
                .unwrap();
        }
        let before = asset.book_value(BookType::Statutory).unwrap();
        let recoverable = (before * Decimal::from(fraction) / Decimal::ONE_HUNDRED).round_dp(2);
        prop_assume!(recoverable < before);

        engine
            .record_impairment(
                &mut asset,
                BookType::Statutory,
                month_end(posted.min(life - 1).max(1)),
                recoverable,
                "prop",
                "prop",
            )
            .unwrap();
        let book = asset.primary().unwrap();
        prop_assert_eq!(book.book_value(), recoverable);
        prop_assert!(book.salvage_value <= recoverable);
        prop_assert_eq!(asset.status, AssetStatus::Impaired);
        prop_assert_eq!(
            book.schedule.unposted().iter().map(|e| e.depreciation_amount).sum::<Decimal>(),
            recoverable - book.salvage_value
        );
    }

    #[test]
    fn prop_rejected_commands_leave_asset_unchanged(
        (cost, salvage) in arb_cost_and_salvage(),
        life in 1u32..24,
        excess in arb_money(1_000_000),
    ) {
        let engine = LifecycleEngine::new();
        let mut asset = capitalized(&engine, cost, salvage, life, DepreciationMethod::StraightLine);
        let before = asset.clone();
        let value = asset.book_value(BookType::Statutory).unwrap();

        let impair = engine.record_impairment(
            &mut asset,
            BookType::Statutory,
            in_service(),
            value + excess,
            "prop",
            "prop",
        );
        prop_assert!(impair.is_err());
        let revalue = engine.record_revaluation(
            &mut asset,
            BookType::Statutory,
            in_service(),
            value - excess,
            "prop",
            "prop",
        );
        prop_assert!(revalue.is_err());
        prop_assert_eq!(&asset, &before);
    }

    #[test]
    fn prop_disposal_gain_matches_calculator(
        (cost, salvage) in arb_cost_and_salvage(),
        life in 1u32..24,
        posted in 0u32..24,
        proceeds in arb_money(200_000_000),
    ) {
        let engine = LifecycleEngine::new();
        let mut asset = capitalized(&engine, cost, salvage, life, DepreciationMethod::StraightLine);
        for period in 1..=posted.min(life) {
            if engine
                .post_depreciation(&mut asset, BookType::Statutory, month_end(period), None, "prop")
                .is_err()
            {
                break;
            }
        }
        let carrying = asset.book_value(BookType::Statutory).unwrap();
        let date = month_end(life + 1);
        let disposal = engine
            .dispose(&mut asset, &DisposalSpec::sale(date, proceeds, "prop"), "prop")
            .unwrap();
        let expected = calculate_disposal_gain_loss(carrying, proceeds);
        prop_assert_eq!(disposal.gain_or_loss, expected.amount);
        prop_assert_eq!(disposal.is_gain, expected.is_gain);
        prop_assert_eq!(disposal.disposal_type, DisposalType::Sale);
        prop_assert_eq!(asset.book_value(BookType::Statutory).unwrap(), Decimal::ZERO);
    }
}
