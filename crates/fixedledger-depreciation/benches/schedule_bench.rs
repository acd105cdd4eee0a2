//! Schedule generation benchmarks.
//!
//! Run with: cargo bench -p fixedledger-depreciation

#![allow(missing_docs)]

use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fixedledger_core::{AssetBook, BookType, DepreciationMethod};
use fixedledger_depreciation::ScheduleGenerator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn book(life: u32, method: DepreciationMethod) -> AssetBook {
    AssetBook::new(
        BookType::Statutory,
        dec!(250000.00),
        dec!(12500.00),
        life,
        method,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let generator = ScheduleGenerator::default();

    for life in [12u32, 120, 480] {
        group.throughput(Throughput::Elements(u64::from(life)));

        let sl = book(life, DepreciationMethod::StraightLine);
        group.bench_with_input(BenchmarkId::new("straight_line", life), &sl, |b, book| {
            b.iter(|| black_box(generator.generate(book)));
        });

        let db = book(life, DepreciationMethod::double_declining(life));
        group.bench_with_input(BenchmarkId::new("declining_switch", life), &db, |b, book| {
            b.iter(|| black_box(generator.generate(book)));
        });

        let uop = book(
            life,
            DepreciationMethod::units_of_production(Decimal::from(life * 100), vec![dec!(100)]),
        );
        group.bench_with_input(BenchmarkId::new("units", life), &uop, |b, book| {
            b.iter(|| black_box(generator.generate(book)));
        });
    }

    group.finish();
}

fn bench_regenerate_tail(c: &mut Criterion) {
    let generator = ScheduleGenerator::default();
    let mut posted = book(480, DepreciationMethod::StraightLine);
    let _ = generator.regenerate(&mut posted);
    for _ in 0..240 {
        if let Some(entry) = posted.schedule.post_next() {
            let amount = entry.depreciation_amount;
            posted.accumulated_depreciation += amount;
        }
    }

    c.bench_function("regenerate_tail_after_240_posted", |b| {
        b.iter(|| {
            let mut book = posted.clone();
            book.useful_life_periods = 600;
            black_box(generator.regenerate(&mut book))
        });
    });
}

criterion_group!(benches, bench_generate, bench_regenerate_tail);
criterion_main!(benches);
