//! Depreciation methods and schedule generation for fixedledger.
//!
//! This crate provides:
//! - The method library: straight-line, declining balance with an optional
//!   switch to straight-line, and units of production
//! - The schedule generator, which rebuilds a book's unposted tail and checks
//!   that it reconciles
//! - The posting eligibility check
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use fixedledger_core::{AssetBook, BookType, DepreciationMethod, PostingCadence};
//! use fixedledger_depreciation::ScheduleGenerator;
//! use rust_decimal_macros::dec;
//!
//! let mut book = AssetBook::new(
//!     BookType::Tax,
//!     dec!(12000),
//!     dec!(0),
//!     4,
//!     DepreciationMethod::declining_balance(dec!(0.5)),
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! )
//! .with_cadence(PostingCadence::Annual);
//!
//! ScheduleGenerator::default().regenerate(&mut book).unwrap();
//! let charges: Vec<_> = book
//!     .schedule
//!     .entries()
//!     .iter()
//!     .map(|e| e.depreciation_amount)
//!     .collect();
//! assert_eq!(charges, vec![dec!(6000), dec!(3000), dec!(1500), dec!(1500)]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod eligibility;
mod generator;
pub mod methods;

pub use eligibility::{can_depreciate, next_due_entry, Ineligibility};
pub use generator::{reconcile, RegenerationOutcome, ScheduleError, ScheduleGenerator};
pub use methods::{
    accumulated_depreciation, depreciation_charges, period_depreciation, project,
    DepreciationInput, MethodError, PeriodCharge, ProjectionStart, DEFAULT_MAX_PERIODS,
};
