//! Core types for fixedledger
//!
//! This crate provides the data model of the fixed-asset engine:
//!
//! - [`AssetBook`] - One depreciation ledger of an asset under one [`BookType`]
//! - [`DepreciationMethod`] - Method and method-specific parameters
//! - [`DepreciationSchedule`] - Posted history plus projected periods
//! - [`AssetEvent`] - Immutable audit record of a lifecycle action
//! - [`Disposal`] - Outcome of selling or otherwise disposing of an asset
//! - [`AssetClassTable`] - Asset-class configuration with book defaults
//!
//! All money is fixed-point [`Decimal`]; see [`money`].
//!
//! # Example
//!
//! ```
//! use fixedledger_core::{AssetBook, BookType, DepreciationMethod, PostingCadence};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let book = AssetBook::new(
//!     BookType::Tax,
//!     dec!(12000),
//!     dec!(0),
//!     4,
//!     DepreciationMethod::declining_balance(dec!(0.5)),
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! )
//! .with_cadence(PostingCadence::Annual);
//!
//! assert_eq!(book.book_value(), dec!(12000));
//! assert_eq!(book.method.label(), "Declining balance (50%)");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod book;
pub mod class;
pub mod disposal;
pub mod event;
pub mod method;
pub mod money;
pub mod schedule;
pub mod status;

pub use book::{AdjustmentKind, AssetBook, BookType, Component, ImpairmentAdjustment, PostingCadence};
pub use class::{AssetClass, AssetClassTable, Classification, ClassTableError};
pub use disposal::{BookDisposal, Disposal, DisposalType, GainLoss};
pub use event::{
    AssetEvent, AssetEventKind, AssetEventType, AssetId, BookClosing, EventId, EventValue,
};
pub use method::{ChargeBasis, DepreciationMethod, ParseMethodError};
pub use money::{Money, MONEY_SCALE};
pub use schedule::{ContinuityBreak, DepreciationSchedule, ScheduleEntry};
pub use status::{AssetStatus, StatusChange};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
