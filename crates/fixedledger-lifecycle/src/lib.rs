//! Asset lifecycle for fixedledger.
//!
//! This crate moves assets through their lifecycle and keeps every book's
//! schedule consistent along the way:
//!
//! - [`LifecycleEngine`] - The state machine; applies one command to one asset
//! - [`Asset`] - The aggregate: status, books and the append-only event log
//! - [`AssetRegistry`] - Command and query surface with per-asset locking
//! - [`post_all_due`] - Period-end batch posting, parallel across assets
//! - [`calculate_disposal_gain_loss`] - Gain or loss on disposal
//!
//! Commands validate fully before they change anything. A rejected command
//! returns a [`LifecycleError`] and leaves the asset untouched.
//!
//! # Example
//!
//! ```
//! use fixedledger_core::{AssetStatus, BookType, Classification, PostingCadence};
//! use fixedledger_lifecycle::{AssetRegistry, BookSpec, NewAsset};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
//! let registry = AssetRegistry::default();
//!
//! let request = NewAsset::new("FA-001", "Forklift", Classification::new("Machinery"), day(2024, 1, 1))
//!     .with_book(
//!         BookSpec::new(BookType::Statutory)
//!             .with_life(4)
//!             .with_salvage_value(dec!(0))
//!             .with_cadence(PostingCadence::Annual),
//!     );
//! let id = registry.create_asset(request, "alice").unwrap().id;
//! registry
//!     .acquire_and_capitalize(id, day(2024, 1, 1), dec!(12000), &[], "alice")
//!     .unwrap();
//!
//! let entry = registry
//!     .post_depreciation(id, BookType::Statutory, day(2024, 12, 31), None, "batch")
//!     .unwrap();
//! assert_eq!(entry.depreciation_amount, dec!(3000));
//! assert_eq!(registry.get_asset(id).unwrap().status, AssetStatus::Active);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod batch;
pub mod command;
mod disposal;
mod error;
mod machine;
mod options;
mod registry;

pub use asset::Asset;
pub use batch::{post_all_due, BatchReport, BookPosting};
pub use command::{AssetCommand, BookOverride, BookSpec, CommandOutcome, DisposalSpec, NewAsset};
pub use disposal::calculate_disposal_gain_loss;
pub use error::LifecycleError;
pub use machine::LifecycleEngine;
pub use options::LedgerOptions;
pub use registry::{AssetHandle, AssetRegistry};
