//! Fixed-asset command-line tools.
//!
//! This crate provides the command-line front end to fixedledger:
//!
//! - `fixedledger-schedule`: Preview a depreciation schedule from flags
//! - `fixedledger-run`: Apply a JSON scenario of assets and commands
//! - `fixedledger-classes`: List the asset-class table
//!
//! # Example Usage
//!
//! ```bash
//! fixedledger-schedule --cost 12000 --life 4 --method db:0.5 --cadence annual --in-service 2024-01-01
//! fixedledger-run scenario.json --format json
//! fixedledger-classes --file classes.json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
