//! Depreciation methods and their parameters.
//!
//! A [`DepreciationMethod`] is a tagged union: each variant carries exactly the
//! parameters its algorithm needs. The algorithms themselves live in the
//! `fixedledger-depreciation` crate; this module only describes them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How an asset book spreads its depreciable base over time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DepreciationMethod {
    /// Equal charge every period.
    StraightLine,
    /// Constant rate applied to the opening book value of each period.
    DecliningBalance {
        /// Rate per period, e.g. `0.4` for 40%.
        rate: Decimal,
        /// Switch permanently to straight-line on the remaining value once
        /// that yields the larger charge.
        #[serde(default)]
        switch_to_straight_line: bool,
    },
    /// Charge proportional to usage.
    UnitsOfProduction {
        /// Total units the asset is expected to produce over its life.
        total_units: Decimal,
        /// Planned usage per period, indexed from period 1.
        #[serde(default)]
        usage: Vec<Decimal>,
    },
}

impl DepreciationMethod {
    /// Declining balance without the straight-line switch.
    #[must_use]
    pub const fn declining_balance(rate: Decimal) -> Self {
        Self::DecliningBalance {
            rate,
            switch_to_straight_line: false,
        }
    }

    /// Declining balance that switches to straight-line at the crossover.
    #[must_use]
    pub const fn declining_balance_with_switch(rate: Decimal) -> Self {
        Self::DecliningBalance {
            rate,
            switch_to_straight_line: true,
        }
    }

    /// Double-declining balance for the given life, with the straight-line switch.
    ///
    /// ```
    /// use fixedledger_core::DepreciationMethod;
    /// use rust_decimal_macros::dec;
    ///
    /// let method = DepreciationMethod::double_declining(5);
    /// assert_eq!(method, DepreciationMethod::declining_balance_with_switch(dec!(0.4)));
    /// ```
    #[must_use]
    pub fn double_declining(life_periods: u32) -> Self {
        let rate = Decimal::TWO / Decimal::from(life_periods.max(1));
        Self::declining_balance_with_switch(rate.normalize())
    }

    /// Units of production with a planned usage profile.
    #[must_use]
    pub fn units_of_production(total_units: Decimal, usage: Vec<Decimal>) -> Self {
        Self::UnitsOfProduction { total_units, usage }
    }

    /// Whether the schedule length is driven by the useful life.
    #[must_use]
    pub const fn is_time_based(&self) -> bool {
        !matches!(self, Self::UnitsOfProduction { .. })
    }

    /// Human-readable label for schedule tables and timelines.
    ///
    /// ```
    /// use fixedledger_core::DepreciationMethod;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(DepreciationMethod::StraightLine.label(), "Straight-line");
    /// assert_eq!(
    ///     DepreciationMethod::declining_balance_with_switch(dec!(0.4)).label(),
    ///     "Declining balance (40%) → straight-line"
    /// );
    /// ```
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::StraightLine => "Straight-line".to_string(),
            Self::DecliningBalance {
                rate,
                switch_to_straight_line,
            } => {
                let percent = (*rate * Decimal::ONE_HUNDRED).normalize();
                if *switch_to_straight_line {
                    format!("Declining balance ({percent}%) → straight-line")
                } else {
                    format!("Declining balance ({percent}%)")
                }
            }
            Self::UnitsOfProduction { .. } => "Units of production".to_string(),
        }
    }
}

/// Error parsing the compact method notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid depreciation method '{input}': {reason}")]
pub struct ParseMethodError {
    /// The rejected input.
    pub input: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl FromStr for DepreciationMethod {
    type Err = ParseMethodError;

    /// Parse `sl`, `db:<rate>`, `db-sl:<rate>` or `uop:<total units>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseMethodError {
            input: s.to_string(),
            reason,
        };
        let (name, param) = match s.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (s, None),
        };
        let number = || -> Result<Decimal, ParseMethodError> {
            param
                .ok_or_else(|| err("missing parameter"))?
                .trim()
                .parse::<Decimal>()
                .map_err(|_| err("parameter is not a decimal number"))
        };

        match name.trim().to_ascii_lowercase().as_str() {
            "sl" | "straight-line" | "straight_line" => Ok(Self::StraightLine),
            "db" | "declining-balance" => Ok(Self::declining_balance(number()?)),
            "db-sl" | "ddb" => Ok(Self::declining_balance_with_switch(number()?)),
            "uop" | "units" => Ok(Self::units_of_production(number()?, Vec::new())),
            _ => Err(err("unknown method")),
        }
    }
}

impl fmt::Display for DepreciationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StraightLine => write!(f, "sl"),
            Self::DecliningBalance {
                rate,
                switch_to_straight_line: false,
            } => write!(f, "db:{rate}"),
            Self::DecliningBalance {
                rate,
                switch_to_straight_line: true,
            } => write!(f, "db-sl:{rate}"),
            Self::UnitsOfProduction { total_units, .. } => write!(f, "uop:{total_units}"),
        }
    }
}

/// Which rule produced a schedule entry's charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeBasis {
    /// Straight-line method.
    StraightLine,
    /// Declining balance, before any crossover.
    DecliningBalance,
    /// Declining balance after the permanent switch to straight-line.
    SwitchedToStraightLine,
    /// Units of production.
    Units,
}

impl fmt::Display for ChargeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::StraightLine => "SL",
            Self::DecliningBalance => "DB",
            Self::SwitchedToStraightLine => "DB→SL",
            Self::Units => "UOP",
        })
    }
}
