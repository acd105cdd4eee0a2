//! Asset books: one depreciation ledger per accounting regime.
//!
//! An [`AssetBook`] holds the cost basis, salvage value, useful life and method
//! of one asset under one [`BookType`], together with its posted depreciation,
//! impairment/revaluation adjustments, capitalized components and schedule.
//! Books of different types never share state.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DepreciationMethod, DepreciationSchedule};

/// Independent depreciation regime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BookType {
    /// Statutory accounts.
    #[default]
    Statutory,
    /// Tax depreciation.
    Tax,
    /// Internal management reporting.
    Management,
    /// IFRS reporting.
    Ifrs,
}

impl BookType {
    /// All book types, in display order.
    pub const ALL: [Self; 4] = [Self::Statutory, Self::Tax, Self::Management, Self::Ifrs];
}

impl FromStr for BookType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "statutory" => Ok(Self::Statutory),
            "tax" => Ok(Self::Tax),
            "management" => Ok(Self::Management),
            "ifrs" => Ok(Self::Ifrs),
            _ => Err(format!("unknown book type: {s}")),
        }
    }
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Statutory => "statutory",
            Self::Tax => "tax",
            Self::Management => "management",
            Self::Ifrs => "ifrs",
        })
    }
}

/// How often a book posts depreciation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingCadence {
    /// Every calendar month.
    #[default]
    Monthly,
    /// Every three months.
    Quarterly,
    /// Every six months.
    SemiAnnual,
    /// Every twelve months.
    Annual,
}

impl PostingCadence {
    /// Length of one period in months.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnual => 6,
            Self::Annual => 12,
        }
    }

    /// First day of the given 1-based period.
    ///
    /// ```
    /// use fixedledger_core::PostingCadence;
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    /// assert_eq!(
    ///     PostingCadence::Monthly.period_start(start, 2),
    ///     NaiveDate::from_ymd_opt(2024, 2, 29)
    /// );
    /// ```
    #[must_use]
    pub fn period_start(self, in_service: NaiveDate, period_number: u32) -> Option<NaiveDate> {
        let offset = period_number.checked_sub(1)?.checked_mul(self.months())?;
        in_service.checked_add_months(Months::new(offset))
    }

    /// Last day of the given 1-based period.
    #[must_use]
    pub fn period_end(self, in_service: NaiveDate, period_number: u32) -> Option<NaiveDate> {
        self.period_start(in_service, period_number.checked_add(1)?)?
            .checked_sub_days(Days::new(1))
    }
}

impl FromStr for PostingCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semi-annual" | "semi_annual" | "semiannual" => Ok(Self::SemiAnnual),
            "annual" | "yearly" => Ok(Self::Annual),
            _ => Err(format!("unknown posting cadence: {s}")),
        }
    }
}

impl fmt::Display for PostingCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnual => "semi-annual",
            Self::Annual => "annual",
        })
    }
}

/// What produced a carrying-value adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Write-down to recoverable amount.
    Impairment,
    /// Write-up to fair value.
    Revaluation,
}

/// A non-routine change of carrying value.
///
/// `amount` is the reduction in carrying value: positive for an impairment,
/// negative for a revaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpairmentAdjustment {
    /// Effective date.
    pub date: NaiveDate,
    /// Impairment or revaluation.
    pub kind: AdjustmentKind,
    /// Reduction in carrying value (negative for write-ups).
    pub amount: Decimal,
    /// Carrying value after the adjustment.
    pub new_carrying_basis: Decimal,
}

/// A separately capitalized part of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component name, unique within the book.
    pub name: String,
    /// Capitalized cost.
    pub cost: Decimal,
    /// Date the component was capitalized.
    pub added_on: NaiveDate,
}

/// One depreciation ledger for one asset under one book type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBook {
    /// The regime this book belongs to.
    pub book_type: BookType,
    /// Capitalized cost, including components.
    pub acquisition_cost: Decimal,
    /// Residual value at the end of the useful life.
    pub salvage_value: Decimal,
    /// Salvage value as capitalized, before any impairment capped it.
    #[serde(default)]
    pub capitalized_salvage: Decimal,
    /// Useful life in posting periods.
    pub useful_life_periods: u32,
    /// Depreciation method and its parameters.
    pub method: DepreciationMethod,
    /// Posting cadence.
    pub cadence: PostingCadence,
    /// First day of the first period.
    pub in_service_date: NaiveDate,
    /// Sum of posted depreciation.
    pub accumulated_depreciation: Decimal,
    /// Impairments and revaluations, in order.
    pub impairment_adjustments: Vec<ImpairmentAdjustment>,
    /// Capitalized components.
    pub components: Vec<Component>,
    /// Revaluations may exceed original cost.
    pub fair_value_model: bool,
    /// The book's schedule.
    pub schedule: DepreciationSchedule,
    /// Shortfall below salvage that must be written down before posting resumes.
    pub write_down_required: Option<Decimal>,
    /// Date the book was closed by a disposal or write-off.
    pub frozen_on: Option<NaiveDate>,
}

impl AssetBook {
    /// Create a book with an empty schedule.
    #[must_use]
    pub fn new(
        book_type: BookType,
        acquisition_cost: Decimal,
        salvage_value: Decimal,
        useful_life_periods: u32,
        method: DepreciationMethod,
        in_service_date: NaiveDate,
    ) -> Self {
        Self {
            book_type,
            acquisition_cost,
            salvage_value,
            capitalized_salvage: salvage_value,
            useful_life_periods,
            method,
            cadence: PostingCadence::default(),
            in_service_date,
            accumulated_depreciation: Decimal::ZERO,
            impairment_adjustments: Vec::new(),
            components: Vec::new(),
            fair_value_model: false,
            schedule: DepreciationSchedule::new(),
            write_down_required: None,
            frozen_on: None,
        }
    }

    /// Set the posting cadence.
    #[must_use]
    pub const fn with_cadence(mut self, cadence: PostingCadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Mark this book as carried at fair value.
    #[must_use]
    pub const fn with_fair_value_model(mut self, fair_value: bool) -> Self {
        self.fair_value_model = fair_value;
        self
    }

    /// Net reduction in carrying value from impairments and revaluations.
    #[must_use]
    pub fn impairment_total(&self) -> Decimal {
        self.impairment_adjustments.iter().map(|a| a.amount).sum()
    }

    /// Carrying amount: cost less accumulated depreciation and impairment.
    ///
    /// A frozen book carries nothing.
    ///
    /// ```
    /// use fixedledger_core::{AssetBook, BookType, DepreciationMethod};
    /// use rust_decimal_macros::dec;
    /// use chrono::NaiveDate;
    ///
    /// let mut book = AssetBook::new(
    ///     BookType::Statutory,
    ///     dec!(12000),
    ///     dec!(0),
    ///     4,
    ///     DepreciationMethod::StraightLine,
    ///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    /// );
    /// book.accumulated_depreciation = dec!(3000);
    /// assert_eq!(book.book_value(), dec!(9000));
    /// ```
    #[must_use]
    pub fn book_value(&self) -> Decimal {
        if self.is_frozen() {
            return Decimal::ZERO;
        }
        self.acquisition_cost - self.accumulated_depreciation - self.impairment_total()
    }

    /// Carrying amount ignoring the frozen state.
    #[must_use]
    pub fn carrying_basis(&self) -> Decimal {
        self.acquisition_cost - self.accumulated_depreciation - self.impairment_total()
    }

    /// Depreciation still to be charged before reaching salvage.
    #[must_use]
    pub fn remaining_depreciable(&self) -> Decimal {
        self.book_value() - self.salvage_value
    }

    /// Whether nothing remains to depreciate.
    #[must_use]
    pub fn is_fully_depreciated(&self) -> bool {
        self.remaining_depreciable() <= Decimal::ZERO
    }

    /// Whether the book has been closed.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen_on.is_some()
    }

    /// Number of posted periods.
    #[must_use]
    pub fn posted_periods(&self) -> u32 {
        self.schedule.posted_count() as u32
    }

    /// Units consumed by posted units-of-production periods.
    #[must_use]
    pub fn units_consumed(&self) -> Decimal {
        self.schedule.posted().iter().filter_map(|e| e.units).sum()
    }

    /// Look up a component by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn book() -> AssetBook {
        AssetBook::new(
            BookType::Tax,
            dec!(10000),
            dec!(1000),
            9,
            DepreciationMethod::StraightLine,
            date(2024, 1, 1),
        )
    }

    #[test]
    fn test_book_value_with_adjustments() {
        let mut book = book();
        book.accumulated_depreciation = dec!(2000);
        book.impairment_adjustments.push(ImpairmentAdjustment {
            date: date(2024, 3, 1),
            kind: AdjustmentKind::Impairment,
            amount: dec!(1500),
            new_carrying_basis: dec!(6500),
        });
        assert_eq!(book.book_value(), dec!(6500));
        assert_eq!(book.remaining_depreciable(), dec!(5500));

        book.impairment_adjustments.push(ImpairmentAdjustment {
            date: date(2024, 4, 1),
            kind: AdjustmentKind::Revaluation,
            amount: dec!(-500),
            new_carrying_basis: dec!(7000),
        });
        assert_eq!(book.impairment_total(), dec!(1000));
        assert_eq!(book.book_value(), dec!(7000));
    }

    #[test]
    fn test_frozen_book_carries_nothing() {
        let mut book = book();
        book.frozen_on = Some(date(2025, 1, 1));
        assert_eq!(book.book_value(), dec!(0));
        assert_eq!(book.carrying_basis(), dec!(10000));
    }

    #[test]
    fn test_fully_depreciated() {
        let mut book = book();
        assert!(!book.is_fully_depreciated());
        book.accumulated_depreciation = dec!(9000);
        assert!(book.is_fully_depreciated());
    }

    #[test]
    fn test_period_boundaries() {
        let start = date(2024, 1, 15);
        assert_eq!(
            PostingCadence::Monthly.period_start(start, 1),
            Some(date(2024, 1, 15))
        );
        assert_eq!(
            PostingCadence::Monthly.period_end(start, 1),
            Some(date(2024, 2, 14))
        );
        assert_eq!(
            PostingCadence::Quarterly.period_start(start, 3),
            Some(date(2024, 7, 15))
        );
        assert_eq!(
            PostingCadence::Annual.period_end(date(2024, 1, 1), 1),
            Some(date(2024, 12, 31))
        );
        assert_eq!(PostingCadence::Monthly.period_start(start, 0), None);
    }

    #[test]
    fn test_book_type_parse_display() {
        for book_type in BookType::ALL {
            assert_eq!(book_type.to_string().parse::<BookType>(), Ok(book_type));
        }
        assert!("gaap".parse::<BookType>().is_err());
    }

    #[test]
    fn test_cadence_parse() {
        assert_eq!("Quarterly".parse(), Ok(PostingCadence::Quarterly));
        assert_eq!("yearly".parse(), Ok(PostingCadence::Annual));
        assert!("weekly".parse::<PostingCadence>().is_err());
    }
}
