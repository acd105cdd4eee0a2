//! Schedule generation.
//!
//! The generator turns a book's parameters into schedule entries. Posted
//! entries are history and are never touched: regeneration rebuilds only the
//! unposted tail, opening at the book's current carrying value.

use fixedledger_core::{AssetBook, BookType, ChargeBasis, DepreciationMethod, DepreciationSchedule, ScheduleEntry};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::methods::{
    project, validate_basis, validate_method, MethodError, ProjectionStart, DEFAULT_MAX_PERIODS,
};

/// Error raised while building a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The book's parameters are unusable.
    #[error("{book} book: {source}")]
    Method {
        /// The book.
        book: BookType,
        /// Underlying method error.
        #[source]
        source: MethodError,
    },
    /// The book was closed by a disposal or write-off.
    #[error("{book} book is closed")]
    Frozen {
        /// The book.
        book: BookType,
    },
    /// A period date falls outside the calendar.
    #[error("{book} book: period {period} is out of the supported date range")]
    DateOutOfRange {
        /// The book.
        book: BookType,
        /// The period.
        period: u32,
    },
    /// The projected tail does not bring the book down to salvage.
    #[error("{book} book: schedule charges {actual} but {expected} remains to depreciate")]
    Reconciliation {
        /// The book.
        book: BookType,
        /// Opening value less salvage.
        expected: Decimal,
        /// Sum of the projected charges.
        actual: Decimal,
    },
    /// Consecutive entries do not chain.
    #[error("{book} book: period {period}: {message}")]
    Continuity {
        /// The book.
        book: BookType,
        /// First offending period.
        period: u32,
        /// What is wrong.
        message: String,
    },
}

impl ScheduleError {
    /// Whether the error means the generator produced an inconsistent
    /// schedule rather than the caller passing bad parameters.
    #[must_use]
    pub const fn is_reconciliation(&self) -> bool {
        matches!(self, Self::Reconciliation { .. } | Self::Continuity { .. })
    }
}

/// Result of regenerating a book's tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationOutcome {
    /// Number of projected periods.
    pub periods: usize,
    /// Shortfall below salvage, when the book needs a write-down first.
    pub write_down_required: Option<Decimal>,
}

/// Builds depreciation schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleGenerator {
    max_periods: u32,
}

impl Default for ScheduleGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PERIODS)
    }
}

impl ScheduleGenerator {
    /// Create a generator that refuses schedules longer than `max_periods`.
    #[must_use]
    pub const fn new(max_periods: u32) -> Self {
        Self { max_periods }
    }

    /// The period limit.
    #[must_use]
    pub const fn max_periods(&self) -> u32 {
        self.max_periods
    }

    /// Check a book's parameters without building anything.
    pub fn validate(&self, book: &AssetBook) -> Result<(), ScheduleError> {
        let method_error = |source| ScheduleError::Method {
            book: book.book_type,
            source,
        };
        // Fair-value revaluations may carry a book above its cost.
        let basis = book.acquisition_cost.max(book.carrying_basis());
        validate_basis(basis, book.salvage_value, book.useful_life_periods)
            .map_err(method_error)?;
        validate_method(&book.method).map_err(method_error)
    }

    /// Project the unposted tail of a book.
    ///
    /// Returns the new tail together with the write-down shortfall when the
    /// carrying value is already below salvage (in which case the tail is
    /// empty).
    pub fn project_tail(
        &self,
        book: &AssetBook,
    ) -> Result<(Vec<ScheduleEntry>, Option<Decimal>), ScheduleError> {
        if book.is_frozen() {
            return Err(ScheduleError::Frozen {
                book: book.book_type,
            });
        }
        let opening = book.carrying_basis();
        if opening < book.salvage_value {
            let shortfall = book.salvage_value - opening;
            warn!(
                book = %book.book_type,
                %shortfall,
                "carrying value below salvage, write-down required"
            );
            return Ok((Vec::new(), Some(shortfall)));
        }
        self.validate(book)?;

        let posted = book.schedule.posted();
        let posted_count = posted.len() as u32;
        let last_posted = posted.last();
        let already_switched = last_posted
            .is_some_and(|e| e.charge_basis == ChargeBasis::SwitchedToStraightLine);

        let start = ProjectionStart {
            opening_value: opening,
            salvage_value: book.salvage_value,
            first_period: posted_count + 1,
            remaining_periods: book.useful_life_periods.saturating_sub(posted_count),
            already_switched,
            units_remaining: match &book.method {
                DepreciationMethod::UnitsOfProduction { total_units, .. } => {
                    *total_units - book.units_consumed()
                }
                _ => Decimal::ZERO,
            },
        };
        let charges = project(&book.method, &start, self.max_periods).map_err(|source| {
            ScheduleError::Method {
                book: book.book_type,
                source,
            }
        })?;

        let mut entries = Vec::with_capacity(charges.len());
        let mut value = opening;
        let mut accumulated = book.accumulated_depreciation;
        let mut adjustment = last_posted.map_or(Decimal::ZERO, |e| opening - e.closing_book_value);
        for (offset, charge) in charges.iter().enumerate() {
            let period_number = start.first_period + offset as u32;
            let (Some(period_start), Some(period_end)) = (
                book.cadence.period_start(book.in_service_date, period_number),
                book.cadence.period_end(book.in_service_date, period_number),
            ) else {
                return Err(ScheduleError::DateOutOfRange {
                    book: book.book_type,
                    period: period_number,
                });
            };
            accumulated += charge.amount;
            entries.push(ScheduleEntry {
                period_number,
                period_start,
                period_end,
                opening_book_value: value,
                depreciation_amount: charge.amount,
                accumulated_depreciation: accumulated,
                closing_book_value: value - charge.amount,
                is_posted: false,
                charge_basis: charge.basis,
                units: charge.units,
                basis_adjustment: adjustment,
            });
            value -= charge.amount;
            adjustment = Decimal::ZERO;
        }

        debug!(
            book = %book.book_type,
            first_period = start.first_period,
            periods = entries.len(),
            "projected schedule tail"
        );
        Ok((entries, None))
    }

    /// Build a book's full schedule: its posted history plus a fresh tail.
    pub fn generate(&self, book: &AssetBook) -> Result<DepreciationSchedule, ScheduleError> {
        let (tail, _) = self.project_tail(book)?;
        let mut schedule = book.schedule.clone();
        schedule.replace_unposted(tail);
        reconcile(book, &schedule)?;
        Ok(schedule)
    }

    /// Rebuild the unposted tail of a book in place.
    ///
    /// On error the book is left unchanged.
    pub fn regenerate(&self, book: &mut AssetBook) -> Result<RegenerationOutcome, ScheduleError> {
        let (tail, write_down_required) = self.project_tail(book)?;
        let mut schedule = book.schedule.clone();
        schedule.replace_unposted(tail);
        reconcile(book, &schedule)?;

        let periods = schedule.unposted().len();
        book.schedule = schedule;
        book.write_down_required = write_down_required;
        Ok(RegenerationOutcome {
            periods,
            write_down_required,
        })
    }
}

/// Check that a schedule chains and that its tail ends at salvage.
pub fn reconcile(book: &AssetBook, schedule: &DepreciationSchedule) -> Result<(), ScheduleError> {
    schedule.check_continuity().map_err(|brk| {
        error!(
            book = %book.book_type,
            period = brk.period_number,
            message = %brk.message,
            "schedule continuity check failed"
        );
        ScheduleError::Continuity {
            book: book.book_type,
            period: brk.period_number,
            message: brk.message,
        }
    })?;

    let tail = schedule.unposted();
    let Some(first) = tail.first() else {
        return Ok(());
    };
    let expected = first.opening_book_value - book.salvage_value;
    let actual: Decimal = tail.iter().map(|e| e.depreciation_amount).sum();
    let negative = tail.iter().any(|e| e.depreciation_amount < Decimal::ZERO);
    if actual != expected || negative {
        error!(
            book = %book.book_type,
            %expected,
            %actual,
            "schedule does not reconcile"
        );
        return Err(ScheduleError::Reconciliation {
            book: book.book_type,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fixedledger_core::{AdjustmentKind, ImpairmentAdjustment, PostingCadence};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn annual_book(cost: Decimal, salvage: Decimal, life: u32, method: DepreciationMethod) -> AssetBook {
        AssetBook::new(BookType::Statutory, cost, salvage, life, method, date(2024, 1, 1))
            .with_cadence(PostingCadence::Annual)
    }

    fn post(book: &mut AssetBook) {
        let amount = book.schedule.post_next().unwrap().depreciation_amount;
        book.accumulated_depreciation += amount;
    }

    #[test]
    fn test_generate_fresh_schedule() {
        let mut book = annual_book(dec!(12000), dec!(0), 4, DepreciationMethod::StraightLine);
        let outcome = ScheduleGenerator::default().regenerate(&mut book).unwrap();
        assert_eq!(outcome.periods, 4);
        assert_eq!(outcome.write_down_required, None);

        let entries = book.schedule.entries();
        assert_eq!(entries[0].period_start, date(2024, 1, 1));
        assert_eq!(entries[0].period_end, date(2024, 12, 31));
        assert_eq!(entries[3].period_start, date(2027, 1, 1));
        assert_eq!(entries[3].closing_book_value, dec!(0));
        assert_eq!(entries[3].accumulated_depreciation, dec!(12000));
        assert!(entries.iter().all(|e| e.basis_adjustment.is_zero()));
    }

    #[test]
    fn test_regenerate_keeps_posted_history() {
        let generator = ScheduleGenerator::default();
        let mut book = annual_book(dec!(12000), dec!(0), 4, DepreciationMethod::StraightLine);
        generator.regenerate(&mut book).unwrap();
        post(&mut book);
        let first = book.schedule.entries()[0].clone();

        book.useful_life_periods = 7;
        generator.regenerate(&mut book).unwrap();

        assert_eq!(book.schedule.entries()[0], first);
        assert_eq!(book.schedule.len(), 7);
        assert_eq!(book.schedule.entries()[1].depreciation_amount, dec!(1500));
        assert_eq!(book.schedule.final_closing_value(), Some(dec!(0)));
    }

    #[test]
    fn test_regeneration_is_idempotent() {
        let generator = ScheduleGenerator::default();
        let mut book = annual_book(
            dec!(10000),
            dec!(500),
            6,
            DepreciationMethod::declining_balance_with_switch(dec!(0.4)),
        );
        generator.regenerate(&mut book).unwrap();
        post(&mut book);
        post(&mut book);
        let once = generator.generate(&book).unwrap();
        generator.regenerate(&mut book).unwrap();
        assert_eq!(book.schedule, once);
    }

    #[test]
    fn test_impairment_records_basis_adjustment() {
        let generator = ScheduleGenerator::default();
        let mut book = annual_book(dec!(12000), dec!(0), 4, DepreciationMethod::StraightLine);
        generator.regenerate(&mut book).unwrap();
        post(&mut book);
        book.impairment_adjustments.push(ImpairmentAdjustment {
            date: date(2025, 1, 1),
            kind: AdjustmentKind::Impairment,
            amount: dec!(3000),
            new_carrying_basis: dec!(6000),
        });
        generator.regenerate(&mut book).unwrap();

        let tail = book.schedule.unposted();
        assert_eq!(tail[0].opening_book_value, dec!(6000));
        assert_eq!(tail[0].basis_adjustment, dec!(-3000));
        assert_eq!(tail[0].depreciation_amount, dec!(2000));
        assert!(book.schedule.check_continuity().is_ok());
    }

    #[test]
    fn test_below_salvage_flags_write_down() {
        let generator = ScheduleGenerator::default();
        let mut book = annual_book(dec!(10000), dec!(2000), 5, DepreciationMethod::StraightLine);
        generator.regenerate(&mut book).unwrap();
        book.acquisition_cost = dec!(1500);
        let outcome = generator.regenerate(&mut book).unwrap();
        assert_eq!(outcome.write_down_required, Some(dec!(500)));
        assert_eq!(book.write_down_required, Some(dec!(500)));
        assert!(book.schedule.is_empty());
    }

    #[test]
    fn test_switch_persists_across_regeneration() {
        let generator = ScheduleGenerator::default();
        let mut book = annual_book(
            dec!(10000),
            dec!(0),
            5,
            DepreciationMethod::declining_balance_with_switch(dec!(0.4)),
        );
        generator.regenerate(&mut book).unwrap();
        for _ in 0..4 {
            post(&mut book);
        }
        generator.regenerate(&mut book).unwrap();
        let last = &book.schedule.entries()[4];
        assert_eq!(last.charge_basis, ChargeBasis::SwitchedToStraightLine);
        assert_eq!(last.depreciation_amount, dec!(1080));
    }

    #[test]
    fn test_units_of_production_uses_remaining_capacity() {
        let generator = ScheduleGenerator::default();
        let method = DepreciationMethod::units_of_production(dec!(1000), vec![dec!(250)]);
        let mut book = annual_book(dec!(4000), dec!(0), 1, method);
        generator.regenerate(&mut book).unwrap();
        assert_eq!(book.schedule.len(), 4);
        post(&mut book);

        if let DepreciationMethod::UnitsOfProduction { usage, .. } = &mut book.method {
            usage.push(dec!(750));
        }
        generator.regenerate(&mut book).unwrap();
        assert_eq!(book.schedule.len(), 2);
        let tail = book.schedule.unposted();
        assert_eq!(tail[0].units, Some(dec!(750)));
        assert_eq!(tail[0].depreciation_amount, dec!(3000));
    }

    #[test]
    fn test_life_exhausted_with_value_left() {
        let generator = ScheduleGenerator::default();
        let mut book = annual_book(dec!(1000), dec!(0), 2, DepreciationMethod::StraightLine);
        generator.regenerate(&mut book).unwrap();
        post(&mut book);
        post(&mut book);
        book.acquisition_cost = dec!(1200);
        let err = generator.regenerate(&mut book).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Method {
                source: MethodError::NoRemainingLife { .. },
                ..
            }
        ));
        assert_eq!(book.acquisition_cost, dec!(1200));
        assert_eq!(book.schedule.len(), 2);
    }

    #[test]
    fn test_frozen_book_is_refused() {
        let mut book = annual_book(dec!(1000), dec!(0), 2, DepreciationMethod::StraightLine);
        book.frozen_on = Some(date(2024, 6, 30));
        assert_eq!(
            ScheduleGenerator::default().regenerate(&mut book),
            Err(ScheduleError::Frozen {
                book: BookType::Statutory
            })
        );
    }

    #[test]
    fn test_reconcile_detects_bad_tail() {
        let generator = ScheduleGenerator::default();
        let book = annual_book(dec!(1000), dec!(0), 2, DepreciationMethod::StraightLine);
        let mut schedule = generator.generate(&book).unwrap();
        let mut tail = schedule.unposted().to_vec();
        tail[1].depreciation_amount = dec!(400);
        tail[1].closing_book_value = dec!(100);
        schedule.replace_unposted(tail);
        let err = reconcile(&book, &schedule).unwrap_err();
        assert!(err.is_reconciliation());
    }

    #[test]
    fn test_period_limit_applies() {
        let generator = ScheduleGenerator::new(24);
        let book = AssetBook::new(
            BookType::Tax,
            dec!(1000),
            dec!(0),
            36,
            DepreciationMethod::StraightLine,
            date(2024, 1, 1),
        );
        assert!(matches!(
            generator.generate(&book),
            Err(ScheduleError::Method {
                source: MethodError::TooManyPeriods { limit: 24 },
                ..
            })
        ));
    }
}
