//! Whether a book may post depreciation for a period.

use chrono::NaiveDate;
use fixedledger_core::{AssetBook, AssetStatus, ScheduleEntry};
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a book cannot post depreciation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ineligibility {
    /// The asset's status does not allow depreciation.
    #[error("asset status {0} does not allow depreciation")]
    Status(AssetStatus),
    /// The book was closed by a disposal or write-off.
    #[error("book is closed")]
    Frozen,
    /// The carrying value is below salvage and must be written down first.
    #[error("carrying value is {shortfall} below salvage; record a write-down first")]
    WriteDownRequired {
        /// Salvage less carrying value.
        shortfall: Decimal,
    },
    /// Book value has reached salvage.
    #[error("book is fully depreciated")]
    FullyDepreciated,
    /// The posting period ends before the asset entered service.
    #[error("asset enters service on {in_service}")]
    BeforeInService {
        /// In-service date.
        in_service: NaiveDate,
    },
    /// The next period has not started by the posting date.
    #[error("next period starts on {next_start}")]
    NotDue {
        /// Start of the next unposted period.
        next_start: NaiveDate,
    },
    /// No unposted periods remain.
    #[error("schedule has no unposted periods")]
    ScheduleExhausted,
}

/// Find the entry a book would post for `period_end`, or the reason it can't.
///
/// The next unposted entry is due once its period has started on or before
/// `period_end`.
pub fn next_due_entry(
    book: &AssetBook,
    status: AssetStatus,
    period_end: NaiveDate,
) -> Result<&ScheduleEntry, Ineligibility> {
    if !status.accepts_depreciation() {
        return Err(Ineligibility::Status(status));
    }
    if book.is_frozen() {
        return Err(Ineligibility::Frozen);
    }
    if let Some(shortfall) = book.write_down_required {
        return Err(Ineligibility::WriteDownRequired { shortfall });
    }
    if book.is_fully_depreciated() {
        return Err(Ineligibility::FullyDepreciated);
    }
    if period_end < book.in_service_date {
        return Err(Ineligibility::BeforeInService {
            in_service: book.in_service_date,
        });
    }
    let entry = book
        .schedule
        .next_unposted()
        .ok_or(Ineligibility::ScheduleExhausted)?;
    if entry.period_start > period_end {
        return Err(Ineligibility::NotDue {
            next_start: entry.period_start,
        });
    }
    Ok(entry)
}

/// Whether a book may post depreciation for the period ending `period_end`.
#[must_use]
pub fn can_depreciate(book: &AssetBook, status: AssetStatus, period_end: NaiveDate) -> bool {
    next_due_entry(book, status, period_end).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScheduleGenerator;
    use fixedledger_core::{BookType, DepreciationMethod};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn scheduled_book() -> AssetBook {
        let mut book = AssetBook::new(
            BookType::Statutory,
            dec!(3600),
            dec!(0),
            36,
            DepreciationMethod::StraightLine,
            date(2024, 3, 1),
        );
        ScheduleGenerator::default().regenerate(&mut book).unwrap();
        book
    }

    #[test]
    fn test_active_book_is_due() {
        let book = scheduled_book();
        let entry = next_due_entry(&book, AssetStatus::Active, date(2024, 3, 31)).unwrap();
        assert_eq!(entry.period_number, 1);
        assert!(can_depreciate(&book, AssetStatus::Impaired, date(2024, 3, 31)));
    }

    #[test]
    fn test_status_blocks() {
        let book = scheduled_book();
        for status in [
            AssetStatus::Draft,
            AssetStatus::HeldForSale,
            AssetStatus::Disposed,
            AssetStatus::WrittenOff,
        ] {
            assert_eq!(
                next_due_entry(&book, status, date(2024, 3, 31)),
                Err(Ineligibility::Status(status))
            );
        }
    }

    #[test]
    fn test_before_in_service() {
        let book = scheduled_book();
        assert_eq!(
            next_due_entry(&book, AssetStatus::Active, date(2024, 2, 29)),
            Err(Ineligibility::BeforeInService {
                in_service: date(2024, 3, 1)
            })
        );
    }

    #[test]
    fn test_next_period_not_due() {
        let mut book = scheduled_book();
        book.schedule.post_next();
        book.accumulated_depreciation = dec!(100);
        assert_eq!(
            next_due_entry(&book, AssetStatus::Active, date(2024, 3, 31)),
            Err(Ineligibility::NotDue {
                next_start: date(2024, 4, 1)
            })
        );
    }

    #[test]
    fn test_write_down_and_fully_depreciated() {
        let mut book = scheduled_book();
        book.write_down_required = Some(dec!(25));
        assert_eq!(
            next_due_entry(&book, AssetStatus::Active, date(2024, 3, 31)),
            Err(Ineligibility::WriteDownRequired {
                shortfall: dec!(25)
            })
        );

        book.write_down_required = None;
        book.accumulated_depreciation = dec!(3600);
        assert!(!can_depreciate(&book, AssetStatus::Active, date(2030, 1, 31)));
    }
}
