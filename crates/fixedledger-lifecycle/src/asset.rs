//! The asset aggregate.

use chrono::{NaiveDate, Utc};
use fixedledger_core::{
    AssetBook, AssetEvent, AssetEventKind, AssetId, AssetStatus, BookType, Classification,
    DepreciationSchedule, Disposal, EventId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::command::BookSpec;
use crate::LifecycleError;

/// An asset: identity, status, one book per book type and the event log.
///
/// Books and status are a cache of current state; the event log is the
/// append-only history that explains them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Stable id.
    pub id: AssetId,
    /// Human-facing asset number.
    pub asset_number: String,
    /// Name.
    pub name: String,
    /// Category and subcategory.
    pub classification: Classification,
    /// Serial number.
    pub serial_number: Option<String>,
    /// Current location.
    pub location: Option<String>,
    /// Lifecycle status.
    pub status: AssetStatus,
    /// The book that drives automatic status changes.
    pub primary_book: BookType,
    /// Books keyed by type.
    pub books: BTreeMap<BookType, AssetBook>,
    /// Book requests as given at creation.
    pub book_specs: Vec<BookSpec>,
    /// Acquisition date, once capitalized.
    pub acquisition_date: Option<NaiveDate>,
    /// Disposal record, once disposed.
    pub disposal: Option<Disposal>,
    events: Vec<AssetEvent>,
}

impl Asset {
    pub(crate) fn new(
        asset_number: String,
        name: String,
        classification: Classification,
        primary_book: BookType,
    ) -> Self {
        Self {
            id: AssetId::generate(),
            asset_number,
            name,
            classification,
            serial_number: None,
            location: None,
            status: AssetStatus::Draft,
            primary_book,
            books: BTreeMap::new(),
            book_specs: Vec::new(),
            acquisition_date: None,
            disposal: None,
            events: Vec::new(),
        }
    }

    /// Look up a book.
    pub fn book(&self, book_type: BookType) -> Result<&AssetBook, LifecycleError> {
        self.books
            .get(&book_type)
            .ok_or(LifecycleError::BookNotFound(book_type))
    }

    /// The primary book.
    pub fn primary(&self) -> Result<&AssetBook, LifecycleError> {
        self.book(self.primary_book)
    }

    /// Book types in use.
    pub fn book_types(&self) -> impl Iterator<Item = BookType> + '_ {
        self.books.keys().copied()
    }

    /// Current carrying value of a book.
    pub fn book_value(&self, book_type: BookType) -> Result<Decimal, LifecycleError> {
        Ok(self.book(book_type)?.book_value())
    }

    /// Carrying value of a book at the end of `as_of`, read from the event log.
    ///
    /// Every value-moving event whose effective date is on or before `as_of`
    /// contributes its change, whatever position it holds in the log. A
    /// depreciation posting is effective at the end of the period it charges.
    /// Before the book was capitalized the value is zero.
    pub fn book_value_as_of(
        &self,
        book_type: BookType,
        as_of: NaiveDate,
    ) -> Result<Decimal, LifecycleError> {
        self.book(book_type)?;
        Ok(self
            .events
            .iter()
            .filter(|e| e.effective_date <= as_of)
            .filter_map(AssetEvent::carrying_change)
            .filter(|(book, _)| *book == book_type)
            .map(|(_, change)| change)
            .sum())
    }

    /// A book's schedule.
    pub fn schedule(&self, book_type: BookType) -> Result<&DepreciationSchedule, LifecycleError> {
        Ok(&self.book(book_type)?.schedule)
    }

    /// The event log, oldest first.
    #[must_use]
    pub fn events(&self) -> &[AssetEvent] {
        &self.events
    }

    /// Append an event and return a copy of it.
    pub(crate) fn record(
        &mut self,
        effective_date: NaiveDate,
        actor: &str,
        reason: Option<&str>,
        kind: AssetEventKind,
    ) -> AssetEvent {
        let event = AssetEvent {
            id: EventId::generate(),
            asset_id: self.id,
            sequence: self.events.len() as u64 + 1,
            timestamp: Utc::now(),
            effective_date,
            actor: actor.to_string(),
            reason: reason.filter(|r| !r.is_empty()).map(str::to_string),
            kind,
        };
        self.events.push(event.clone());
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixedledger_core::{DepreciationMethod, StatusChange};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn asset() -> Asset {
        let mut asset = Asset::new(
            "FA-001".to_string(),
            "Forklift".to_string(),
            Classification::new("Machinery"),
            BookType::Statutory,
        );
        asset.books.insert(
            BookType::Statutory,
            AssetBook::new(
                BookType::Statutory,
                dec!(12000),
                dec!(0),
                4,
                DepreciationMethod::StraightLine,
                date(2024, 1, 1),
            ),
        );
        asset
    }

    #[test]
    fn test_record_sequences_events() {
        let mut asset = asset();
        let first = asset.record(
            date(2024, 1, 1),
            "alice",
            None,
            AssetEventKind::Acquired {
                cost: dec!(12000),
                status: StatusChange::new(AssetStatus::Draft, AssetStatus::Active),
            },
        );
        let second = asset.record(
            date(2024, 1, 1),
            "alice",
            Some(""),
            AssetEventKind::Capitalized {
                book: BookType::Statutory,
                cost: dec!(12000),
            },
        );
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert!(second.reason.is_none());
        assert_eq!(asset.events().len(), 2);
        assert_eq!(first.asset_id, asset.id);
    }

    #[test]
    fn test_book_value_as_of_reads_events() {
        let mut asset = asset();
        asset.record(
            date(2024, 1, 1),
            "alice",
            None,
            AssetEventKind::Capitalized {
                book: BookType::Statutory,
                cost: dec!(12000),
            },
        );
        asset.record(
            date(2024, 12, 31),
            "batch",
            None,
            AssetEventKind::DepreciationPosted {
                book: BookType::Statutory,
                period_number: 1,
                amount: dec!(3000),
                previous_value: dec!(12000),
                new_value: dec!(9000),
                status: None,
            },
        );

        let book = BookType::Statutory;
        assert_eq!(asset.book_value_as_of(book, date(2023, 12, 31)).unwrap(), dec!(0));
        assert_eq!(asset.book_value_as_of(book, date(2024, 6, 30)).unwrap(), dec!(12000));
        assert_eq!(asset.book_value_as_of(book, date(2025, 1, 1)).unwrap(), dec!(9000));
        assert_eq!(
            asset.book_value_as_of(BookType::Tax, date(2025, 1, 1)),
            Err(LifecycleError::BookNotFound(BookType::Tax))
        );
    }

    #[test]
    fn test_book_value_as_of_orders_by_effective_date() {
        let mut asset = asset();
        let book = BookType::Statutory;
        asset.record(
            date(2024, 1, 1),
            "alice",
            None,
            AssetEventKind::Capitalized {
                book,
                cost: dec!(12000),
            },
        );
        asset.record(
            date(2024, 12, 31),
            "batch",
            None,
            AssetEventKind::DepreciationPosted {
                book,
                period_number: 1,
                amount: dec!(3000),
                previous_value: dec!(12000),
                new_value: dec!(9000),
                status: None,
            },
        );
        // Recorded after the posting, effective mid-year.
        asset.record(
            date(2024, 6, 30),
            "alice",
            None,
            AssetEventKind::ImpairmentRecorded {
                book,
                loss: dec!(1000),
                previous_value: dec!(9000),
                new_value: dec!(8000),
                status: None,
            },
        );

        assert_eq!(asset.book_value_as_of(book, date(2024, 3, 31)).unwrap(), dec!(12000));
        assert_eq!(asset.book_value_as_of(book, date(2024, 6, 30)).unwrap(), dec!(11000));
        assert_eq!(asset.book_value_as_of(book, date(2024, 12, 31)).unwrap(), dec!(8000));
        assert_eq!(asset.book_value_as_of(book, date(2024, 12, 31)).unwrap(), asset.book_value(book).unwrap());
    }
}
