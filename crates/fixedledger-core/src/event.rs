//! The asset event log.
//!
//! Every lifecycle action appends one or more immutable [`AssetEvent`]s. The
//! payload is an [`AssetEventKind`] with one variant per kind of action, so a
//! new transition cannot be added without deciding what it records.
//!
//! Carrying values on book-affecting events are enough to reconstruct each
//! book's value at any date, see [`AssetEvent::carrying_value`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{AssetStatus, BookType, Classification, DepreciationMethod, DisposalType, StatusChange};

/// Stable identifier of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub Uuid);

impl AssetId {
    /// Generate a new time-ordered id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Generate a new time-ordered id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of an event, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetEventType {
    /// Asset recorded in draft.
    Created,
    /// Asset acquired.
    Acquired,
    /// A book capitalized the asset.
    Capitalized,
    /// A period's depreciation was recognized.
    DepreciationPosted,
    /// Carrying value written down.
    ImpairmentRecorded,
    /// Carrying value written up.
    RevaluationRecorded,
    /// Asset moved to another location.
    Transferred,
    /// Asset classified as held for sale.
    HeldForSale,
    /// A book closed by disposal other than sale.
    Disposed,
    /// A book closed by sale.
    Sold,
    /// A book closed by write-off.
    WrittenOff,
    /// A component was capitalized.
    ComponentAdded,
    /// A component was de-capitalized.
    ComponentRemoved,
    /// Useful life changed.
    UsefulLifeChanged,
    /// Depreciation method changed.
    MethodChanged,
}

impl fmt::Display for AssetEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Created => "created",
            Self::Acquired => "acquired",
            Self::Capitalized => "capitalized",
            Self::DepreciationPosted => "depreciation-posted",
            Self::ImpairmentRecorded => "impairment-recorded",
            Self::RevaluationRecorded => "revaluation-recorded",
            Self::Transferred => "transferred",
            Self::HeldForSale => "held-for-sale",
            Self::Disposed => "disposed",
            Self::Sold => "sold",
            Self::WrittenOff => "written-off",
            Self::ComponentAdded => "component-added",
            Self::ComponentRemoved => "component-removed",
            Self::UsefulLifeChanged => "useful-life-changed",
            Self::MethodChanged => "method-changed",
        })
    }
}

/// A before/after value recorded on an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    /// A monetary amount.
    Money(Decimal),
    /// A useful life in periods.
    Periods(u32),
    /// A depreciation method.
    Method(DepreciationMethod),
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Money(amount) => write!(f, "{amount}"),
            Self::Periods(periods) => write!(f, "{periods} periods"),
            Self::Method(method) => write!(f, "{}", method.label()),
        }
    }
}

/// Closing of one book by disposal or sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookClosing {
    /// The book being closed.
    pub book: BookType,
    /// How the asset left.
    pub disposal_type: DisposalType,
    /// Proceeds received.
    pub proceeds: Decimal,
    /// Carrying amount before closing.
    pub previous_value: Decimal,
    /// Proceeds less carrying amount.
    pub gain_or_loss: Decimal,
    /// Asset status transition.
    pub status: StatusChange,
}

/// Payload of an event, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AssetEventKind {
    /// Asset recorded in draft.
    Created {
        /// Classification at creation.
        classification: Classification,
        /// Books opened.
        books: Vec<BookType>,
    },
    /// Asset acquired and brought into service.
    Acquired {
        /// Acquisition cost of the primary book.
        cost: Decimal,
        /// `Draft → Active`.
        status: StatusChange,
    },
    /// A book capitalized the asset.
    Capitalized {
        /// The book.
        book: BookType,
        /// Capitalized cost.
        cost: Decimal,
    },
    /// A period's depreciation was recognized.
    DepreciationPosted {
        /// The book.
        book: BookType,
        /// Period posted.
        period_number: u32,
        /// Depreciation charged.
        amount: Decimal,
        /// Carrying value before.
        previous_value: Decimal,
        /// Carrying value after.
        new_value: Decimal,
        /// Automatic transition, if any.
        status: Option<StatusChange>,
    },
    /// Carrying value written down to a recoverable amount.
    ImpairmentRecorded {
        /// The book.
        book: BookType,
        /// Impairment loss.
        loss: Decimal,
        /// Carrying value before.
        previous_value: Decimal,
        /// Carrying value after.
        new_value: Decimal,
        /// Transition, if any.
        status: Option<StatusChange>,
    },
    /// Carrying value written up.
    RevaluationRecorded {
        /// The book.
        book: BookType,
        /// Increase in carrying value.
        increase: Decimal,
        /// Carrying value before.
        previous_value: Decimal,
        /// Carrying value after.
        new_value: Decimal,
        /// Transition, if any.
        status: Option<StatusChange>,
    },
    /// Asset moved.
    Transferred {
        /// Previous location.
        from_location: Option<String>,
        /// New location.
        to_location: String,
    },
    /// Asset classified as held for sale.
    HeldForSale {
        /// Transition into `HeldForSale`.
        status: StatusChange,
    },
    /// A book closed by a disposal other than sale.
    Disposed(BookClosing),
    /// A book closed by sale.
    Sold(BookClosing),
    /// A book closed by write-off.
    WrittenOff {
        /// The book.
        book: BookType,
        /// Carrying amount written off.
        loss: Decimal,
        /// Carrying value before.
        previous_value: Decimal,
        /// Transition into `WrittenOff`.
        status: StatusChange,
    },
    /// A component was capitalized.
    ComponentAdded {
        /// The book.
        book: BookType,
        /// Component name.
        name: String,
        /// Component cost.
        cost: Decimal,
        /// Carrying value before.
        previous_value: Decimal,
        /// Carrying value after.
        new_value: Decimal,
        /// Transition, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<StatusChange>,
    },
    /// A component was de-capitalized.
    ComponentRemoved {
        /// The book.
        book: BookType,
        /// Component name.
        name: String,
        /// Component cost removed.
        cost: Decimal,
        /// Carrying value before.
        previous_value: Decimal,
        /// Carrying value after.
        new_value: Decimal,
        /// Transition, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<StatusChange>,
    },
    /// Useful life changed.
    UsefulLifeChanged {
        /// The book.
        book: BookType,
        /// Previous life in periods.
        previous_life: u32,
        /// New life in periods.
        new_life: u32,
        /// Transition, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<StatusChange>,
    },
    /// Depreciation method changed.
    MethodChanged {
        /// The book.
        book: BookType,
        /// Previous method.
        previous_method: DepreciationMethod,
        /// New method.
        new_method: DepreciationMethod,
        /// Transition, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<StatusChange>,
    },
}

impl AssetEventKind {
    /// The event type tag.
    #[must_use]
    pub const fn event_type(&self) -> AssetEventType {
        match self {
            Self::Created { .. } => AssetEventType::Created,
            Self::Acquired { .. } => AssetEventType::Acquired,
            Self::Capitalized { .. } => AssetEventType::Capitalized,
            Self::DepreciationPosted { .. } => AssetEventType::DepreciationPosted,
            Self::ImpairmentRecorded { .. } => AssetEventType::ImpairmentRecorded,
            Self::RevaluationRecorded { .. } => AssetEventType::RevaluationRecorded,
            Self::Transferred { .. } => AssetEventType::Transferred,
            Self::HeldForSale { .. } => AssetEventType::HeldForSale,
            Self::Disposed(_) => AssetEventType::Disposed,
            Self::Sold(_) => AssetEventType::Sold,
            Self::WrittenOff { .. } => AssetEventType::WrittenOff,
            Self::ComponentAdded { .. } => AssetEventType::ComponentAdded,
            Self::ComponentRemoved { .. } => AssetEventType::ComponentRemoved,
            Self::UsefulLifeChanged { .. } => AssetEventType::UsefulLifeChanged,
            Self::MethodChanged { .. } => AssetEventType::MethodChanged,
        }
    }

    /// The book the event concerns, if it concerns one.
    #[must_use]
    pub const fn book_type(&self) -> Option<BookType> {
        match self {
            Self::Capitalized { book, .. }
            | Self::DepreciationPosted { book, .. }
            | Self::ImpairmentRecorded { book, .. }
            | Self::RevaluationRecorded { book, .. }
            | Self::WrittenOff { book, .. }
            | Self::ComponentAdded { book, .. }
            | Self::ComponentRemoved { book, .. }
            | Self::UsefulLifeChanged { book, .. }
            | Self::MethodChanged { book, .. } => Some(*book),
            Self::Disposed(closing) | Self::Sold(closing) => Some(closing.book),
            Self::Created { .. }
            | Self::Acquired { .. }
            | Self::Transferred { .. }
            | Self::HeldForSale { .. } => None,
        }
    }

    /// The principal amount of the event.
    #[must_use]
    pub const fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Acquired { cost, .. }
            | Self::Capitalized { cost, .. }
            | Self::ComponentAdded { cost, .. }
            | Self::ComponentRemoved { cost, .. } => Some(*cost),
            Self::DepreciationPosted { amount, .. } => Some(*amount),
            Self::ImpairmentRecorded { loss, .. } | Self::WrittenOff { loss, .. } => Some(*loss),
            Self::RevaluationRecorded { increase, .. } => Some(*increase),
            Self::Disposed(closing) | Self::Sold(closing) => Some(closing.gain_or_loss),
            Self::Created { .. }
            | Self::Transferred { .. }
            | Self::HeldForSale { .. }
            | Self::UsefulLifeChanged { .. }
            | Self::MethodChanged { .. } => None,
        }
    }

    /// Value before the change.
    #[must_use]
    pub fn previous_value(&self) -> Option<EventValue> {
        match self {
            Self::DepreciationPosted { previous_value, .. }
            | Self::ImpairmentRecorded { previous_value, .. }
            | Self::RevaluationRecorded { previous_value, .. }
            | Self::WrittenOff { previous_value, .. }
            | Self::ComponentAdded { previous_value, .. }
            | Self::ComponentRemoved { previous_value, .. } => {
                Some(EventValue::Money(*previous_value))
            }
            Self::Disposed(closing) | Self::Sold(closing) => {
                Some(EventValue::Money(closing.previous_value))
            }
            Self::Capitalized { .. } => Some(EventValue::Money(Decimal::ZERO)),
            Self::UsefulLifeChanged { previous_life, .. } => {
                Some(EventValue::Periods(*previous_life))
            }
            Self::MethodChanged {
                previous_method, ..
            } => Some(EventValue::Method(previous_method.clone())),
            Self::Created { .. }
            | Self::Acquired { .. }
            | Self::Transferred { .. }
            | Self::HeldForSale { .. } => None,
        }
    }

    /// Value after the change.
    #[must_use]
    pub fn new_value(&self) -> Option<EventValue> {
        match self {
            Self::DepreciationPosted { new_value, .. }
            | Self::ImpairmentRecorded { new_value, .. }
            | Self::RevaluationRecorded { new_value, .. }
            | Self::ComponentAdded { new_value, .. }
            | Self::ComponentRemoved { new_value, .. } => Some(EventValue::Money(*new_value)),
            Self::Capitalized { cost, .. } => Some(EventValue::Money(*cost)),
            Self::Disposed(_) | Self::Sold(_) | Self::WrittenOff { .. } => {
                Some(EventValue::Money(Decimal::ZERO))
            }
            Self::UsefulLifeChanged { new_life, .. } => Some(EventValue::Periods(*new_life)),
            Self::MethodChanged { new_method, .. } => Some(EventValue::Method(new_method.clone())),
            Self::Created { .. }
            | Self::Acquired { .. }
            | Self::Transferred { .. }
            | Self::HeldForSale { .. } => None,
        }
    }

    /// Status transition recorded by the event.
    #[must_use]
    pub const fn status_change(&self) -> Option<StatusChange> {
        match self {
            Self::Acquired { status, .. }
            | Self::HeldForSale { status }
            | Self::WrittenOff { status, .. } => Some(*status),
            Self::Disposed(closing) | Self::Sold(closing) => Some(closing.status),
            Self::DepreciationPosted { status, .. }
            | Self::ImpairmentRecorded { status, .. }
            | Self::RevaluationRecorded { status, .. }
            | Self::ComponentAdded { status, .. }
            | Self::ComponentRemoved { status, .. }
            | Self::UsefulLifeChanged { status, .. }
            | Self::MethodChanged { status, .. } => *status,
            Self::Created { .. } | Self::Capitalized { .. } | Self::Transferred { .. } => None,
        }
    }

    /// The asset status after the event, if it changed.
    #[must_use]
    pub fn new_status(&self) -> Option<AssetStatus> {
        self.status_change().map(|c| c.to)
    }
}

/// An immutable record of one lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEvent {
    /// Event id.
    pub id: EventId,
    /// The asset.
    pub asset_id: AssetId,
    /// Position in the asset's log, from 1.
    pub sequence: u64,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Business date the event takes effect.
    pub effective_date: NaiveDate,
    /// Who issued the command.
    pub actor: String,
    /// Free-text reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// What happened.
    pub kind: AssetEventKind,
}

impl AssetEvent {
    /// The event type tag.
    #[must_use]
    pub const fn event_type(&self) -> AssetEventType {
        self.kind.event_type()
    }

    /// Carrying value of the event's book once the event has applied.
    ///
    /// Returns `None` for events that do not move a book's carrying value.
    #[must_use]
    pub fn carrying_value(&self) -> Option<(BookType, Decimal)> {
        let book = self.kind.book_type()?;
        match (&self.kind, self.kind.new_value()) {
            (AssetEventKind::UsefulLifeChanged { .. } | AssetEventKind::MethodChanged { .. }, _) => {
                None
            }
            (_, Some(EventValue::Money(value))) => Some((book, value)),
            _ => None,
        }
    }

    /// How far the event moved its book's carrying value.
    ///
    /// Summing these in effective-date order rebuilds a book's value as of any
    /// date, including when an event was recorded with an earlier business date
    /// than events already in the log.
    #[must_use]
    pub fn carrying_change(&self) -> Option<(BookType, Decimal)> {
        let (book, after) = self.carrying_value()?;
        match self.kind.previous_value() {
            Some(EventValue::Money(before)) => Some((book, after - before)),
            _ => None,
        }
    }
}

impl fmt::Display for AssetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<3} {} {:<21}",
            self.sequence,
            self.effective_date,
            self.event_type()
        )?;
        if let Some(book) = self.kind.book_type() {
            write!(f, " [{book}]")?;
        }
        if let (Some(prev), Some(new)) = (self.kind.previous_value(), self.kind.new_value()) {
            write!(f, " {prev} → {new}")?;
        } else if let Some(amount) = self.kind.amount() {
            write!(f, " {amount}")?;
        }
        if let AssetEventKind::Transferred {
            from_location,
            to_location,
        } = &self.kind
        {
            write!(
                f,
                " {} → {to_location}",
                from_location.as_deref().unwrap_or("-")
            )?;
        }
        if let Some(status) = self.kind.status_change() {
            write!(f, " ({status})")?;
        }
        if let Some(reason) = &self.reason {
            write!(f, " \"{reason}\"")?;
        }
        write!(f, " by {}", self.actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(kind: AssetEventKind) -> AssetEvent {
        AssetEvent {
            id: EventId::generate(),
            asset_id: AssetId::generate(),
            sequence: 1,
            timestamp: Utc::now(),
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            actor: "tester".to_string(),
            reason: None,
            kind,
        }
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(
            AssetEventType::DepreciationPosted.to_string(),
            "depreciation-posted"
        );
        assert_eq!(
            AssetEventType::UsefulLifeChanged.to_string(),
            "useful-life-changed"
        );
    }

    #[test]
    fn test_depreciation_posted_accessors() {
        let e = event(AssetEventKind::DepreciationPosted {
            book: BookType::Tax,
            period_number: 1,
            amount: dec!(3000),
            previous_value: dec!(12000),
            new_value: dec!(9000),
            status: None,
        });
        assert_eq!(e.event_type(), AssetEventType::DepreciationPosted);
        assert_eq!(e.kind.amount(), Some(dec!(3000)));
        assert_eq!(e.kind.previous_value(), Some(EventValue::Money(dec!(12000))));
        assert_eq!(e.carrying_value(), Some((BookType::Tax, dec!(9000))));
        assert_eq!(e.carrying_change(), Some((BookType::Tax, dec!(-3000))));
        assert!(e.kind.status_change().is_none());
    }

    #[test]
    fn test_life_change_is_not_a_carrying_value() {
        let e = event(AssetEventKind::UsefulLifeChanged {
            book: BookType::Statutory,
            previous_life: 48,
            new_life: 60,
            status: None,
        });
        assert_eq!(e.kind.previous_value(), Some(EventValue::Periods(48)));
        assert_eq!(e.kind.new_value(), Some(EventValue::Periods(60)));
        assert!(e.carrying_value().is_none());
    }

    #[test]
    fn test_sold_closes_to_zero() {
        let e = event(AssetEventKind::Sold(BookClosing {
            book: BookType::Statutory,
            disposal_type: DisposalType::Sale,
            proceeds: dec!(12000),
            previous_value: dec!(10000),
            gain_or_loss: dec!(2000),
            status: StatusChange::new(AssetStatus::Active, AssetStatus::Disposed),
        }));
        assert_eq!(e.carrying_value(), Some((BookType::Statutory, dec!(0))));
        assert_eq!(e.carrying_change(), Some((BookType::Statutory, dec!(-10000))));
        assert_eq!(e.kind.new_status(), Some(AssetStatus::Disposed));
        assert_eq!(e.kind.amount(), Some(dec!(2000)));
    }

    #[test]
    fn test_display_includes_transfer_locations() {
        let e = event(AssetEventKind::Transferred {
            from_location: Some("Plant A".to_string()),
            to_location: "Plant B".to_string(),
        });
        let text = e.to_string();
        assert!(text.contains("transferred"));
        assert!(text.contains("Plant A → Plant B"));
    }

    #[test]
    fn test_serde_round_trip() {
        let e = event(AssetEventKind::MethodChanged {
            book: BookType::Ifrs,
            previous_method: DepreciationMethod::StraightLine,
            new_method: DepreciationMethod::declining_balance(dec!(0.2)),
            status: None,
        });
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"method-changed\""));
        let back: AssetEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
