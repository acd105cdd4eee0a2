//! Command inputs.
//!
//! Typed requests for the lifecycle engine, plus [`AssetCommand`], the same
//! commands as one tagged union so they can be queued or read from a file.

use chrono::NaiveDate;
use fixedledger_core::{
    AssetEvent, AssetStatus, BookType, Classification, DepreciationMethod, Disposal, DisposalType,
    PostingCadence, ScheduleEntry,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A book to open on a new asset.
///
/// Fields left unset are filled from the asset class, then from the engine
/// options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSpec {
    /// Book type.
    pub book_type: BookType,
    /// Useful life in periods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub useful_life_periods: Option<u32>,
    /// Depreciation method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<DepreciationMethod>,
    /// Absolute salvage value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage_value: Option<Decimal>,
    /// Salvage as a fraction of cost, used when no absolute value is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage_rate: Option<Decimal>,
    /// Posting cadence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<PostingCadence>,
    /// Carry the book at fair value.
    #[serde(default)]
    pub fair_value_model: bool,
}

impl BookSpec {
    /// A book using class defaults for everything.
    #[must_use]
    pub const fn new(book_type: BookType) -> Self {
        Self {
            book_type,
            useful_life_periods: None,
            method: None,
            salvage_value: None,
            salvage_rate: None,
            cadence: None,
            fair_value_model: false,
        }
    }

    /// Set the useful life.
    #[must_use]
    pub const fn with_life(mut self, periods: u32) -> Self {
        self.useful_life_periods = Some(periods);
        self
    }

    /// Set the method.
    #[must_use]
    pub fn with_method(mut self, method: DepreciationMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set an absolute salvage value.
    #[must_use]
    pub const fn with_salvage_value(mut self, salvage: Decimal) -> Self {
        self.salvage_value = Some(salvage);
        self
    }

    /// Set salvage as a fraction of cost.
    #[must_use]
    pub const fn with_salvage_rate(mut self, rate: Decimal) -> Self {
        self.salvage_rate = Some(rate);
        self
    }

    /// Set the posting cadence.
    #[must_use]
    pub const fn with_cadence(mut self, cadence: PostingCadence) -> Self {
        self.cadence = Some(cadence);
        self
    }

    /// Carry the book at fair value.
    #[must_use]
    pub const fn with_fair_value_model(mut self, fair_value: bool) -> Self {
        self.fair_value_model = fair_value;
        self
    }
}

/// A new asset in draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAsset {
    /// Human-facing asset number.
    pub asset_number: String,
    /// Name.
    pub name: String,
    /// Category and subcategory.
    pub classification: Classification,
    /// Serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// Current location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Date the asset is recorded.
    pub created_on: NaiveDate,
    /// Books to open. The first is the primary book.
    pub books: Vec<BookSpec>,
}

impl NewAsset {
    /// Create a request with no books.
    #[must_use]
    pub fn new(
        asset_number: impl Into<String>,
        name: impl Into<String>,
        classification: Classification,
        created_on: NaiveDate,
    ) -> Self {
        Self {
            asset_number: asset_number.into(),
            name: name.into(),
            classification,
            serial_number: None,
            location: None,
            created_on,
            books: Vec::new(),
        }
    }

    /// Add a book.
    #[must_use]
    pub fn with_book(mut self, book: BookSpec) -> Self {
        self.books.push(book);
        self
    }

    /// Set the serial number.
    #[must_use]
    pub fn with_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    /// Set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Per-book values that differ from the acquisition defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOverride {
    /// The book.
    pub book_type: BookType,
    /// Capitalized cost for this book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    /// Salvage value for this book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage_value: Option<Decimal>,
    /// Useful life for this book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub useful_life_periods: Option<u32>,
    /// Method for this book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<DepreciationMethod>,
    /// In-service date for this book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_service_date: Option<NaiveDate>,
}

impl BookOverride {
    /// An override that changes nothing.
    #[must_use]
    pub const fn new(book_type: BookType) -> Self {
        Self {
            book_type,
            cost: None,
            salvage_value: None,
            useful_life_periods: None,
            method: None,
            in_service_date: None,
        }
    }

    /// Set the cost.
    #[must_use]
    pub const fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Set the salvage value.
    #[must_use]
    pub const fn with_salvage_value(mut self, salvage: Decimal) -> Self {
        self.salvage_value = Some(salvage);
        self
    }

    /// Set the useful life.
    #[must_use]
    pub const fn with_life(mut self, periods: u32) -> Self {
        self.useful_life_periods = Some(periods);
        self
    }

    /// Set the method.
    #[must_use]
    pub fn with_method(mut self, method: DepreciationMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the in-service date.
    #[must_use]
    pub const fn with_in_service_date(mut self, date: NaiveDate) -> Self {
        self.in_service_date = Some(date);
        self
    }
}

/// How an asset is being disposed of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalSpec {
    /// Date of disposal.
    pub date: NaiveDate,
    /// Disposal type.
    pub disposal_type: DisposalType,
    /// Sale price, required for sales and refused otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    /// Insurance or salvage proceeds for non-sale disposals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_proceeds: Option<Decimal>,
    /// Buyer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
    /// Reason.
    #[serde(default)]
    pub reason: String,
    /// Terminal status; `Disposed` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_status: Option<AssetStatus>,
}

impl DisposalSpec {
    /// A non-sale disposal.
    #[must_use]
    pub fn new(date: NaiveDate, disposal_type: DisposalType, reason: impl Into<String>) -> Self {
        Self {
            date,
            disposal_type,
            sale_price: None,
            other_proceeds: None,
            buyer: None,
            reason: reason.into(),
            final_status: None,
        }
    }

    /// A sale at `price`.
    #[must_use]
    pub fn sale(date: NaiveDate, price: Decimal, reason: impl Into<String>) -> Self {
        Self {
            sale_price: Some(price),
            ..Self::new(date, DisposalType::Sale, reason)
        }
    }

    /// Set the buyer.
    #[must_use]
    pub fn with_buyer(mut self, buyer: impl Into<String>) -> Self {
        self.buyer = Some(buyer.into());
        self
    }

    /// Set insurance or salvage proceeds.
    #[must_use]
    pub const fn with_other_proceeds(mut self, proceeds: Decimal) -> Self {
        self.other_proceeds = Some(proceeds);
        self
    }

    /// Set the terminal status.
    #[must_use]
    pub const fn with_final_status(mut self, status: AssetStatus) -> Self {
        self.final_status = Some(status);
        self
    }
}

/// Any command against an existing asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AssetCommand {
    /// Capitalize a draft asset.
    AcquireAndCapitalize {
        /// Acquisition date, also the default in-service date.
        acquisition_date: NaiveDate,
        /// Cost for every book without an override.
        cost: Decimal,
        /// Per-book overrides.
        #[serde(default)]
        overrides: Vec<BookOverride>,
    },
    /// Post the next due period of a book.
    PostDepreciation {
        /// The book.
        book: BookType,
        /// End of the posting period.
        period_end: NaiveDate,
        /// Actual units consumed (units of production).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<Decimal>,
    },
    /// Write a book down to a recoverable amount.
    RecordImpairment {
        /// The book.
        book: BookType,
        /// Effective date.
        date: NaiveDate,
        /// New carrying value.
        recoverable_amount: Decimal,
        /// Reason.
        reason: String,
    },
    /// Write a book up to a fair value.
    RecordRevaluation {
        /// The book.
        book: BookType,
        /// Effective date.
        date: NaiveDate,
        /// New carrying value.
        fair_value: Decimal,
        /// Reason.
        reason: String,
    },
    /// Change a book's useful life.
    ChangeUsefulLife {
        /// The book.
        book: BookType,
        /// Effective date.
        date: NaiveDate,
        /// New life in periods.
        new_life_periods: u32,
        /// Reason.
        reason: String,
    },
    /// Change a book's method.
    ChangeMethod {
        /// The book.
        book: BookType,
        /// Effective date.
        date: NaiveDate,
        /// New method.
        method: DepreciationMethod,
        /// Reason.
        reason: String,
    },
    /// Capitalize a component.
    AddComponent {
        /// The book.
        book: BookType,
        /// Effective date.
        date: NaiveDate,
        /// Component name.
        name: String,
        /// Component cost.
        cost: Decimal,
        /// Reason.
        reason: String,
    },
    /// De-capitalize a component.
    RemoveComponent {
        /// The book.
        book: BookType,
        /// Effective date.
        date: NaiveDate,
        /// Component name.
        name: String,
        /// Reason.
        reason: String,
    },
    /// Move the asset.
    Transfer {
        /// Effective date.
        date: NaiveDate,
        /// New location.
        to_location: String,
        /// Reason.
        reason: String,
    },
    /// Classify as held for sale.
    MarkHeldForSale {
        /// Effective date.
        date: NaiveDate,
        /// Reason.
        reason: String,
    },
    /// Dispose of the asset.
    Dispose(DisposalSpec),
    /// Write the asset off.
    WriteOff {
        /// Effective date.
        date: NaiveDate,
        /// Reason.
        reason: String,
    },
}

impl AssetCommand {
    /// Short name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AcquireAndCapitalize { .. } => "acquire and capitalize",
            Self::PostDepreciation { .. } => "post depreciation",
            Self::RecordImpairment { .. } => "record impairment",
            Self::RecordRevaluation { .. } => "record revaluation",
            Self::ChangeUsefulLife { .. } => "change useful life",
            Self::ChangeMethod { .. } => "change method",
            Self::AddComponent { .. } => "add component",
            Self::RemoveComponent { .. } => "remove component",
            Self::Transfer { .. } => "transfer",
            Self::MarkHeldForSale { .. } => "mark held for sale",
            Self::Dispose(_) => "dispose",
            Self::WriteOff { .. } => "write off",
        }
    }
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Events appended by the command.
    Events(Vec<AssetEvent>),
    /// The entry a depreciation posting recognized.
    Posted(ScheduleEntry),
    /// The disposal record.
    Disposed(Disposal),
}
