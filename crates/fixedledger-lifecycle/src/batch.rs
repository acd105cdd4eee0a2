//! Period-end batch posting.

use chrono::NaiveDate;
use fixedledger_core::{AssetId, BookType, ScheduleEntry};
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::{AssetRegistry, LifecycleError};

/// What batch posting did to one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPosting {
    /// The asset.
    pub asset_id: AssetId,
    /// The asset's number.
    pub asset_number: String,
    /// The book.
    pub book: BookType,
    /// Entries posted, oldest first.
    pub posted: Vec<ScheduleEntry>,
    /// The error that ended posting for this book.
    pub stopped_by: LifecycleError,
}

impl BookPosting {
    /// Total depreciation posted.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.posted.iter().map(|e| e.depreciation_amount).sum()
    }

    /// Whether posting stopped for a reason other than the book having
    /// nothing further to post.
    #[must_use]
    pub const fn failed(&self) -> bool {
        !matches!(self.stopped_by, LifecycleError::NotDepreciable { .. })
    }
}

/// Outcome of [`post_all_due`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One row per book visited, ordered by asset then book.
    pub postings: Vec<BookPosting>,
}

impl BatchReport {
    /// Number of entries posted across all books.
    #[must_use]
    pub fn entries_posted(&self) -> usize {
        self.postings.iter().map(|p| p.posted.len()).sum()
    }

    /// Total depreciation posted across all books.
    #[must_use]
    pub fn total_posted(&self) -> Decimal {
        self.postings.iter().map(BookPosting::amount).sum()
    }

    /// Books where posting failed.
    pub fn failures(&self) -> impl Iterator<Item = &BookPosting> {
        self.postings.iter().filter(|p| p.failed())
    }
}

/// Post every period due by `period_end` on every book of every depreciating
/// asset.
///
/// Assets are processed in parallel; each asset is locked while its books are
/// posted. A reconciliation failure halts the remaining books of that asset.
pub fn post_all_due(registry: &AssetRegistry, period_end: NaiveDate, actor: &str) -> BatchReport {
    let engine = registry.engine();
    let postings: Vec<BookPosting> = registry
        .handles()
        .par_iter()
        .flat_map_iter(|handle| {
            let mut asset = handle.lock();
            let mut rows = Vec::new();
            if !asset.status.accepts_depreciation() {
                return rows;
            }
            let book_types: Vec<_> = asset.book_types().collect();
            for book in book_types {
                let mut posted = Vec::new();
                let stopped_by = loop {
                    match engine.post_depreciation(&mut asset, book, period_end, None, actor) {
                        Ok(entry) => posted.push(entry),
                        Err(e) => break e,
                    }
                };
                let fatal = stopped_by.is_fatal();
                if fatal {
                    error!(asset = %asset.asset_number, %book, error = %stopped_by, "halting asset");
                }
                rows.push(BookPosting {
                    asset_id: asset.id,
                    asset_number: asset.asset_number.clone(),
                    book,
                    posted,
                    stopped_by,
                });
                if fatal {
                    break;
                }
            }
            rows
        })
        .collect();

    let report = BatchReport { postings };
    for failure in report.failures() {
        debug!(
            asset = %failure.asset_number,
            book = %failure.book,
            error = %failure.stopped_by,
            "batch posting stopped"
        );
    }
    info!(
        %period_end,
        entries = report.entries_posted(),
        total = %report.total_posted(),
        "batch posting complete"
    );
    report
}

impl AssetRegistry {
    /// Post every period due by `period_end`. See [`post_all_due`].
    pub fn post_all_due(&self, period_end: NaiveDate, actor: &str) -> BatchReport {
        post_all_due(self, period_end, actor)
    }
}
