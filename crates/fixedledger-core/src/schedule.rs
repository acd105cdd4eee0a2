//! Depreciation schedule types.
//!
//! A [`DepreciationSchedule`] is an ordered list of [`ScheduleEntry`] rows, one
//! per posting period. The schedule is a posted prefix (recognized history)
//! followed by an unposted tail (projection). Only the tail is ever rebuilt.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ChargeBasis;

/// One period of a depreciation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based period number.
    pub period_number: u32,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Book value at the start of the period.
    pub opening_book_value: Decimal,
    /// Depreciation charged in the period.
    pub depreciation_amount: Decimal,
    /// Depreciation accumulated through the end of the period.
    pub accumulated_depreciation: Decimal,
    /// Book value at the end of the period.
    pub closing_book_value: Decimal,
    /// Whether the charge has been recognized (as opposed to projected).
    pub is_posted: bool,
    /// Rule that produced the charge.
    pub charge_basis: ChargeBasis,
    /// Units consumed in the period (units-of-production only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Decimal>,
    /// Change in carrying basis between the previous period's closing value
    /// and this period's opening value (impairment, revaluation, components).
    #[serde(default, skip_serializing_if = "Decimal::is_zero")]
    pub basis_adjustment: Decimal,
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4} {} {:>14} {:>12} {:>14} {:>14} {:<6}{}",
            self.period_number,
            self.period_start,
            self.opening_book_value,
            self.depreciation_amount,
            self.accumulated_depreciation,
            self.closing_book_value,
            self.charge_basis,
            if self.is_posted { " posted" } else { "" }
        )
    }
}

/// Break in the chain of schedule entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityBreak {
    /// Period number at which the chain breaks.
    pub period_number: u32,
    /// Description of the break.
    pub message: String,
}

/// The period-by-period depreciation schedule of one asset book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationSchedule {
    entries: Vec<ScheduleEntry>,
}

impl DepreciationSchedule {
    /// Create an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, posted first.
    #[must_use]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Check if the schedule has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries already recognized.
    #[must_use]
    pub fn posted(&self) -> &[ScheduleEntry] {
        &self.entries[..self.posted_count()]
    }

    /// Projected entries.
    #[must_use]
    pub fn unposted(&self) -> &[ScheduleEntry] {
        &self.entries[self.posted_count()..]
    }

    /// Number of posted entries.
    #[must_use]
    pub fn posted_count(&self) -> usize {
        self.entries.iter().take_while(|e| e.is_posted).count()
    }

    /// The last posted entry, if any.
    #[must_use]
    pub fn last_posted(&self) -> Option<&ScheduleEntry> {
        self.posted().last()
    }

    /// The next entry due for posting.
    #[must_use]
    pub fn next_unposted(&self) -> Option<&ScheduleEntry> {
        self.unposted().first()
    }

    /// Sum of all charges, posted and projected.
    #[must_use]
    pub fn total_depreciation(&self) -> Decimal {
        self.entries.iter().map(|e| e.depreciation_amount).sum()
    }

    /// Closing value of the final entry.
    #[must_use]
    pub fn final_closing_value(&self) -> Option<Decimal> {
        self.entries.last().map(|e| e.closing_book_value)
    }

    /// Replace the unposted tail. Posted history is kept as is.
    pub fn replace_unposted(&mut self, tail: Vec<ScheduleEntry>) {
        let posted = self.posted_count();
        self.entries.truncate(posted);
        self.entries.extend(tail);
    }

    /// Drop the unposted tail.
    pub fn truncate_unposted(&mut self) {
        let posted = self.posted_count();
        self.entries.truncate(posted);
    }

    /// Mark the next unposted entry as posted and return it.
    pub fn post_next(&mut self) -> Option<&ScheduleEntry> {
        let index = self.posted_count();
        let entry = self.entries.get_mut(index)?;
        entry.is_posted = true;
        Some(entry)
    }

    /// Check the structural invariants of the schedule.
    ///
    /// Periods are numbered contiguously from 1, and each entry opens at the
    /// previous closing value plus its basis adjustment.
    pub fn check_continuity(&self) -> Result<(), ContinuityBreak> {
        let mut previous: Option<&ScheduleEntry> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let expected = index as u32 + 1;
            if entry.period_number != expected {
                return Err(ContinuityBreak {
                    period_number: entry.period_number,
                    message: format!("expected period {expected}"),
                });
            }
            if entry.opening_book_value - entry.depreciation_amount != entry.closing_book_value {
                return Err(ContinuityBreak {
                    period_number: entry.period_number,
                    message: "closing value does not equal opening minus charge".to_string(),
                });
            }
            if let Some(prev) = previous {
                if prev.closing_book_value + entry.basis_adjustment != entry.opening_book_value {
                    return Err(ContinuityBreak {
                        period_number: entry.period_number,
                        message: format!(
                            "opening {} does not follow previous closing {}",
                            entry.opening_book_value, prev.closing_book_value
                        ),
                    });
                }
                if !prev.is_posted && entry.is_posted {
                    return Err(ContinuityBreak {
                        period_number: entry.period_number,
                        message: "posted entry follows an unposted one".to_string(),
                    });
                }
            }
            previous = Some(entry);
        }
        Ok(())
    }
}

impl FromIterator<ScheduleEntry> for DepreciationSchedule {
    fn from_iter<I: IntoIterator<Item = ScheduleEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for DepreciationSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4} {:<10} {:>14} {:>12} {:>14} {:>14} {:<6}",
            "#", "start", "opening", "charge", "accumulated", "closing", "basis"
        )?;
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
