//! Asset lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an asset is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Recorded but not yet capitalized.
    #[default]
    Draft,
    /// In service and depreciating.
    Active,
    /// The primary book has reached salvage value.
    FullyDepreciated,
    /// Carrying value written down to a recoverable amount.
    Impaired,
    /// Classified as held for sale; depreciation stops.
    HeldForSale,
    /// Sold or otherwise disposed of.
    Disposed,
    /// Written off.
    WrittenOff,
}

impl AssetStatus {
    /// Terminal statuses accept no further commands.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Disposed | Self::WrittenOff)
    }

    /// Statuses in which depreciation may be posted.
    ///
    /// `FullyDepreciated` reflects the primary book only, so the other books
    /// keep posting until they reach salvage themselves.
    #[must_use]
    pub const fn accepts_depreciation(self) -> bool {
        matches!(self, Self::Active | Self::FullyDepreciated | Self::Impaired)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::FullyDepreciated => "fully-depreciated",
            Self::Impaired => "impaired",
            Self::HeldForSale => "held-for-sale",
            Self::Disposed => "disposed",
            Self::WrittenOff => "written-off",
        })
    }
}

/// A status transition recorded on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status before the command.
    pub from: AssetStatus,
    /// Status after the command.
    pub to: AssetStatus,
}

impl StatusChange {
    /// Create a status change.
    #[must_use]
    pub const fn new(from: AssetStatus, to: AssetStatus) -> Self {
        Self { from, to }
    }

    /// `Some` only if the status actually changed.
    #[must_use]
    pub fn if_changed(from: AssetStatus, to: AssetStatus) -> Option<Self> {
        (from != to).then_some(Self { from, to })
    }
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}
