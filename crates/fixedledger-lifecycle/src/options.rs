//! Engine options.

use fixedledger_core::PostingCadence;
use fixedledger_depreciation::DEFAULT_MAX_PERIODS;

/// Options for the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Longest schedule any book may have.
    pub max_schedule_periods: u32,
    /// Reject classifications missing from the asset-class table.
    pub require_known_class: bool,
    /// Cadence for books whose class and spec leave it unset.
    pub default_cadence: PostingCadence,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            max_schedule_periods: DEFAULT_MAX_PERIODS,
            require_known_class: true,
            default_cadence: PostingCadence::Monthly,
        }
    }
}

impl LedgerOptions {
    /// Create the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schedule length limit.
    #[must_use]
    pub const fn with_max_schedule_periods(mut self, periods: u32) -> Self {
        self.max_schedule_periods = periods;
        self
    }

    /// Set whether classifications must be in the class table.
    #[must_use]
    pub const fn with_require_known_class(mut self, require: bool) -> Self {
        self.require_known_class = require;
        self
    }

    /// Set the fallback posting cadence.
    #[must_use]
    pub const fn with_default_cadence(mut self, cadence: PostingCadence) -> Self {
        self.default_cadence = cadence;
        self
    }
}
