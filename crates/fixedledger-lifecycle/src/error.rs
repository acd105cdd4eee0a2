//! Lifecycle errors.

use fixedledger_core::{AssetId, AssetStatus, BookType};
use fixedledger_depreciation::{Ineligibility, ScheduleError};
use thiserror::Error;
use tracing::error;

/// Error returned by a lifecycle command or query.
///
/// Every variant except [`LifecycleError::ReconciliationFailure`] is an
/// expected, recoverable condition. A rejected command leaves the asset
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// The command is not valid from the asset's current status.
    #[error("cannot {command} an asset that is {status}")]
    IllegalTransition {
        /// The command attempted.
        command: &'static str,
        /// Status at the time.
        status: AssetStatus,
    },

    /// Depreciation cannot be posted.
    #[error("cannot post depreciation to the {book} book: {reason}")]
    NotDepreciable {
        /// The book.
        book: BookType,
        /// Why not.
        reason: Ineligibility,
    },

    /// The asset has no book of the requested type.
    #[error("asset has no {0} book")]
    BookNotFound(BookType),

    /// The asset is disposed or written off.
    #[error("cannot {command}: asset is already {status}")]
    AlreadyDisposed {
        /// The command attempted.
        command: &'static str,
        /// Terminal status.
        status: AssetStatus,
    },

    /// A generated schedule failed its consistency checks.
    #[error("reconciliation failure: {0}")]
    ReconciliationFailure(String),

    /// No asset with this id is registered.
    #[error("asset {0} not found")]
    AssetNotFound(AssetId),
}

impl LifecycleError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Get the error code string (e.g., "FA1001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "FA1001",
            Self::IllegalTransition { .. } => "FA2001",
            Self::NotDepreciable { .. } => "FA3001",
            Self::BookNotFound(_) => "FA4001",
            Self::AlreadyDisposed { .. } => "FA5001",
            Self::ReconciliationFailure(_) => "FA9001",
            Self::AssetNotFound(_) => "FA4002",
        }
    }

    /// Internal invariant violations that must halt processing of the asset.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ReconciliationFailure(_))
    }
}

impl From<ScheduleError> for LifecycleError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Frozen { .. } => Self::Validation(err.to_string()),
            ScheduleError::Reconciliation { .. } | ScheduleError::Continuity { .. } => {
                error!(error = %err, "schedule reconciliation failed");
                Self::ReconciliationFailure(err.to_string())
            }
            ScheduleError::Method { .. } | ScheduleError::DateOutOfRange { .. } => {
                Self::Validation(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixedledger_depreciation::MethodError;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            LifecycleError::validation("x"),
            LifecycleError::IllegalTransition {
                command: "acquire",
                status: AssetStatus::Active,
            },
            LifecycleError::NotDepreciable {
                book: BookType::Tax,
                reason: Ineligibility::Frozen,
            },
            LifecycleError::BookNotFound(BookType::Tax),
            LifecycleError::AlreadyDisposed {
                command: "transfer",
                status: AssetStatus::Disposed,
            },
            LifecycleError::ReconciliationFailure("x".to_string()),
            LifecycleError::AssetNotFound(AssetId::generate()),
        ];
        let mut codes: Vec<_> = errors.iter().map(LifecycleError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert_eq!(errors.iter().filter(|e| e.is_fatal()).count(), 1);
    }

    #[test]
    fn test_schedule_error_mapping() {
        let method = ScheduleError::Method {
            book: BookType::Statutory,
            source: MethodError::ZeroLife,
        };
        assert_eq!(LifecycleError::from(method).code(), "FA1001");

        let recon = ScheduleError::Reconciliation {
            book: BookType::Statutory,
            expected: rust_decimal::Decimal::ONE,
            actual: rust_decimal::Decimal::ZERO,
        };
        assert!(LifecycleError::from(recon).is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = LifecycleError::IllegalTransition {
            command: "mark held for sale",
            status: AssetStatus::Draft,
        };
        assert_eq!(err.to_string(), "cannot mark held for sale an asset that is draft");
        assert_eq!(
            LifecycleError::BookNotFound(BookType::Ifrs).to_string(),
            "asset has no ifrs book"
        );
    }
}
