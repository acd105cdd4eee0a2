//! Disposal records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AssetId, AssetStatus, BookType};

/// How an asset left the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalType {
    /// Sold to a buyer.
    Sale,
    /// Scrapped.
    Scrap,
    /// Given away.
    Donation,
    /// Stolen.
    Theft,
    /// Destroyed.
    Destruction,
    /// Anything else.
    Other,
}

impl DisposalType {
    /// Whether the disposal is a sale.
    #[must_use]
    pub const fn is_sale(self) -> bool {
        matches!(self, Self::Sale)
    }
}

impl FromStr for DisposalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sale" => Ok(Self::Sale),
            "scrap" => Ok(Self::Scrap),
            "donation" => Ok(Self::Donation),
            "theft" => Ok(Self::Theft),
            "destruction" => Ok(Self::Destruction),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown disposal type: {s}")),
        }
    }
}

impl fmt::Display for DisposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Sale => "sale",
            Self::Scrap => "scrap",
            Self::Donation => "donation",
            Self::Theft => "theft",
            Self::Destruction => "destruction",
            Self::Other => "other",
        })
    }
}

/// Result of comparing proceeds with carrying amount.
///
/// Zero is neither a gain nor a loss: `is_gain` is false and `is_loss()` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GainLoss {
    /// Proceeds less carrying amount.
    pub amount: Decimal,
    /// Strictly positive amount.
    pub is_gain: bool,
}

impl GainLoss {
    /// Strictly negative amount.
    #[must_use]
    pub fn is_loss(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

impl fmt::Display for GainLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_gain {
            write!(f, "gain {}", self.amount)
        } else if self.is_loss() {
            write!(f, "loss {}", -self.amount)
        } else {
            write!(f, "no gain or loss")
        }
    }
}

/// Closing figures for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDisposal {
    /// The book.
    pub book_type: BookType,
    /// Carrying amount at disposal.
    pub carrying_amount: Decimal,
    /// Accumulated depreciation at disposal.
    pub accumulated_depreciation: Decimal,
    /// Gain or loss in this book.
    pub gain_loss: GainLoss,
}

/// Record of an asset's disposal.
///
/// The top-level figures are those of the primary book; every book's figures
/// are in `books`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposal {
    /// The asset.
    pub asset_id: AssetId,
    /// Date of disposal.
    pub disposal_date: NaiveDate,
    /// How the asset left.
    pub disposal_type: DisposalType,
    /// Sale price, for sales only.
    pub sale_price: Option<Decimal>,
    /// Insurance or salvage proceeds for non-sale disposals.
    pub other_proceeds: Option<Decimal>,
    /// Buyer, for sales.
    pub buyer: Option<String>,
    /// Primary book carrying amount at disposal.
    pub carrying_amount: Decimal,
    /// Primary book accumulated depreciation at disposal.
    pub accumulated_depreciation: Decimal,
    /// Primary book gain or loss.
    pub gain_or_loss: Decimal,
    /// Whether the primary book shows a gain.
    pub is_gain: bool,
    /// Free-text reason.
    pub reason: String,
    /// Terminal status applied.
    pub final_status: AssetStatus,
    /// Figures per book.
    pub books: Vec<BookDisposal>,
}

impl Disposal {
    /// Total proceeds received.
    #[must_use]
    pub fn proceeds(&self) -> Decimal {
        self.sale_price.or(self.other_proceeds).unwrap_or_default()
    }

    /// Figures for one book.
    #[must_use]
    pub fn book(&self, book_type: BookType) -> Option<&BookDisposal> {
        self.books.iter().find(|b| b.book_type == book_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_gain_loss_display() {
        let gain = GainLoss {
            amount: dec!(2000),
            is_gain: true,
        };
        let loss = GainLoss {
            amount: dec!(-7000),
            is_gain: false,
        };
        let even = GainLoss {
            amount: dec!(0),
            is_gain: false,
        };
        assert_eq!(gain.to_string(), "gain 2000");
        assert_eq!(loss.to_string(), "loss 7000");
        assert_eq!(even.to_string(), "no gain or loss");
        assert!(!even.is_loss());
    }

    #[test]
    fn test_disposal_type_parse() {
        assert_eq!("Sale".parse(), Ok(DisposalType::Sale));
        assert!(DisposalType::Sale.is_sale());
        assert!(!DisposalType::Theft.is_sale());
        assert!("auction".parse::<DisposalType>().is_err());
    }
}
