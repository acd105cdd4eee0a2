//! Asset classification and the asset-class configuration table.
//!
//! Every asset is classified by category and optional subcategory. The
//! [`AssetClassTable`] lists the known classes with the defaults used for
//! books that leave life, method, salvage or cadence unspecified.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{DepreciationMethod, PostingCadence};

/// Category and optional subcategory of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    /// Top-level category, e.g. "Vehicles".
    pub category: String,
    /// Optional subcategory, e.g. "Trucks".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

impl Classification {
    /// Create a classification with a category only.
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: None,
        }
    }

    /// Add a subcategory.
    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subcategory {
            Some(sub) => write!(f, "{}/{}", self.category, sub),
            None => write!(f, "{}", self.category),
        }
    }
}

/// One row of the asset-class configuration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetClass {
    /// Category name.
    pub category: String,
    /// Subcategory name, if the class is that specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Default useful life in periods of `default_cadence`.
    pub default_life_periods: u32,
    /// Default depreciation method.
    pub default_method: DepreciationMethod,
    /// Default salvage value as a fraction of cost.
    #[serde(default)]
    pub default_salvage_rate: Decimal,
    /// Default posting cadence.
    #[serde(default)]
    pub default_cadence: PostingCadence,
}

impl AssetClass {
    fn matches(&self, classification: &Classification) -> bool {
        self.category.eq_ignore_ascii_case(&classification.category)
            && match (&self.subcategory, &classification.subcategory) {
                (None, _) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (Some(_), None) => false,
            }
    }

    fn key(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{}/{}", self.category, sub).to_ascii_lowercase(),
            None => self.category.to_ascii_lowercase(),
        }
    }
}

/// Error loading an asset-class table.
#[derive(Debug, Error)]
pub enum ClassTableError {
    /// The document is not valid JSON for a class table.
    #[error("invalid asset-class table: {0}")]
    Json(#[from] serde_json::Error),
    /// The same class appears twice.
    #[error("duplicate asset class: {0}")]
    Duplicate(String),
    /// A class has unusable defaults.
    #[error("asset class {class}: {reason}")]
    Invalid {
        /// The offending class.
        class: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// The fixed asset-class configuration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetClassTable {
    classes: Vec<AssetClass>,
}

impl AssetClassTable {
    /// Build a table, rejecting duplicates and invalid defaults.
    pub fn new(classes: Vec<AssetClass>) -> Result<Self, ClassTableError> {
        let mut seen = std::collections::HashSet::new();
        for class in &classes {
            let key = class.key();
            if class.default_life_periods == 0 {
                return Err(ClassTableError::Invalid {
                    class: key,
                    reason: "default life must be positive",
                });
            }
            if class.default_salvage_rate < Decimal::ZERO || class.default_salvage_rate > Decimal::ONE
            {
                return Err(ClassTableError::Invalid {
                    class: key,
                    reason: "salvage rate must be between 0 and 1",
                });
            }
            if !seen.insert(key.clone()) {
                return Err(ClassTableError::Duplicate(key));
            }
        }
        Ok(Self { classes })
    }

    /// Parse a table from a JSON array of classes.
    pub fn from_json_str(json: &str) -> Result<Self, ClassTableError> {
        let classes: Vec<AssetClass> = serde_json::from_str(json)?;
        Self::new(classes)
    }

    /// The table shipped with fixedledger. Lives are in months.
    #[must_use]
    pub fn builtin() -> Self {
        let class = |category: &str,
                     subcategory: Option<&str>,
                     life: u32,
                     method: DepreciationMethod,
                     salvage: Decimal| AssetClass {
            category: category.to_string(),
            subcategory: subcategory.map(str::to_string),
            default_life_periods: life,
            default_method: method,
            default_salvage_rate: salvage,
            default_cadence: PostingCadence::Monthly,
        };
        Self {
            classes: vec![
                class(
                    "Buildings",
                    None,
                    480,
                    DepreciationMethod::StraightLine,
                    Decimal::new(5, 2),
                ),
                class(
                    "Machinery",
                    None,
                    120,
                    DepreciationMethod::StraightLine,
                    Decimal::new(10, 2),
                ),
                class(
                    "Vehicles",
                    None,
                    60,
                    DepreciationMethod::declining_balance_with_switch(Decimal::new(4, 2)),
                    Decimal::new(15, 2),
                ),
                class(
                    "Computer Equipment",
                    None,
                    36,
                    DepreciationMethod::StraightLine,
                    Decimal::ZERO,
                ),
                class(
                    "Furniture",
                    None,
                    84,
                    DepreciationMethod::StraightLine,
                    Decimal::ZERO,
                ),
                class(
                    "Leasehold Improvements",
                    None,
                    120,
                    DepreciationMethod::StraightLine,
                    Decimal::ZERO,
                ),
            ],
        }
    }

    /// All classes.
    #[must_use]
    pub fn classes(&self) -> &[AssetClass] {
        &self.classes
    }

    /// Find the most specific class matching a classification.
    #[must_use]
    pub fn find(&self, classification: &Classification) -> Option<&AssetClass> {
        self.classes
            .iter()
            .filter(|c| c.matches(classification))
            .max_by_key(|c| c.subcategory.is_some())
    }
}

impl Default for AssetClassTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builtin_lookup() {
        let table = AssetClassTable::builtin();
        let class = table.find(&Classification::new("vehicles")).unwrap();
        assert_eq!(class.default_life_periods, 60);
        assert_eq!(class.default_salvage_rate, dec!(0.15));
        assert!(table.find(&Classification::new("Art")).is_none());
    }

    #[test]
    fn test_subcategory_is_preferred() {
        let json = r#"[
            {"category": "Vehicles", "default_life_periods": 60,
             "default_method": {"kind": "straight_line"}},
            {"category": "Vehicles", "subcategory": "Trucks", "default_life_periods": 96,
             "default_method": {"kind": "straight_line"}, "default_salvage_rate": "0.1"}
        ]"#;
        let table = AssetClassTable::from_json_str(json).unwrap();

        let trucks = Classification::new("Vehicles").with_subcategory("Trucks");
        assert_eq!(table.find(&trucks).unwrap().default_life_periods, 96);

        let vans = Classification::new("Vehicles").with_subcategory("Vans");
        assert_eq!(table.find(&vans).unwrap().default_life_periods, 60);
    }

    #[test]
    fn test_duplicate_rejected() {
        let json = r#"[
            {"category": "Furniture", "default_life_periods": 60, "default_method": {"kind": "straight_line"}},
            {"category": "FURNITURE", "default_life_periods": 84, "default_method": {"kind": "straight_line"}}
        ]"#;
        assert!(matches!(
            AssetClassTable::from_json_str(json),
            Err(ClassTableError::Duplicate(_))
        ));
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        let json = r#"[{"category": "Land", "default_life_periods": 0, "default_method": {"kind": "straight_line"}}]"#;
        assert!(matches!(
            AssetClassTable::from_json_str(json),
            Err(ClassTableError::Invalid { .. })
        ));
    }

    #[test]
    fn test_classification_display() {
        let c = Classification::new("Vehicles").with_subcategory("Trucks");
        assert_eq!(c.to_string(), "Vehicles/Trucks");
    }
}
