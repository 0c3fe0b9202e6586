//! Core blood-bank vocabulary.
//!
//! This module defines the fixed set of blood groups and the categorical
//! stock level assigned to a unit count.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the eight ABO/Rh blood groups.
///
/// The declaration order is the display order used for inventory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// O negative.
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    /// All blood groups in display order.
    pub const ALL: [Self; 8] = [
        Self::APositive,
        Self::ANegative,
        Self::BPositive,
        Self::BNegative,
        Self::AbPositive,
        Self::AbNegative,
        Self::OPositive,
        Self::ONegative,
    ];

    /// The conventional label, e.g. `AB-`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The given label is not one of the eight blood groups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown blood group: '{0}'")]
pub struct UnknownBloodGroup(pub String);

impl FromStr for BloodGroup {
    type Err = UnknownBloodGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .into_iter()
            .find(|group| group.label() == label)
            .ok_or_else(|| UnknownBloodGroup(s.to_string()))
    }
}

/// Categorical classification of a unit count.
///
/// Thresholds are inclusive at the lower bound: 5 is `Low`, 20 is `Medium`
/// and 50 is `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Fewer than 5 units.
    Critical,
    /// 5 to 19 units.
    Low,
    /// 20 to 49 units.
    Medium,
    /// 50 units or more.
    High,
}

impl StockLevel {
    /// Lowest count classified as [`StockLevel::Low`].
    pub const LOW_THRESHOLD: u32 = 5;
    /// Lowest count classified as [`StockLevel::Medium`].
    pub const MEDIUM_THRESHOLD: u32 = 20;
    /// Lowest count classified as [`StockLevel::High`].
    pub const HIGH_THRESHOLD: u32 = 50;

    /// Classify a unit count.
    #[must_use]
    pub fn classify(units: u32) -> Self {
        if units >= Self::HIGH_THRESHOLD {
            Self::High
        } else if units >= Self::MEDIUM_THRESHOLD {
            Self::Medium
        } else if units >= Self::LOW_THRESHOLD {
            Self::Low
        } else {
            Self::Critical
        }
    }

    /// Human-readable status text shown next to an inventory count.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Low => "Low Stock",
            Self::Medium => "Medium Stock",
            Self::High => "High Stock",
        }
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}
