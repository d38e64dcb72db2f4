use crate::model::AnalyteResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Problem with the numeric input to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum QuantityIssue {
    /// No value, or a value that could not be parsed.
    Missing,
    /// A negative quantity.
    Negative { value: Decimal },
    /// A quantity above 100 %.
    OutOfRange { value: Decimal },
    /// LOD above LOQ.
    LimitsInverted { lod: Decimal, loq: Decimal },
    /// LOD or LOQ outside 0-100 %.
    LimitsOutOfRange { lod: Decimal, loq: Decimal },
}

impl fmt::Display for QuantityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityIssue::Missing => write!(f, "quantity is missing or non-numeric, treated as 0"),
            QuantityIssue::Negative { value } => {
                write!(f, "quantity {value} is negative, treated as 0")
            }
            QuantityIssue::OutOfRange { value } => {
                write!(f, "quantity {value} % exceeds 100 %, treated as 0")
            }
            QuantityIssue::LimitsInverted { lod, loq } => {
                write!(f, "LOD {lod} exceeds LOQ {loq}")
            }
            QuantityIssue::LimitsOutOfRange { lod, loq } => {
                write!(f, "LOD {lod} / LOQ {loq} lie outside 0-100 %")
            }
        }
    }
}

/// Outcome of classifying a single quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub result: AnalyteResult,
    /// The quantity used for classification and aggregation (0 when sanitized).
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<QuantityIssue>,
}

impl Classification {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
