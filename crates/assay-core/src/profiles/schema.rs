use crate::error::AssayError;
use crate::reference::Analyte;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named product profile variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    HighPotency,
    LowPotency,
    HempCompliant,
    Decarboxylated,
    Concentrate,
    Edible,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 6] = [
        ProfileKind::HighPotency,
        ProfileKind::LowPotency,
        ProfileKind::HempCompliant,
        ProfileKind::Decarboxylated,
        ProfileKind::Concentrate,
        ProfileKind::Edible,
    ];

    /// Preset name, as used on the command line and in profile files.
    pub fn name(&self) -> &'static str {
        match self {
            ProfileKind::HighPotency => "high-potency",
            ProfileKind::LowPotency => "low-potency",
            ProfileKind::HempCompliant => "hemp-compliant",
            ProfileKind::Decarboxylated => "decarboxylated",
            ProfileKind::Concentrate => "concentrate",
            ProfileKind::Edible => "edible",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<ProfileKind> {
        let lower = s.trim().to_lowercase().replace(['_', ' '], "-");
        match lower.as_str() {
            "high-potency" | "high" => Some(ProfileKind::HighPotency),
            "low-potency" | "low" => Some(ProfileKind::LowPotency),
            "hemp-compliant" | "hemp" => Some(ProfileKind::HempCompliant),
            "decarboxylated" | "decarb" => Some(ProfileKind::Decarboxylated),
            "concentrate" => Some(ProfileKind::Concentrate),
            "edible" => Some(ProfileKind::Edible),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Inclusive bounds in % w/w.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: Decimal,
    pub max: Decimal,
}

impl Range {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check that the range is a usable percentage interval.
    pub fn validate(&self, analyte: &str) -> Result<(), AssayError> {
        let invalid = |reason: String| AssayError::InvalidRange {
            analyte: analyte.to_string(),
            reason,
        };
        if self.min.is_sign_negative() && !self.min.is_zero() {
            return Err(invalid(format!("min {} is negative", self.min)));
        }
        if self.min > self.max {
            return Err(invalid(format!(
                "min {} is greater than max {}",
                self.min, self.max
            )));
        }
        if self.max > Decimal::ONE_HUNDRED {
            return Err(invalid(format!("max {} exceeds 100 %", self.max)));
        }
        Ok(())
    }
}

/// Primary analyte a minor analyte is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    Thca,
    D9Thc,
}

/// Minor analyte quantity = ratio * basis draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioDef {
    pub analyte: Analyte,
    pub basis: Basis,
    pub ratio: Decimal,
}

/// A product profile: default primary ranges plus minor-analyte ratios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDef {
    pub profile: ProfileKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub thca: Range,
    pub d9_thc: Range,
    /// Moisture drawn for plant material, if the profile defines it.
    #[serde(default)]
    pub moisture: Option<Range>,
    #[serde(default)]
    pub ratios: Vec<RatioDef>,
}

/// Caller-supplied bounds overriding a profile's primary ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRange {
    #[serde(default)]
    pub thca: Option<Range>,
    #[serde(default)]
    pub d9_thc: Option<Range>,
}

impl CustomRange {
    pub fn validate(&self) -> Result<(), AssayError> {
        if let Some(thca) = &self.thca {
            thca.validate("thca")?;
        }
        if let Some(d9) = &self.d9_thc {
            d9.validate("d9_thc")?;
        }
        Ok(())
    }
}
