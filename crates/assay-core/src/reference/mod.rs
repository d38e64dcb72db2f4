use crate::parsing::normalize::normalize_analyte;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

const ANALYTES_JSON: &str = include_str!("../../../../reference/analytes.json");

static REFERENCE_TABLE: LazyLock<ReferenceTable> = LazyLock::new(|| {
    serde_json::from_str(ANALYTES_JSON).expect("embedded analytes.json is valid")
});

/// Cannabinoids covered by the potency panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyte {
    D9Thc,
    Thca,
    D8Thc,
    Thcv,
    Cbd,
    Cbda,
    Cbdv,
    Cbg,
    Cbga,
    Cbn,
    Cbc,
}

impl Analyte {
    /// Canonical key as used in `AnalyteMeasurement::name`.
    pub fn key(&self) -> &'static str {
        match self {
            Analyte::D9Thc => "d9_thc",
            Analyte::Thca => "thca",
            Analyte::D8Thc => "d8_thc",
            Analyte::Thcv => "thcv",
            Analyte::Cbd => "cbd",
            Analyte::Cbda => "cbda",
            Analyte::Cbdv => "cbdv",
            Analyte::Cbg => "cbg",
            Analyte::Cbga => "cbga",
            Analyte::Cbn => "cbn",
            Analyte::Cbc => "cbc",
        }
    }

    /// Resolve a raw name ("Δ9-THC", "THC-A", "cbd") to a known analyte.
    pub fn from_name(raw: &str) -> Option<Analyte> {
        let key = normalize_analyte(raw);
        reference_table()
            .analytes
            .iter()
            .map(|entry| entry.analyte)
            .find(|a| a.key() == key)
    }

    pub fn is_cbd_family(&self) -> bool {
        matches!(self, Analyte::Cbd | Analyte::Cbda | Analyte::Cbdv)
    }
}

impl fmt::Display for Analyte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", limits(*self).display_name)
    }
}

/// Detection and quantitation limits for one analyte, in % w/w.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyteLimits {
    pub analyte: Analyte,
    pub display_name: String,
    pub lod: Decimal,
    pub loq: Decimal,
}

/// The fixed method reference table. Entry order is report order.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceTable {
    pub version: String,
    #[serde(default)]
    pub method: Option<String>,
    pub unit: String,
    pub analytes: Vec<AnalyteLimits>,
}

pub fn reference_table() -> &'static ReferenceTable {
    &REFERENCE_TABLE
}

/// Limits for an analyte. Every `Analyte` variant has a table entry.
pub fn limits(analyte: Analyte) -> &'static AnalyteLimits {
    REFERENCE_TABLE
        .analytes
        .iter()
        .find(|entry| entry.analyte == analyte)
        .unwrap_or_else(|| panic!("analytes.json has no entry for {}", analyte.key()))
}

/// Analytes in report order.
pub fn report_order() -> impl Iterator<Item = Analyte> {
    REFERENCE_TABLE.analytes.iter().map(|entry| entry.analyte)
}
