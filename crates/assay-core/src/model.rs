use crate::profiles::schema::ProfileKind;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places used when presenting percentages and masses.
pub const DISPLAY_DP: u32 = 2;

/// Round a value for presentation. Never feed the result back into a calculation.
pub fn display_value(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", DISPLAY_DP as usize, rounded)
}

/// Categorical outcome for a single analyte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyteResult {
    NotDetected,
    BelowQuantitation,
    Detected,
}

impl fmt::Display for AnalyteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyteResult::NotDetected => write!(f, "ND"),
            AnalyteResult::BelowQuantitation => write!(f, "<LOQ"),
            AnalyteResult::Detected => write!(f, "Detected"),
        }
    }
}

/// Status of a whole test panel. Never applies to a single analyte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelStatus {
    Complete,
    NotSubmitted,
    #[default]
    NotTested,
}

impl fmt::Display for PanelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelStatus::Complete => write!(f, "Complete"),
            PanelStatus::NotSubmitted => write!(f, "Not Submitted"),
            PanelStatus::NotTested => write!(f, "Not Tested"),
        }
    }
}

/// Per-panel status flags, one independent dimension per test category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStatus {
    #[serde(default)]
    pub batch: PanelStatus,
    #[serde(default)]
    pub cannabinoids: PanelStatus,
    #[serde(default)]
    pub moisture: PanelStatus,
    #[serde(default)]
    pub heavy_metals: PanelStatus,
    #[serde(default)]
    pub pesticides: PanelStatus,
    #[serde(default)]
    pub microbials: PanelStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[default]
    Flower,
    PreRoll,
    Concentrate,
    Vape,
    Edible,
    Gummy,
    Beverage,
    Tincture,
    Topical,
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProductType::Flower => "Flower",
            ProductType::PreRoll => "Pre-Roll",
            ProductType::Concentrate => "Concentrate",
            ProductType::Vape => "Vape",
            ProductType::Edible => "Edible",
            ProductType::Gummy => "Gummy",
            ProductType::Beverage => "Beverage",
            ProductType::Tincture => "Tincture",
            ProductType::Topical => "Topical",
        };
        write!(f, "{s}")
    }
}

impl ProductType {
    pub fn from_str_loose(s: &str) -> Option<ProductType> {
        let lower = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        match lower.as_str() {
            "flower" | "bud" => Some(ProductType::Flower),
            "preroll" | "joint" => Some(ProductType::PreRoll),
            "concentrate" | "extract" | "wax" | "shatter" => Some(ProductType::Concentrate),
            "vape" | "cartridge" | "cart" => Some(ProductType::Vape),
            "edible" => Some(ProductType::Edible),
            "gummy" | "gummies" => Some(ProductType::Gummy),
            "beverage" | "drink" => Some(ProductType::Beverage),
            "tincture" => Some(ProductType::Tincture),
            "topical" => Some(ProductType::Topical),
            _ => None,
        }
    }

    /// Products labelled by absolute mass per serving unit.
    pub fn is_per_unit(&self) -> bool {
        matches!(
            self,
            ProductType::Edible | ProductType::Gummy | ProductType::Beverage
        )
    }

    /// Plant material, for which a moisture figure is meaningful.
    pub fn is_plant_material(&self) -> bool {
        matches!(self, ProductType::Flower | ProductType::PreRoll)
    }
}

/// Declared serving size of a per-unit product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDose {
    /// Weight of one serving unit in grams.
    pub unit_weight_g: Decimal,
    /// Number of serving units in a package.
    pub units_per_package: u32,
}

/// Absolute potency per serving and per package, in mg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerUnitTotals {
    pub thc_mg_per_unit: Decimal,
    pub cbd_mg_per_unit: Decimal,
    pub thc_mg_per_package: Decimal,
    pub cbd_mg_per_package: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyteMeasurement {
    /// Canonical analyte key (e.g. "thca", "d9_thc").
    pub name: String,
    /// Percent by weight. `None` when the source value was missing or unparseable.
    #[serde(default)]
    pub percent: Option<Decimal>,
    /// Equivalent mass per gram, `percent * 10`.
    #[serde(default)]
    pub mg_per_g: Option<Decimal>,
    pub lod: Decimal,
    pub loq: Decimal,
    pub result: AnalyteResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mg_per_unit: Option<Decimal>,
}

impl AnalyteMeasurement {
    /// Build a measurement, deriving the mg/g figure from the percentage.
    pub fn new(
        name: impl Into<String>,
        percent: Decimal,
        lod: Decimal,
        loq: Decimal,
        result: AnalyteResult,
    ) -> Self {
        Self {
            name: name.into(),
            percent: Some(percent),
            mg_per_g: percent_to_mg_per_g(percent),
            lod,
            loq,
            result,
            mg_per_unit: None,
        }
    }
}

/// Exact unit conversion from percent-by-weight to mg/g.
///
/// `None` when the value is too large to convert.
pub fn percent_to_mg_per_g(percent: Decimal) -> Option<Decimal> {
    percent.checked_mul(Decimal::TEN)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub sample_id: String,
    pub batch_id: String,
    #[serde(default)]
    pub product_type: ProductType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileKind>,
    #[serde(default)]
    pub moisture: Option<Decimal>,
    #[serde(default)]
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_dose: Option<UnitDose>,
    pub analytes: Vec<AnalyteMeasurement>,
    #[serde(default)]
    pub total_thc: Option<Decimal>,
    #[serde(default)]
    pub total_cbd: Option<Decimal>,
    #[serde(default)]
    pub total_cannabinoids: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_unit: Option<PerUnitTotals>,
}

impl Report {
    /// Find an analyte by canonical key.
    pub fn analyte(&self, key: &str) -> Option<&AnalyteMeasurement> {
        self.analytes.iter().find(|a| a.name == key)
    }
}
