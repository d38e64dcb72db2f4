use crate::classify::{classify_measurement, Classification, MAX_PERCENT};
use crate::config::EngineConfig;
use crate::model::{percent_to_mg_per_g, AnalyteMeasurement, AnalyteResult, PerUnitTotals, UnitDose};
use crate::reference::Analyte;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived potency totals, in % w/w, at full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotencyTotals {
    pub total_thc: Decimal,
    pub total_cbd: Decimal,
    pub total_cannabinoids: Decimal,
}

/// One analyte's re-derived classification and its share of the grand total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyteContribution {
    pub name: String,
    /// Known analyte, if the name resolves against the reference table.
    pub analyte: Option<Analyte>,
    pub classification: Classification,
    /// Amount added to `total_cannabinoids`.
    pub contribution: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    pub totals: PotencyTotals,
    /// Total THC counted the way `total_cannabinoids` counts it: D9-THC and
    /// THCA contribute by result, so a below-quantitation value adds only the
    /// policy value. Never exceeds `total_cannabinoids`.
    pub thc_contribution: Decimal,
    /// Per-analyte detail, in input order.
    pub contributions: Vec<AnalyteContribution>,
}

/// Compute total THC, total CBD and the total of all analytes.
///
/// - total THC = D9-THC + f * THCA
/// - total CBD = CBD + f * CBDA
/// - total of all analytes = sum of contributions, where a not-detected
///   analyte adds 0 and a below-quantitation analyte adds the configured
///   policy value.
///
/// `f` is the decarboxylation factor (0.877 by default). Delta-8-THC never
/// enters total THC. Analytes are re-classified from their own quantity and
/// limits; the stated result tag is not trusted.
pub fn aggregate(analytes: &[AnalyteMeasurement], config: &EngineConfig) -> Aggregation {
    let mut d9_thc = Decimal::ZERO;
    let mut thca = Decimal::ZERO;
    let mut cbd = Decimal::ZERO;
    let mut cbda = Decimal::ZERO;
    let mut total_cannabinoids = Decimal::ZERO;
    let mut d9_thc_contribution = Decimal::ZERO;
    let mut thca_contribution = Decimal::ZERO;
    let mut contributions = Vec::with_capacity(analytes.len());

    for measurement in analytes {
        let analyte = Analyte::from_name(&measurement.name);
        let classification = classify_measurement(measurement);
        let q = classification.quantity;

        match analyte {
            Some(Analyte::D9Thc) => d9_thc += q,
            Some(Analyte::Thca) => thca += q,
            Some(Analyte::Cbd) => cbd += q,
            Some(Analyte::Cbda) => cbda += q,
            _ => {}
        }

        let contribution = match classification.result {
            AnalyteResult::NotDetected => Decimal::ZERO,
            AnalyteResult::BelowQuantitation => {
                config.below_loq_policy.contribution(measurement.loq.min(MAX_PERCENT))
            }
            AnalyteResult::Detected => q,
        };
        total_cannabinoids += contribution;
        match analyte {
            Some(Analyte::D9Thc) => d9_thc_contribution += contribution,
            Some(Analyte::Thca) => thca_contribution += contribution,
            _ => {}
        }

        contributions.push(AnalyteContribution {
            name: measurement.name.clone(),
            analyte,
            classification,
            contribution,
        });
    }

    Aggregation {
        totals: PotencyTotals {
            total_thc: d9_thc + config.decarb_factor * thca,
            total_cbd: cbd + config.decarb_factor * cbda,
            total_cannabinoids,
        },
        thc_contribution: d9_thc_contribution + config.decarb_factor * thca_contribution,
        contributions,
    }
}

/// Convert percentage totals into absolute mass per serving and per package.
///
/// `None` when the unit dose is too large for the masses to be represented.
pub fn per_unit_totals(totals: &PotencyTotals, dose: &UnitDose) -> Option<PerUnitTotals> {
    let units = Decimal::from(dose.units_per_package);
    let mass = |percent: Decimal| {
        percent_to_mg_per_g(percent)?.checked_mul(dose.unit_weight_g)
    };
    let thc_unit = mass(totals.total_thc)?;
    let cbd_unit = mass(totals.total_cbd)?;
    Some(PerUnitTotals {
        thc_mg_per_unit: thc_unit,
        cbd_mg_per_unit: cbd_unit,
        thc_mg_per_package: thc_unit.checked_mul(units)?,
        cbd_mg_per_package: cbd_unit.checked_mul(units)?,
    })
}
