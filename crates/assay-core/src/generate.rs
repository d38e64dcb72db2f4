use crate::classify::{classify_panel, classify_quantity, MAX_PERCENT};
use crate::config::EngineConfig;
use crate::error::AssayError;
use crate::model::{AnalyteMeasurement, ProductType, Report, TestStatus, UnitDose, PanelStatus};
use crate::potency::{aggregate, per_unit_totals};
use crate::profiles::schema::{Basis, CustomRange, ProfileDef, ProfileKind, Range};
use crate::reference::{self, Analyte};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places of a primary analyte draw (10^-6 % resolution).
const PRIMARY_SCALE: u32 = 6;

/// Decimal places of a moisture draw.
const MOISTURE_SCALE: u32 = 2;

/// Everything needed to produce one synthetic report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub sample_id: String,
    pub batch_id: String,
    pub profile: ProfileKind,
    #[serde(default)]
    pub custom_range: Option<CustomRange>,
    #[serde(default)]
    pub product_type: ProductType,
    pub seed: u64,
    /// Required for edible, gummy and beverage products.
    #[serde(default)]
    pub unit_dose: Option<UnitDose>,
    /// Measured moisture; drawn from the profile for plant material when absent.
    #[serde(default)]
    pub moisture: Option<Decimal>,
}

/// Generate a complete, internally consistent report from a profile.
///
/// THCA and D9-THC are drawn from the profile bounds (or the request's custom
/// range), every other analyte is derived from those draws through the
/// profile's ratios, and each analyte is classified against the reference
/// LOD/LOQ table. Analytes come out in reference-table order. The same seed
/// and inputs always produce the same report.
pub fn generate(
    request: &GenerationRequest,
    profile: &ProfileDef,
    config: &EngineConfig,
) -> Result<Report, AssayError> {
    let (thca_range, d9_range) = effective_ranges(profile, request.custom_range.as_ref())?;
    let unit_dose = checked_unit_dose(request)?;

    let mut rng = ChaCha20Rng::seed_from_u64(request.seed);
    let thca = draw(&mut rng, &thca_range, PRIMARY_SCALE, "thca")?;
    let d9_thc = draw(&mut rng, &d9_range, PRIMARY_SCALE, "d9_thc")?;

    let moisture = match (request.moisture, &profile.moisture) {
        (Some(m), _) => Some(m),
        (None, Some(range)) if request.product_type.is_plant_material() => {
            Some(draw(&mut rng, range, MOISTURE_SCALE, "moisture")?)
        }
        _ => None,
    };

    let analytes = reference::report_order()
        .map(|analyte| {
            let quantity = match analyte {
                Analyte::Thca => thca,
                Analyte::D9Thc => d9_thc,
                other => derived_quantity(profile, other, thca, d9_thc)?,
            };
            measurement(analyte, quantity, unit_dose)
        })
        .collect::<Result<Vec<AnalyteMeasurement>, AssayError>>()?;

    let totals = aggregate(&analytes, config).totals;
    let per_unit = unit_dose
        .map(|dose| per_unit_totals(&totals, dose).ok_or_else(|| unit_weight_too_large(dose)))
        .transpose()?;

    tracing::debug!(
        sample_id = %request.sample_id,
        profile = %profile.profile,
        seed = request.seed,
        %thca,
        %d9_thc,
        "generated report"
    );

    Ok(Report {
        sample_id: request.sample_id.clone(),
        batch_id: request.batch_id.clone(),
        product_type: request.product_type,
        profile: Some(profile.profile),
        moisture,
        status: TestStatus {
            batch: PanelStatus::Complete,
            cannabinoids: PanelStatus::Complete,
            moisture: classify_panel(request.product_type.is_plant_material(), moisture.is_some()),
            heavy_metals: PanelStatus::NotSubmitted,
            pesticides: PanelStatus::NotSubmitted,
            microbials: PanelStatus::NotSubmitted,
        },
        unit_dose: unit_dose.cloned(),
        analytes,
        total_thc: Some(totals.total_thc),
        total_cbd: Some(totals.total_cbd),
        total_cannabinoids: Some(totals.total_cannabinoids),
        per_unit,
    })
}

/// Primary bounds after applying a custom override.
fn effective_ranges(
    profile: &ProfileDef,
    custom: Option<&CustomRange>,
) -> Result<(Range, Range), AssayError> {
    let mut thca = profile.thca;
    let mut d9_thc = profile.d9_thc;
    if let Some(custom) = custom {
        custom.validate()?;
        if let Some(r) = custom.thca {
            thca = r;
        }
        if let Some(r) = custom.d9_thc {
            d9_thc = r;
        }
    }
    Ok((thca, d9_thc))
}

fn checked_unit_dose(request: &GenerationRequest) -> Result<Option<&UnitDose>, AssayError> {
    if !request.product_type.is_per_unit() {
        return Ok(None);
    }
    let dose = request.unit_dose.as_ref().ok_or_else(|| {
        AssayError::InvalidUnitDose(format!(
            "{} products require a unit weight and units per package",
            request.product_type
        ))
    })?;
    if dose.unit_weight_g <= Decimal::ZERO {
        return Err(AssayError::InvalidUnitDose(format!(
            "unit weight {} g must be positive",
            dose.unit_weight_g
        )));
    }
    if dose.units_per_package == 0 {
        return Err(AssayError::InvalidUnitDose(
            "units per package must be at least 1".into(),
        ));
    }
    Ok(Some(dose))
}

/// Uniform draw within inclusive bounds at a fixed decimal resolution.
fn draw(
    rng: &mut ChaCha20Rng,
    range: &Range,
    scale: u32,
    analyte: &str,
) -> Result<Decimal, AssayError> {
    let factor = Decimal::from(10_i64.pow(scale));
    let to_units = |value: Decimal| {
        value.to_i64().ok_or_else(|| AssayError::InvalidRange {
            analyte: analyte.to_string(),
            reason: format!("bound {value} is out of range"),
        })
    };
    let lo = to_units((range.min * factor).ceil())?;
    let hi = to_units((range.max * factor).floor())?;

    // Bounds finer than the draw resolution
    if lo > hi {
        return Ok(range.min);
    }

    Ok(Decimal::new(rng.gen_range(lo..=hi), scale))
}

fn derived_quantity(
    profile: &ProfileDef,
    analyte: Analyte,
    thca: Decimal,
    d9_thc: Decimal,
) -> Result<Decimal, AssayError> {
    let Some(r) = profile.ratios.iter().find(|r| r.analyte == analyte) else {
        return Ok(Decimal::ZERO);
    };
    let basis = match r.basis {
        Basis::Thca => thca,
        Basis::D9Thc => d9_thc,
    };
    r.ratio
        .checked_mul(basis)
        .filter(|q| *q <= MAX_PERCENT)
        .ok_or_else(|| AssayError::InvalidRange {
            analyte: analyte.key().to_string(),
            reason: format!("ratio {} over a {} % draw exceeds 100 %", r.ratio, basis),
        })
}

fn unit_weight_too_large(dose: &UnitDose) -> AssayError {
    AssayError::InvalidUnitDose(format!(
        "unit weight {} g is too large to compute per-unit masses",
        dose.unit_weight_g
    ))
}

fn measurement(
    analyte: Analyte,
    quantity: Decimal,
    unit_dose: Option<&UnitDose>,
) -> Result<AnalyteMeasurement, AssayError> {
    let limits = reference::limits(analyte);
    let classification = classify_quantity(Some(quantity), limits.lod, limits.loq);
    let mut m = AnalyteMeasurement::new(
        analyte.key(),
        quantity,
        limits.lod,
        limits.loq,
        classification.result,
    );
    if let (Some(dose), Some(mg_per_g)) = (unit_dose, m.mg_per_g) {
        let mass = mg_per_g
            .checked_mul(dose.unit_weight_g)
            .ok_or_else(|| unit_weight_too_large(dose))?;
        m.mg_per_unit = Some(mass);
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalyteResult;
    use crate::profiles::builtin::load_kind;
    use rust_decimal_macros::dec;

    fn request(profile: ProfileKind, seed: u64) -> GenerationRequest {
        GenerationRequest {
            sample_id: format!("S-{seed}"),
            batch_id: "B-1".into(),
            profile,
            custom_range: None,
            product_type: ProductType::Flower,
            seed,
            unit_dose: None,
            moisture: None,
        }
    }

    fn run(req: &GenerationRequest) -> Report {
        let profile = load_kind(req.profile).unwrap();
        generate(req, &profile, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let req = request(ProfileKind::HighPotency, 7);
        assert_eq!(run(&req), run(&req));
    }

    #[test]
    fn test_primaries_within_profile_bounds() {
        let profile = load_kind(ProfileKind::HighPotency).unwrap();
        for seed in 0..50 {
            let report = run(&request(ProfileKind::HighPotency, seed));
            let thca = report.analyte("thca").unwrap().percent.unwrap();
            let d9 = report.analyte("d9_thc").unwrap().percent.unwrap();
            assert!(profile.thca.contains(thca), "thca {thca} out of bounds");
            assert!(profile.d9_thc.contains(d9), "d9 {d9} out of bounds");
        }
    }

    #[test]
    fn test_custom_range_overrides_profile() {
        let mut req = request(ProfileKind::HighPotency, 3);
        req.custom_range = Some(CustomRange {
            thca: Some(Range::new(dec!(5), dec!(6))),
            d9_thc: None,
        });
        let report = run(&req);
        let thca = report.analyte("thca").unwrap().percent.unwrap();
        assert!(thca >= dec!(5) && thca <= dec!(6));
    }

    #[test]
    fn test_invalid_custom_range_rejected() {
        let mut req = request(ProfileKind::HighPotency, 3);
        req.custom_range = Some(CustomRange {
            thca: None,
            d9_thc: Some(Range::new(dec!(2), dec!(1))),
        });
        let profile = load_kind(req.profile).unwrap();
        let err = generate(&req, &profile, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AssayError::InvalidRange { .. }));
    }

    #[test]
    fn test_degenerate_range_returns_min() {
        let mut req = request(ProfileKind::HighPotency, 3);
        req.custom_range = Some(CustomRange {
            thca: Some(Range::new(dec!(21.5), dec!(21.5))),
            d9_thc: None,
        });
        let report = run(&req);
        assert_eq!(report.analyte("thca").unwrap().percent, Some(dec!(21.5)));
    }

    #[test]
    fn test_analyte_order_is_reference_order() {
        let report = run(&request(ProfileKind::LowPotency, 11));
        let names: Vec<&str> = report.analytes.iter().map(|a| a.name.as_str()).collect();
        let expected: Vec<&str> = reference::report_order().map(|a| a.key()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_minor_analytes_follow_ratios() {
        let report = run(&request(ProfileKind::HighPotency, 5));
        let thca = report.analyte("thca").unwrap().percent.unwrap();
        let cbga = report.analyte("cbga").unwrap().percent.unwrap();
        assert_eq!(cbga, dec!(0.035) * thca);
        // No ratio for delta-8 in this profile
        let d8 = report.analyte("d8_thc").unwrap();
        assert_eq!(d8.percent, Some(Decimal::ZERO));
        assert_eq!(d8.result, AnalyteResult::NotDetected);
    }

    #[test]
    fn test_totals_match_aggregator() {
        let report = run(&request(ProfileKind::Concentrate, 9));
        let totals = aggregate(&report.analytes, &EngineConfig::default()).totals;
        assert_eq!(report.total_thc, Some(totals.total_thc));
        assert_eq!(report.total_cbd, Some(totals.total_cbd));
        assert_eq!(report.total_cannabinoids, Some(totals.total_cannabinoids));
    }

    #[test]
    fn test_flower_gets_moisture_from_profile() {
        let profile = load_kind(ProfileKind::HighPotency).unwrap();
        let report = run(&request(ProfileKind::HighPotency, 21));
        let moisture = report.moisture.unwrap();
        assert!(profile.moisture.unwrap().contains(moisture));
        assert_eq!(report.status.moisture, PanelStatus::Complete);
    }

    #[test]
    fn test_concentrate_has_no_moisture() {
        let mut req = request(ProfileKind::Concentrate, 21);
        req.product_type = ProductType::Concentrate;
        let report = run(&req);
        assert!(report.moisture.is_none());
        assert_eq!(report.status.moisture, PanelStatus::NotSubmitted);
    }

    #[test]
    fn test_gummy_requires_unit_dose() {
        let mut req = request(ProfileKind::Edible, 1);
        req.product_type = ProductType::Gummy;
        let profile = load_kind(req.profile).unwrap();
        let err = generate(&req, &profile, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AssayError::InvalidUnitDose(_)));
    }

    #[test]
    fn test_gummy_per_unit_mass() {
        let mut req = request(ProfileKind::Edible, 1);
        req.product_type = ProductType::Gummy;
        req.unit_dose = Some(UnitDose {
            unit_weight_g: dec!(4),
            units_per_package: 10,
        });
        let report = run(&req);
        let d9 = report.analyte("d9_thc").unwrap();
        assert_eq!(d9.mg_per_unit, Some(d9.percent.unwrap() * dec!(40)));
        let per_unit = report.per_unit.unwrap();
        assert_eq!(
            per_unit.thc_mg_per_package,
            per_unit.thc_mg_per_unit * dec!(10)
        );
    }

    #[test]
    fn test_oversized_ratio_rejected() {
        let req = request(ProfileKind::HighPotency, 1);
        let mut profile = load_kind(req.profile).unwrap();
        profile.ratios[0].ratio = Decimal::MAX;
        let err = generate(&req, &profile, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AssayError::InvalidRange { .. }));
    }

    #[test]
    fn test_oversized_unit_weight_rejected() {
        let mut req = request(ProfileKind::Edible, 1);
        req.product_type = ProductType::Beverage;
        req.unit_dose = Some(UnitDose {
            unit_weight_g: Decimal::MAX,
            units_per_package: 4,
        });
        let profile = load_kind(req.profile).unwrap();
        let err = generate(&req, &profile, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AssayError::InvalidUnitDose(_)));
    }

    #[test]
    fn test_flower_has_no_per_unit_mass() {
        let report = run(&request(ProfileKind::HighPotency, 2));
        assert!(report.per_unit.is_none());
        assert!(report.analytes.iter().all(|a| a.mg_per_unit.is_none()));
    }
}
