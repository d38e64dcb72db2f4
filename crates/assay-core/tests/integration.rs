//! End-to-end tests for report generation and validation.
//!
//! Reports are generated from the embedded profiles, edited the way a
//! hand-entered report goes wrong, and run through `validate_report`.

use assay_core::classify::classify_quantity;
use assay_core::config::EngineConfig;
use assay_core::error::AssayError;
use assay_core::generate::GenerationRequest;
use assay_core::model::{AnalyteMeasurement, AnalyteResult, ProductType, Report, UnitDose};
use assay_core::parsing::parse_sheet;
use assay_core::potency::aggregate;
use assay_core::profiles::builtin::load_kind;
use assay_core::profiles::schema::{CustomRange, ProfileKind, Range};
use assay_core::validate::{CheckType, NoHistory, Severity};
use assay_core::{generate_batch, generate_report, validate_batch, validate_report};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn request(profile: ProfileKind, seed: u64) -> GenerationRequest {
    GenerationRequest {
        sample_id: format!("S-{seed:04}"),
        batch_id: format!("B-{seed:04}"),
        profile,
        custom_range: None,
        product_type: ProductType::Flower,
        seed,
        unit_dose: None,
        moisture: None,
    }
}

fn generated(profile: ProfileKind, seed: u64) -> Report {
    generate_report(&request(profile, seed), &EngineConfig::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Test 1: Every profile generates reports that pass their own validation
// ---------------------------------------------------------------------------
#[test]
fn generated_reports_validate_clean() {
    let config = EngineConfig::default();
    for kind in ProfileKind::ALL {
        for seed in 0..10 {
            let report = generated(kind, seed);
            let verdict = validate_report(&report, &NoHistory, &config).unwrap();
            assert!(
                verdict.passed,
                "{kind} seed {seed} blocked: {:?}",
                verdict.errors
            );
            assert!(verdict.formula.findings.is_empty(), "{kind} seed {seed}");
        }
    }

    // Low custom range: D9-THC between LOD and LOQ, the only THC present
    let mut req = request(ProfileKind::LowPotency, 0);
    req.custom_range = Some(CustomRange {
        thca: Some(Range::new(dec!(0), dec!(0))),
        d9_thc: Some(Range::new(dec!(0.01), dec!(0.04))),
    });
    for seed in 0..10 {
        req.seed = seed;
        let report = generate_report(&req, &config).unwrap();
        let verdict = validate_report(&report, &NoHistory, &config).unwrap();
        assert!(verdict.passed, "low range seed {seed} blocked: {:?}", verdict.errors);
    }
}

// ---------------------------------------------------------------------------
// Test 2: 20 seeds from one profile stay in bounds and differ pairwise
// ---------------------------------------------------------------------------
#[test]
fn twenty_seeds_in_bounds_and_distinct() {
    let profile = load_kind(ProfileKind::LowPotency).unwrap();
    let reports: Vec<Report> = (100..120)
        .map(|seed| generated(ProfileKind::LowPotency, seed))
        .collect();

    let mut primaries = Vec::new();
    for report in &reports {
        let thca = report.analyte("thca").unwrap().percent.unwrap();
        let d9 = report.analyte("d9_thc").unwrap().percent.unwrap();
        assert!(profile.thca.contains(thca));
        assert!(profile.d9_thc.contains(d9));
        primaries.push((thca, d9));
    }

    for i in 0..primaries.len() {
        for j in (i + 1)..primaries.len() {
            assert_ne!(primaries[i], primaries[j], "seeds {i} and {j} collide");
        }
    }
}

// ---------------------------------------------------------------------------
// Test 3: Classifier boundaries at LOD 0.01 / LOQ 0.05
// ---------------------------------------------------------------------------
#[test]
fn classifier_boundaries() {
    let cases = [
        (dec!(0.005), AnalyteResult::NotDetected),
        (dec!(0.03), AnalyteResult::BelowQuantitation),
        (dec!(0.10), AnalyteResult::Detected),
    ];
    for (q, expected) in cases {
        assert_eq!(
            classify_quantity(Some(q), dec!(0.01), dec!(0.05)).result,
            expected
        );
    }
}

// ---------------------------------------------------------------------------
// Test 4: Duplicate sample id blocks even when every other field differs
// ---------------------------------------------------------------------------
#[test]
fn duplicate_sample_id_blocks() {
    let config = EngineConfig::default();
    let prior = generated(ProfileKind::HighPotency, 1);
    let mut report = generated(ProfileKind::Concentrate, 2);
    report.sample_id = prior.sample_id.clone();

    let verdict = validate_report(&report, &vec![prior], &config).unwrap();
    assert!(!verdict.passed);
    let dup = verdict
        .errors
        .iter()
        .find(|f| f.check == CheckType::Uniqueness)
        .unwrap();
    assert_eq!(dup.severity, Severity::Consistency);
    assert_eq!(dup.field.as_deref(), Some("sample_id"));
}

// ---------------------------------------------------------------------------
// Test 5: Total of all analytes below total THC is a logic error
// ---------------------------------------------------------------------------
#[test]
fn total_below_thc_is_logic_error() {
    let mut report = generated(ProfileKind::HighPotency, 5);
    report.total_cannabinoids = Some(report.total_thc.unwrap() - dec!(1));

    let verdict = validate_report(&report, &NoHistory, &EngineConfig::default()).unwrap();
    assert!(!verdict.passed);
    assert!(!verdict.logic.passed);
    assert!(verdict
        .logic
        .findings
        .iter()
        .any(|f| f.severity == Severity::Consistency && f.field.as_deref() == Some("total_cannabinoids")));
}

// ---------------------------------------------------------------------------
// Test 6: Hand edits surface as formula findings with both values
// ---------------------------------------------------------------------------
#[test]
fn stated_total_drift_graded_by_size() {
    let config = EngineConfig::default();
    let base = generated(ProfileKind::HighPotency, 9);
    let computed = base.total_thc.unwrap();

    let mut rounded = base.clone();
    rounded.total_thc = Some(computed.round_dp(2));
    let v = validate_report(&rounded, &NoHistory, &config).unwrap();
    assert!(v.formula.findings.is_empty());

    let mut drifted = base.clone();
    drifted.total_thc = Some(computed + dec!(0.05));
    let v = validate_report(&drifted, &NoHistory, &config).unwrap();
    assert!(v.passed);
    assert_eq!(v.warnings[0].check, CheckType::Formula);

    let mut wrong = base;
    wrong.total_thc = Some(computed + dec!(0.5));
    let v = validate_report(&wrong, &NoHistory, &config).unwrap();
    assert!(!v.passed);
    assert_eq!(v.errors[0].expected, Some(computed));
    assert_eq!(v.errors[0].actual, Some(computed + dec!(0.5)));
}

// ---------------------------------------------------------------------------
// Test 7: Gummy with unit dose carries consistent per-unit figures
// ---------------------------------------------------------------------------
#[test]
fn gummy_per_unit_roundtrip() {
    let config = EngineConfig::default();
    let mut req = request(ProfileKind::Edible, 11);
    req.product_type = ProductType::Gummy;
    req.unit_dose = Some(UnitDose {
        unit_weight_g: dec!(4),
        units_per_package: 10,
    });

    let report = generate_report(&req, &config).unwrap();
    let per_unit = report.per_unit.as_ref().unwrap();
    assert_eq!(
        per_unit.thc_mg_per_package,
        per_unit.thc_mg_per_unit * Decimal::from(10)
    );
    assert!(report.moisture.is_none());

    let verdict = validate_report(&report, &NoHistory, &config).unwrap();
    assert!(verdict.passed, "{:?}", verdict.errors);

    let mut missing = req.clone();
    missing.unit_dose = None;
    assert!(matches!(
        generate_report(&missing, &config),
        Err(AssayError::InvalidUnitDose(_))
    ));
}

// ---------------------------------------------------------------------------
// Test 8: Inverted custom range is rejected before drawing
// ---------------------------------------------------------------------------
#[test]
fn invalid_custom_range_rejected() {
    let mut req = request(ProfileKind::HighPotency, 1);
    req.custom_range = Some(CustomRange {
        thca: Some(Range::new(dec!(30), dec!(20))),
        d9_thc: None,
    });
    assert!(matches!(
        generate_report(&req, &EngineConfig::default()),
        Err(AssayError::InvalidRange { .. })
    ));
}

// ---------------------------------------------------------------------------
// Test 9: Hand-entered sheet imported and validated
// ---------------------------------------------------------------------------
#[test]
fn imported_sheet_validates() {
    let text = "\
Analyte;Value
THCA;22,0
Δ9-THC;1,2
CBD;ND
CBG;0,6
total_thc;20,49
total_cbd;0
total_cannabinoids;23,8
moisture;11
";
    let report = parse_sheet(text).into_report("S-IMP", "B-IMP", ProductType::Flower);
    let verdict = validate_report(&report, &NoHistory, &EngineConfig::default()).unwrap();
    assert!(verdict.passed, "{:?}", verdict.errors);
    assert!(verdict.flags.has_non_detects);
    assert_eq!(verdict.computed.total_thc, dec!(20.494));
}

// ---------------------------------------------------------------------------
// Test 10: Batch helpers keep order and summarize
// ---------------------------------------------------------------------------
#[test]
fn batch_roundtrip() {
    let config = EngineConfig::default();
    let requests: Vec<_> = (0..8).map(|s| request(ProfileKind::Decarboxylated, s)).collect();
    let reports: Vec<Report> = generate_batch(&requests, &config)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let verdicts = validate_batch(&reports, &NoHistory, &config);
    for (report, verdict) in reports.iter().zip(&verdicts) {
        assert_eq!(verdict.as_ref().unwrap().sample_id, report.sample_id);
    }
    assert!(assay_core::BatchSummary::from_results(&verdicts).all_passed());
}

// ---------------------------------------------------------------------------
// Test 11: Validation does not depend on call count
// ---------------------------------------------------------------------------
#[test]
fn validation_is_idempotent() {
    let config = EngineConfig::default();
    let history = vec![generated(ProfileKind::HighPotency, 1)];
    let mut report = generated(ProfileKind::HighPotency, 2);
    report.batch_id = history[0].batch_id.clone();
    let before = report.clone();

    let first = validate_report(&report, &history, &config).unwrap();
    let second = validate_report(&report, &history, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(report, before);
}

// ---------------------------------------------------------------------------
// Test 12: Low-dose edibles and beverages pass their own validation
// ---------------------------------------------------------------------------
#[test]
fn low_dose_per_unit_reports_validate_clean() {
    let config = EngineConfig::default();
    for seed in 0..20 {
        let mut req = request(ProfileKind::Edible, seed);
        req.product_type = if seed % 2 == 0 {
            ProductType::Edible
        } else {
            ProductType::Beverage
        };
        req.unit_dose = Some(UnitDose {
            unit_weight_g: dec!(355),
            units_per_package: 4,
        });
        req.custom_range = Some(CustomRange {
            thca: None,
            d9_thc: Some(Range::new(dec!(0.01), dec!(0.04))),
        });

        let report = generate_report(&req, &config).unwrap();
        let verdict = validate_report(&report, &NoHistory, &config).unwrap();
        assert!(verdict.passed, "seed {seed} blocked: {:?}", verdict.errors);
        assert!(verdict.logic.passed, "seed {seed}");
        assert!(verdict.formula.findings.is_empty(), "seed {seed}: {:?}", verdict.formula.findings);
    }
}

// ---------------------------------------------------------------------------
// Test 13: Oversized values are reported, never fatal
// ---------------------------------------------------------------------------
#[test]
fn oversized_values_are_structural() {
    let config = EngineConfig::default();
    let mut report = generated(ProfileKind::HighPotency, 3);
    let cbg = report.analytes.iter_mut().find(|a| a.name == "cbg").unwrap();
    cbg.percent = Some(Decimal::MAX);

    let verdict = validate_report(&report, &NoHistory, &config).unwrap();
    assert!(!verdict.passed);
    assert!(verdict.errors.iter().any(|f| {
        f.severity == Severity::Structural && f.field.as_deref() == Some("analytes.cbg")
    }));

    let mut gummy = request(ProfileKind::Edible, 4);
    gummy.product_type = ProductType::Gummy;
    gummy.unit_dose = Some(UnitDose {
        unit_weight_g: dec!(4),
        units_per_package: 10,
    });
    let mut report = generate_report(&gummy, &config).unwrap();
    report.unit_dose = Some(UnitDose {
        unit_weight_g: Decimal::MAX,
        units_per_package: 10,
    });
    let verdict = validate_report(&report, &NoHistory, &config).unwrap();
    assert!(verdict
        .errors
        .iter()
        .any(|f| f.field.as_deref() == Some("unit_dose.unit_weight_g")));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn percent() -> impl Strategy<Value = Decimal> {
    (0i64..=40_000_000).prop_map(|n| Decimal::new(n, 6))
}

fn measurement(name: &str, q: Decimal) -> AnalyteMeasurement {
    let c = classify_quantity(Some(q), dec!(0.01), dec!(0.05));
    AnalyteMeasurement::new(name, q, dec!(0.01), dec!(0.05), c.result)
}

fn analyte_list() -> impl Strategy<Value = Vec<AnalyteMeasurement>> {
    (
        percent(),
        percent(),
        prop::sample::subsequence(
            vec!["d8_thc", "thcv", "cbd", "cbda", "cbg", "cbn", "cbc"],
            0..=7,
        ),
        prop::collection::vec(percent(), 7),
    )
        .prop_map(|(d9, thca, minors, values)| {
            let mut list = vec![measurement("d9_thc", d9), measurement("thca", thca)];
            list.extend(minors.into_iter().zip(values).map(|(n, q)| measurement(n, q)));
            list
        })
}

fn report_with(analytes: Vec<AnalyteMeasurement>, sample_id: &str) -> Report {
    let totals = aggregate(&analytes, &EngineConfig::default()).totals;
    Report {
        sample_id: sample_id.into(),
        batch_id: "B-P".into(),
        product_type: ProductType::Flower,
        profile: None,
        moisture: None,
        status: Default::default(),
        unit_dose: None,
        analytes,
        total_thc: Some(totals.total_thc),
        total_cbd: Some(totals.total_cbd),
        total_cannabinoids: Some(totals.total_cannabinoids),
        per_unit: None,
    }
}

proptest! {
    #[test]
    fn total_thc_formula_holds(analytes in analyte_list()) {
        let totals = aggregate(&analytes, &EngineConfig::default()).totals;
        let d9 = analytes[0].percent.unwrap();
        let thca = analytes[1].percent.unwrap();
        let expected = d9 + dec!(0.877) * thca;
        prop_assert!((totals.total_thc - expected).abs() <= dec!(0.0001));
    }

    #[test]
    fn own_totals_have_zero_mismatch(analytes in analyte_list()) {
        let report = report_with(analytes, "S-P");
        let verdict = validate_report(&report, &NoHistory, &EngineConfig::default()).unwrap();
        prop_assert!(verdict.formula.passed);
        prop_assert!(verdict
            .formula
            .findings
            .iter()
            .all(|f| !f.field.as_deref().unwrap_or("").starts_with("total")));
        prop_assert!(verdict.logic.passed, "{:?}", verdict.logic.findings);
        prop_assert!(verdict.passed, "{:?}", verdict.errors);
    }

    #[test]
    fn duplicate_id_always_blocks(a in analyte_list(), b in analyte_list(), batch in "[A-Z]{2}-[0-9]{3}") {
        let prior = report_with(a, "S-SAME");
        let mut report = report_with(b, "S-SAME");
        report.batch_id = batch;
        let verdict = validate_report(&report, &vec![prior], &EngineConfig::default()).unwrap();
        prop_assert!(verdict
            .errors
            .iter()
            .any(|f| f.check == CheckType::Uniqueness && f.severity == Severity::Consistency));
    }

    #[test]
    fn total_below_thc_always_blocks(analytes in analyte_list(), gap in 1i64..1_000_000) {
        let thc = aggregate(&analytes, &EngineConfig::default()).thc_contribution;
        let mut report = report_with(analytes, "S-P");
        report.total_cannabinoids = Some(thc - Decimal::new(gap, 6));
        let verdict = validate_report(&report, &NoHistory, &EngineConfig::default()).unwrap();
        prop_assert!(verdict
            .logic
            .findings
            .iter()
            .any(|f| f.severity == Severity::Consistency));
    }

    #[test]
    fn classifier_partitions_quantities(q in percent(), lod in 1i64..50, span in 0i64..50) {
        let lod = Decimal::new(lod, 3);
        let loq = lod + Decimal::new(span, 3);
        let c = classify_quantity(Some(q), lod, loq);
        let expected = if q < lod {
            AnalyteResult::NotDetected
        } else if q < loq {
            AnalyteResult::BelowQuantitation
        } else {
            AnalyteResult::Detected
        };
        prop_assert_eq!(c.result, expected);
        prop_assert!(c.is_clean());
    }
}
