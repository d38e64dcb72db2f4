use super::show;
use super::verdict::{CheckResult, CheckType, Finding, Severity};
use crate::config::EngineConfig;
use crate::model::{percent_to_mg_per_g, Report};
use crate::potency::{per_unit_totals, Aggregation};
use crate::reference::Analyte;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

const CHECK: CheckType = CheckType::Formula;

/// Recompute the report's derived figures and compare them with what it states.
///
/// Order of findings: malformed analyte input, stated totals, per-analyte
/// unit conversions and result tags, per-unit masses.
pub fn check_formula(report: &Report, aggregation: &Aggregation, config: &EngineConfig) -> CheckResult {
    let mut findings = Vec::new();

    structural_findings(aggregation, &mut findings);
    total_findings(report, aggregation, config, &mut findings);
    analyte_findings(report, aggregation, config, &mut findings);
    per_unit_findings(report, aggregation, config, &mut findings);

    tracing::debug!(
        sample_id = %report.sample_id,
        findings = findings.len(),
        "formula check complete"
    );

    CheckResult::from_findings(CHECK, findings)
}

fn structural_findings(aggregation: &Aggregation, findings: &mut Vec<Finding>) {
    for c in &aggregation.contributions {
        for issue in &c.classification.issues {
            findings.push(
                Finding::new(CHECK, Severity::Structural, format!("{}: {}", c.name, issue))
                    .with_field(format!("analytes.{}", c.name)),
            );
        }
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for c in &aggregation.contributions {
        let key = c.analyte.map(|a| a.key()).unwrap_or(c.name.as_str());
        *counts.entry(key).or_default() += 1;
    }
    for (key, count) in counts.into_iter().filter(|(_, n)| *n > 1) {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Structural,
                format!("{key} is listed {count} times; quantities were summed"),
            )
            .with_field(format!("analytes.{key}")),
        );
    }

    for c in aggregation.contributions.iter().filter(|c| c.analyte.is_none()) {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                format!(
                    "{} is not a recognized cannabinoid; it counts toward the total only",
                    c.name
                ),
            )
            .with_field(format!("analytes.{}", c.name)),
        );
    }
}

fn total_findings(
    report: &Report,
    aggregation: &Aggregation,
    config: &EngineConfig,
    findings: &mut Vec<Finding>,
) {
    let computed = &aggregation.totals;
    let delta8: Decimal = aggregation
        .contributions
        .iter()
        .filter(|c| c.analyte == Some(Analyte::D8Thc))
        .map(|c| c.classification.quantity)
        .sum();

    let stated_totals = [
        ("total_thc", computed.total_thc, report.total_thc),
        ("total_cbd", computed.total_cbd, report.total_cbd),
        (
            "total_cannabinoids",
            computed.total_cannabinoids,
            report.total_cannabinoids,
        ),
    ];

    for (field, expected, stated) in stated_totals {
        let Some(actual) = stated else {
            findings.push(
                Finding::new(
                    CHECK,
                    Severity::Structural,
                    format!("{field} is missing from the report"),
                )
                .with_field(field)
                .with_values(Some(expected), None),
            );
            continue;
        };

        let tolerance = config.formula_tolerance;
        let threshold = config.formula_error_threshold;
        if let Some(mut finding) = compare(field, expected, actual, tolerance, threshold, "%") {
            if field == "total_thc"
                && !delta8.is_zero()
                && actual
                    .checked_sub(expected + delta8)
                    .is_some_and(|d| d.abs() <= tolerance)
            {
                finding.message.push_str(
                    "; the stated value appears to include Delta-8-THC, which must be excluded",
                );
            }
            findings.push(finding);
        }
    }
}

fn analyte_findings(
    report: &Report,
    aggregation: &Aggregation,
    config: &EngineConfig,
    findings: &mut Vec<Finding>,
) {
    let tolerance = config.formula_tolerance.saturating_mul(Decimal::TEN);
    let threshold = config.formula_error_threshold.saturating_mul(Decimal::TEN);

    for (measurement, c) in report.analytes.iter().zip(&aggregation.contributions) {
        // A missing percentage is already reported by the classifier
        if let Some(percent) = measurement.percent {
            let field = format!("analytes.{}.mg_per_g", measurement.name);
            match (percent_to_mg_per_g(percent), measurement.mg_per_g) {
                (Some(expected), Some(mg_per_g)) => {
                    if let Some(f) = compare(&field, expected, mg_per_g, tolerance, threshold, "mg/g") {
                        findings.push(f);
                    }
                }
                (expected, None) => findings.push(
                    Finding::new(
                        CHECK,
                        Severity::Structural,
                        format!("{} has a percentage but no mg/g value", measurement.name),
                    )
                    .with_field(field)
                    .with_values(expected, None),
                ),
                (None, Some(mg_per_g)) => findings.push(
                    Finding::new(
                        CHECK,
                        Severity::Structural,
                        format!(
                            "{} % is too large to convert to mg/g",
                            show(percent)
                        ),
                    )
                    .with_field(field)
                    .with_values(None, Some(mg_per_g)),
                ),
            }
        }

        if c.classification.is_clean() && measurement.result != c.classification.result {
            findings.push(
                Finding::new(
                    CHECK,
                    Severity::Warning,
                    format!(
                        "{} is tagged {} but {} % classifies as {} (LOD {}, LOQ {})",
                        measurement.name,
                        measurement.result,
                        show(c.classification.quantity),
                        c.classification.result,
                        measurement.lod,
                        measurement.loq
                    ),
                )
                .with_field(format!("analytes.{}.result", measurement.name)),
            );
        }
    }
}

fn per_unit_findings(
    report: &Report,
    aggregation: &Aggregation,
    config: &EngineConfig,
    findings: &mut Vec<Finding>,
) {
    let Some(dose) = &report.unit_dose else {
        if report.product_type.is_per_unit() {
            findings.push(
                Finding::new(
                    CHECK,
                    Severity::Warning,
                    format!(
                        "{} product declares no unit dose; per-unit potency cannot be checked",
                        report.product_type
                    ),
                )
                .with_field("unit_dose"),
            );
        }
        return;
    };
    let Some(stated) = &report.per_unit else {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                "a unit dose is declared but per-unit masses are missing",
            )
            .with_field("per_unit"),
        );
        return;
    };

    let scales = percent_to_mg_per_g(dose.unit_weight_g).and_then(|unit| {
        let package = unit.checked_mul(Decimal::from(dose.units_per_package))?;
        Some((unit, package))
    });
    let (Some(expected), Some((per_unit_scale, per_package_scale))) =
        (per_unit_totals(&aggregation.totals, dose), scales)
    else {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Structural,
                format!(
                    "unit weight {} g is too large to compute per-unit masses",
                    show(dose.unit_weight_g)
                ),
            )
            .with_field("unit_dose.unit_weight_g"),
        );
        return;
    };

    let rows = [
        ("per_unit.thc_mg_per_unit", expected.thc_mg_per_unit, stated.thc_mg_per_unit, per_unit_scale),
        ("per_unit.cbd_mg_per_unit", expected.cbd_mg_per_unit, stated.cbd_mg_per_unit, per_unit_scale),
        ("per_unit.thc_mg_per_package", expected.thc_mg_per_package, stated.thc_mg_per_package, per_package_scale),
        ("per_unit.cbd_mg_per_package", expected.cbd_mg_per_package, stated.cbd_mg_per_package, per_package_scale),
    ];
    for (field, expected, actual, scale) in rows {
        let tolerance = config.formula_tolerance.saturating_mul(scale);
        let threshold = config.formula_error_threshold.saturating_mul(scale);
        if let Some(f) = compare(field, expected, actual, tolerance, threshold, "mg") {
            findings.push(f);
        }
    }
}

/// Grade a stated value against its recomputed value.
///
/// Within `tolerance` nothing is reported; up to `threshold` it is a warning;
/// beyond that a consistency error. A stated value too far out of range to
/// subtract is structural.
fn compare(
    field: &str,
    expected: Decimal,
    actual: Decimal,
    tolerance: Decimal,
    threshold: Decimal,
    unit: &str,
) -> Option<Finding> {
    let Some(diff) = expected.checked_sub(actual).map(|d| d.abs()) else {
        return Some(
            Finding::new(
                CHECK,
                Severity::Structural,
                format!("{field} stated as {} {unit} is out of range", show(actual)),
            )
            .with_field(field)
            .with_values(Some(expected), Some(actual)),
        );
    };
    if diff <= tolerance {
        return None;
    }
    let severity = if diff > threshold {
        Severity::Consistency
    } else {
        Severity::Warning
    };
    Some(
        Finding::new(
            CHECK,
            severity,
            format!(
                "{field} stated as {} {unit} but recomputes to {} {unit} (difference {})",
                show(actual),
                show(expected),
                show(diff)
            ),
        )
        .with_field(field)
        .with_values(Some(expected), Some(actual)),
    )
}
