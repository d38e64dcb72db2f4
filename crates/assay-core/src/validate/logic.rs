use super::show;
use super::verdict::{CheckResult, CheckType, Finding, LogicFlags, Severity};
use crate::config::EngineConfig;
use crate::model::{AnalyteResult, PanelStatus, Report};
use crate::potency::Aggregation;
use crate::profiles::schema::ProfileKind;
use crate::reference::Analyte;

const CHECK: CheckType = CheckType::Logic;

/// Domain rules over a report. Each rule yields at most one finding.
///
/// Stated totals are used where the report has them, otherwise the
/// recomputed ones; a missing total is already a formula finding. Total THC
/// is held against the total of all analytes net of any THC that only
/// reached below-quantitation, so recomputed totals always satisfy it.
pub fn check_logic(
    report: &Report,
    aggregation: &Aggregation,
    config: &EngineConfig,
) -> (CheckResult, LogicFlags) {
    let mut findings = Vec::new();
    let contributions = &aggregation.contributions;
    let total_thc = report.total_thc.unwrap_or(aggregation.totals.total_thc);
    let total_all = report
        .total_cannabinoids
        .unwrap_or(aggregation.totals.total_cannabinoids);

    let flags = LogicFlags {
        has_non_detects: contributions
            .iter()
            .any(|c| c.classification.result != AnalyteResult::Detected),
        has_cbd_family: contributions.iter().any(|c| {
            c.analyte.is_some_and(|a| a.is_cbd_family())
                && c.classification.result != AnalyteResult::NotDetected
        }),
        has_delta8: contributions.iter().any(|c| {
            c.analyte == Some(Analyte::D8Thc)
                && c.classification.result != AnalyteResult::NotDetected
        }),
    };

    // Below-quantitation THC counts in full toward total THC but only by
    // policy toward the total of all analytes; compare on the latter basis.
    let unquantified_thc = aggregation.totals.total_thc - aggregation.thc_contribution;
    let comparable_thc = total_thc.checked_sub(unquantified_thc).unwrap_or(total_thc);
    if total_all < comparable_thc {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Consistency,
                format!(
                    "total cannabinoids {} % is below total THC {} %",
                    show(total_all),
                    show(total_thc)
                ),
            )
            .with_field("total_cannabinoids")
            .with_values(Some(total_thc), Some(total_all)),
        );
    }

    if let Some(moisture) = report.moisture {
        if moisture.is_sign_negative() && !moisture.is_zero() {
            findings.push(
                Finding::new(
                    CHECK,
                    Severity::Structural,
                    format!("moisture {moisture} % is negative"),
                )
                .with_field("moisture")
                .with_values(None, Some(moisture)),
            );
        } else if moisture < config.moisture_min || moisture > config.moisture_max {
            findings.push(
                Finding::new(
                    CHECK,
                    Severity::Warning,
                    format!(
                        "moisture {} % is outside {}-{} %",
                        show(moisture),
                        config.moisture_min,
                        config.moisture_max
                    ),
                )
                .with_field("moisture")
                .with_values(None, Some(moisture)),
            );
        }
    }

    if flags.has_delta8 {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                "Delta-8-THC detected; it must be listed separately and excluded from total THC",
            )
            .with_field(format!("analytes.{}", Analyte::D8Thc.key())),
        );
    }

    if report.profile == Some(ProfileKind::HempCompliant) && total_thc > config.hemp_thc_limit {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                format!(
                    "total THC {} % exceeds the hemp limit of {} %",
                    show(total_thc),
                    config.hemp_thc_limit
                ),
            )
            .with_field("total_thc")
            .with_values(Some(config.hemp_thc_limit), Some(total_thc)),
        );
    }

    let any_detected = contributions
        .iter()
        .any(|c| c.classification.result == AnalyteResult::Detected);
    if any_detected && report.status.cannabinoids != PanelStatus::Complete {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                format!(
                    "cannabinoid results are present but the panel is marked {}",
                    report.status.cannabinoids
                ),
            )
            .with_field("status.cannabinoids"),
        );
    }

    if report.status.moisture == PanelStatus::Complete && report.moisture.is_none() {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                "moisture panel is Complete but no moisture value is reported",
            )
            .with_field("status.moisture"),
        );
    }

    tracing::debug!(
        sample_id = %report.sample_id,
        findings = findings.len(),
        has_non_detects = flags.has_non_detects,
        has_cbd_family = flags.has_cbd_family,
        has_delta8 = flags.has_delta8,
        "logic check complete"
    );

    (CheckResult::from_findings(CHECK, findings), flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyteMeasurement, TestStatus};
    use crate::potency::aggregate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn m(name: &str, percent: Decimal, result: AnalyteResult) -> AnalyteMeasurement {
        AnalyteMeasurement::new(name, percent, dec!(0.01), dec!(0.05), result)
    }

    fn report(analytes: Vec<AnalyteMeasurement>) -> Report {
        let totals = aggregate(&analytes, &EngineConfig::default()).totals;
        Report {
            sample_id: "S-1".into(),
            batch_id: "B-1".into(),
            product_type: Default::default(),
            profile: None,
            moisture: Some(dec!(10)),
            status: TestStatus {
                batch: PanelStatus::Complete,
                cannabinoids: PanelStatus::Complete,
                moisture: PanelStatus::Complete,
                ..TestStatus::default()
            },
            unit_dose: None,
            analytes,
            total_thc: Some(totals.total_thc),
            total_cbd: Some(totals.total_cbd),
            total_cannabinoids: Some(totals.total_cannabinoids),
            per_unit: None,
        }
    }

    fn run(r: &Report) -> (CheckResult, LogicFlags) {
        let config = EngineConfig::default();
        check_logic(r, &aggregate(&r.analytes, &config), &config)
    }

    fn flower() -> Vec<AnalyteMeasurement> {
        vec![
            m("d9_thc", dec!(0.9), AnalyteResult::Detected),
            m("thca", dec!(21), AnalyteResult::Detected),
            m("cbd", dec!(0), AnalyteResult::NotDetected),
        ]
    }

    #[test]
    fn test_clean_report() {
        let (result, flags) = run(&report(flower()));
        assert!(result.passed);
        assert!(result.findings.is_empty(), "{:?}", result.findings);
        assert!(flags.has_non_detects);
        assert!(!flags.has_cbd_family);
        assert!(!flags.has_delta8);
    }

    #[test]
    fn test_total_below_thc_is_error() {
        let mut r = report(flower());
        r.total_cannabinoids = Some(dec!(15));
        let (result, _) = run(&r);
        assert!(!result.passed);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Consistency);
        assert_eq!(result.findings[0].actual, Some(dec!(15)));
    }

    #[test]
    fn test_below_loq_thc_is_not_an_impossibility() {
        // Low-dose beverage: D9-THC between LOD and LOQ, nothing else present
        let analytes = vec![
            m("d9_thc", dec!(0.03), AnalyteResult::BelowQuantitation),
            m("thca", dec!(0), AnalyteResult::NotDetected),
        ];
        let mut r = report(analytes);
        r.moisture = None;
        r.status.moisture = PanelStatus::NotSubmitted;
        assert_eq!(r.total_thc, Some(dec!(0.03)));
        assert_eq!(r.total_cannabinoids, Some(dec!(0)));
        let (result, _) = run(&r);
        assert!(result.findings.is_empty(), "{:?}", result.findings);

        let config = EngineConfig {
            below_loq_policy: crate::config::BelowLoqPolicy::HalfLoq,
            ..EngineConfig::default()
        };
        let (result, _) = check_logic(&r, &aggregate(&r.analytes, &config), &config);
        // Stated total of 0 still falls short of the half-LOQ THC share
        assert!(!result.passed);

        r.total_cannabinoids = Some(aggregate(&r.analytes, &config).totals.total_cannabinoids);
        let (result, _) = check_logic(&r, &aggregate(&r.analytes, &config), &config);
        assert!(result.passed, "{:?}", result.findings);
    }

    #[test]
    fn test_below_loq_thc_still_catches_inflated_total_thc() {
        let analytes = vec![m("d9_thc", dec!(0.03), AnalyteResult::BelowQuantitation)];
        let mut r = report(analytes);
        r.total_thc = Some(dec!(0.5));
        let (result, _) = run(&r);
        assert!(!result.passed);
        assert_eq!(result.findings[0].field.as_deref(), Some("total_cannabinoids"));
    }

    #[test]
    fn test_moisture_out_of_range_is_warning() {
        let mut r = report(flower());
        r.moisture = Some(dec!(16.2));
        let (result, _) = run(&r);
        assert!(result.passed);
        assert_eq!(result.findings[0].field.as_deref(), Some("moisture"));
        assert_eq!(result.findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_moisture_bounds_inclusive() {
        for value in [dec!(5), dec!(15)] {
            let mut r = report(flower());
            r.moisture = Some(value);
            assert!(run(&r).0.findings.is_empty());
        }
    }

    #[test]
    fn test_negative_moisture_is_structural() {
        let mut r = report(flower());
        r.moisture = Some(dec!(-2));
        let (result, _) = run(&r);
        assert!(!result.passed);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Structural);
    }

    #[test]
    fn test_cbd_family_flag() {
        let mut analytes = flower();
        analytes.push(m("cbdv", dec!(0.03), AnalyteResult::BelowQuantitation));
        let (_, flags) = run(&report(analytes));
        assert!(flags.has_cbd_family);
    }

    #[test]
    fn test_delta8_warning_and_flag() {
        let mut analytes = flower();
        analytes.push(m("Δ8-THC", dec!(0.4), AnalyteResult::Detected));
        let (result, flags) = run(&report(analytes));
        assert!(flags.has_delta8);
        assert!(result.passed);
        assert_eq!(result.findings.len(), 1);
        assert!(result.findings[0].message.contains("Delta-8-THC"));
    }

    #[test]
    fn test_delta8_not_detected_is_silent() {
        let mut analytes = flower();
        analytes.push(m("d8_thc", dec!(0.002), AnalyteResult::NotDetected));
        let (result, flags) = run(&report(analytes));
        assert!(!flags.has_delta8);
        assert!(result.findings.is_empty());
    }

    #[test]
    fn test_hemp_profile_over_limit() {
        let mut r = report(flower());
        r.profile = Some(ProfileKind::HempCompliant);
        let (result, _) = run(&r);
        assert!(result.passed);
        assert_eq!(result.findings[0].field.as_deref(), Some("total_thc"));
        assert_eq!(result.findings[0].expected, Some(dec!(0.3)));
    }

    #[test]
    fn test_results_without_complete_panel() {
        let mut r = report(flower());
        r.status.cannabinoids = PanelStatus::NotTested;
        let (result, _) = run(&r);
        assert_eq!(
            result.findings[0].field.as_deref(),
            Some("status.cannabinoids")
        );
    }

    #[test]
    fn test_moisture_panel_without_value() {
        let mut r = report(flower());
        r.moisture = None;
        let (result, _) = run(&r);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].field.as_deref(), Some("status.moisture"));
    }

    #[test]
    fn test_falls_back_to_computed_totals() {
        let mut r = report(flower());
        r.total_thc = None;
        r.total_cannabinoids = None;
        let (result, _) = run(&r);
        assert!(result.passed);
    }
}
