use super::history::ReportHistory;
use super::show;
use super::verdict::{CheckResult, CheckType, Finding, Severity};
use crate::model::Report;
use crate::parsing::normalize::normalize_analyte;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

const CHECK: CheckType = CheckType::Uniqueness;

/// Analyte values keyed by normalized name, order-independent.
type Fingerprint = Vec<(String, Option<Decimal>)>;

/// Compare a report against previously issued reports.
///
/// Only a reused sample id blocks publishing; copied values and shared batch
/// ids are surfaced as warnings. The history should not contain the report
/// being checked.
pub fn check_uniqueness(report: &Report, history: &dyn ReportHistory) -> CheckResult {
    let fingerprint = fingerprint(report);

    let mut same_sample = 0usize;
    let mut same_batch = BTreeSet::new();
    let mut same_values = BTreeSet::new();
    let mut same_moisture = BTreeSet::new();

    for prior in history.reports() {
        if prior.sample_id == report.sample_id {
            same_sample += 1;
            continue;
        }
        let id = prior.sample_id.as_str();
        if prior.batch_id == report.batch_id {
            same_batch.insert(id);
        }
        if let Some(fp) = &fingerprint {
            if fingerprint_of(prior) == *fp {
                same_values.insert(id);
            }
        }
        if report.moisture.is_some() && prior.moisture == report.moisture {
            same_moisture.insert(id);
        }
    }

    let mut findings = Vec::new();

    if same_sample > 0 {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Consistency,
                format!(
                    "sample id {} was already used by {same_sample} prior report(s)",
                    report.sample_id
                ),
            )
            .with_field("sample_id"),
        );
    }

    if !same_values.is_empty() {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                format!(
                    "analyte values are identical to sample(s) {}",
                    join(&same_values)
                ),
            )
            .with_field("analytes"),
        );
    }

    if let (Some(moisture), false) = (report.moisture, same_moisture.is_empty()) {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                format!(
                    "moisture {} % is identical to sample(s) {}",
                    show(moisture),
                    join(&same_moisture)
                ),
            )
            .with_field("moisture"),
        );
    }

    if !same_batch.is_empty() {
        findings.push(
            Finding::new(
                CHECK,
                Severity::Warning,
                format!(
                    "batch id {} is shared with sample(s) {}",
                    report.batch_id,
                    join(&same_batch)
                ),
            )
            .with_field("batch_id"),
        );
    }

    tracing::debug!(
        sample_id = %report.sample_id,
        findings = findings.len(),
        "uniqueness check complete"
    );

    CheckResult::from_findings(CHECK, findings)
}

/// Fingerprint of a report that has at least one non-zero value.
///
/// An all-zero panel says nothing about copying, so it never matches.
fn fingerprint(report: &Report) -> Option<Fingerprint> {
    let has_value = report
        .analytes
        .iter()
        .any(|a| a.percent.is_some_and(|p| !p.is_zero()));
    has_value.then(|| fingerprint_of(report))
}

fn fingerprint_of(report: &Report) -> Fingerprint {
    let mut values: Fingerprint = report
        .analytes
        .iter()
        .map(|a| (normalize_analyte(&a.name), a.percent.map(|p| p.normalize())))
        .collect();
    values.sort();
    values
}

fn join(ids: &BTreeSet<&str>) -> String {
    ids.iter().copied().collect::<Vec<_>>().join(", ")
}
