pub mod formula;
pub mod history;
pub mod logic;
pub mod uniqueness;
pub mod verdict;

pub use history::{NoHistory, ReportHistory};
pub use verdict::{CheckResult, CheckType, Finding, LogicFlags, Severity, Verdict};

use crate::config::EngineConfig;
use crate::error::AssayError;
use crate::model::Report;
use crate::potency::aggregate;
use rust_decimal::Decimal;

/// Validate a finished report.
///
/// Runs the formula, logic and uniqueness checks and merges them into one
/// verdict. Pure: the report and history are only read, and validating the
/// same inputs twice yields the same verdict. Fails only when the report has
/// no analytes at all.
pub fn validate(
    report: &Report,
    history: &dyn ReportHistory,
    config: &EngineConfig,
) -> Result<Verdict, AssayError> {
    if report.analytes.is_empty() {
        return Err(AssayError::EmptyAnalyteList {
            sample_id: report.sample_id.clone(),
        });
    }

    let aggregation = aggregate(&report.analytes, config);
    let formula = formula::check_formula(report, &aggregation, config);
    let (logic, flags) = logic::check_logic(report, &aggregation, config);
    let uniqueness = uniqueness::check_uniqueness(report, history);

    let verdict = Verdict::assemble(
        report.sample_id.clone(),
        formula,
        logic,
        uniqueness,
        flags,
        aggregation.totals,
    );

    if verdict.passed {
        tracing::debug!(
            sample_id = %verdict.sample_id,
            warnings = verdict.warnings.len(),
            "report passed validation"
        );
    } else {
        tracing::warn!(
            sample_id = %verdict.sample_id,
            errors = verdict.errors.len(),
            warnings = verdict.warnings.len(),
            first_error = %verdict.errors[0].message,
            "report blocked from publishing"
        );
    }

    Ok(verdict)
}

/// Compact rendering for finding messages; full precision stays in `expected`/`actual`.
pub(crate) fn show(value: Decimal) -> String {
    value.round_dp(4).normalize().to_string()
}
