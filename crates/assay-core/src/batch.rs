use crate::config::EngineConfig;
use crate::error::AssayError;
use crate::generate::GenerationRequest;
use crate::model::Report;
use crate::validate::{ReportHistory, Verdict};
use rayon::prelude::*;
use serde::Serialize;

/// Generate one report per request in parallel. Output order matches input order.
pub fn generate_batch(
    requests: &[GenerationRequest],
    config: &EngineConfig,
) -> Vec<Result<Report, AssayError>> {
    requests
        .par_iter()
        .map(|request| crate::generate_report(request, config))
        .collect()
}

/// Validate each report against the same history in parallel.
///
/// Reports in the batch are not compared with each other; pass earlier
/// entries as history to catch duplicates inside one batch.
pub fn validate_batch(
    reports: &[Report],
    history: &dyn ReportHistory,
    config: &EngineConfig,
) -> Vec<Result<Verdict, AssayError>> {
    reports
        .par_iter()
        .map(|report| crate::validate_report(report, history, config))
        .collect()
}

/// Counts over a validated batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub passed: usize,
    pub blocked: usize,
    /// Reports that could not be validated at all.
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[Result<Verdict, AssayError>]) -> Self {
        results
            .iter()
            .fold(BatchSummary::default(), |mut summary, result| {
                match result {
                    Ok(v) if v.passed => summary.passed += 1,
                    Ok(_) => summary.blocked += 1,
                    Err(_) => summary.failed += 1,
                }
                summary
            })
    }

    pub fn all_passed(&self) -> bool {
        self.blocked == 0 && self.failed == 0
    }
}
