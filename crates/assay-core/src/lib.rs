pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod generate;
pub mod model;
pub mod parsing;
pub mod potency;
pub mod profiles;
pub mod reference;
pub mod validate;

pub use batch::{generate_batch, validate_batch, BatchSummary};

use config::EngineConfig;
use error::AssayError;
use generate::GenerationRequest;
use model::Report;
use validate::{ReportHistory, Verdict};

/// Main generation entry point: build a report from one of the predefined profiles.
///
/// The profile named in the request is loaded from the embedded presets and
/// its ranges are narrowed by the request's custom range, if any.
pub fn generate_report(
    request: &GenerationRequest,
    config: &EngineConfig,
) -> Result<Report, AssayError> {
    let profile = profiles::builtin::load_kind(request.profile)?;
    generate::generate(request, &profile, config)
}

/// Main validation entry point: check a report against itself and its history.
///
/// Business-rule violations are returned inside the verdict. Only a report
/// that cannot be validated at all (no analytes) is an error.
pub fn validate_report(
    report: &Report,
    history: &dyn ReportHistory,
    config: &EngineConfig,
) -> Result<Verdict, AssayError> {
    validate::validate(report, history, config)
}
