use assay_core::config::{load_config, EngineConfig};
use assay_core::error::AssayError;
use assay_core::model::Report;
use assay_core::validate::{NoHistory, ReportHistory};
use assay_core::BatchSummary;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::output;

/// A report file holds either one report or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReportFile {
    One(Box<Report>),
    Many(Vec<Report>),
}

/// Validate every report in the file. Returns whether all of them may be published.
pub fn run(
    input_file: PathBuf,
    history_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    output_format: &str,
    verbose: bool,
) -> Result<bool, AssayError> {
    let config = match &config_file {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let reports = match read_json::<ReportFile>(&input_file)? {
        ReportFile::One(report) => vec![*report],
        ReportFile::Many(reports) => reports,
    };

    let history: Option<Vec<Report>> = match &history_file {
        Some(path) => Some(read_json(path)?),
        None => None,
    };
    tracing::debug!(
        reports = reports.len(),
        history = history.as_ref().map_or(0, Vec::len),
        "validating report file"
    );
    let history: &dyn ReportHistory = match &history {
        Some(reports) => reports,
        None => &NoHistory,
    };

    let results = assay_core::validate_batch(&reports, history, &config);
    let summary = BatchSummary::from_results(&results);

    match output_format {
        "json" => {
            let verdicts = results.into_iter().collect::<Result<Vec<_>, _>>()?;
            if verdicts.len() == 1 {
                output::json::print(&verdicts[0])?;
            } else {
                output::json::print(&verdicts)?;
            }
        }
        _ => {
            for (i, (report, result)) in reports.iter().zip(&results).enumerate() {
                if i > 0 {
                    println!();
                }
                match result {
                    Ok(verdict) => output::table::print_verdict(verdict, verbose),
                    Err(e) => println!("=== {} ===\n\n  Error: {e}", report.sample_id),
                }
            }
            if reports.len() > 1 {
                println!();
                output::table::print_summary(&summary);
            }
        }
    }

    Ok(summary.all_passed())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AssayError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
