use assay_core::config::{load_config, EngineConfig};
use assay_core::error::AssayError;
use assay_core::model::ProductType;
use assay_core::parsing::parse_sheet;
use assay_core::potency::aggregate;
use std::path::PathBuf;

pub fn run(
    input_file: PathBuf,
    sample_id: String,
    batch_id: String,
    product: &str,
    fill_totals: bool,
    config_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
) -> Result<(), AssayError> {
    let config = match &config_file {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let product_type = ProductType::from_str_loose(product)
        .ok_or_else(|| AssayError::ParseError(format!("unknown product type '{product}'")))?;

    let text = std::fs::read_to_string(&input_file)?;
    let sheet = parse_sheet(&text);

    for line in &sheet.skipped {
        eprintln!("  skipped: {line}");
    }
    for name in &sheet.unparsed {
        eprintln!("  warning: value for {name} could not be read, left empty");
    }

    let mut report = sheet.into_report(sample_id, batch_id, product_type);
    if report.analytes.is_empty() {
        return Err(AssayError::EmptyAnalyteList {
            sample_id: report.sample_id,
        });
    }

    if fill_totals {
        let totals = aggregate(&report.analytes, &config).totals;
        report.total_thc.get_or_insert(totals.total_thc);
        report.total_cbd.get_or_insert(totals.total_cbd);
        report
            .total_cannabinoids
            .get_or_insert(totals.total_cannabinoids);
    }

    let json = serde_json::to_string_pretty(&report)?;
    match output_file {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!(
                "Imported {} analyte(s) for {}, written to {}",
                report.analytes.len(),
                report.sample_id,
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
