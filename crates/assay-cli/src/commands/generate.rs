use assay_core::config::{load_config, EngineConfig};
use assay_core::error::AssayError;
use assay_core::generate::{generate, GenerationRequest};
use assay_core::model::{ProductType, Report, UnitDose};
use assay_core::profiles::schema::{CustomRange, ProfileDef, Range};
use assay_core::profiles::{builtin, load_profile};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::output;

pub struct Args {
    pub profile: String,
    pub profile_file: Option<PathBuf>,
    pub seed: u64,
    pub sample_id: String,
    pub batch_id: String,
    pub product: String,
    pub thca: (Option<Decimal>, Option<Decimal>),
    pub d9_thc: (Option<Decimal>, Option<Decimal>),
    pub moisture: Option<Decimal>,
    pub unit_weight: Option<Decimal>,
    pub units_per_package: Option<u32>,
    pub count: u32,
    pub config: Option<PathBuf>,
    pub output: String,
    pub out: Option<PathBuf>,
}

pub fn run(args: Args) -> Result<(), AssayError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let profile = match &args.profile_file {
        Some(path) => load_profile(path)?,
        None => builtin::load_preset(&args.profile)?,
    };

    let product_type = ProductType::from_str_loose(&args.product).ok_or_else(|| {
        AssayError::ParseError(format!("unknown product type '{}'", args.product))
    })?;

    let unit_dose = match (args.unit_weight, args.units_per_package) {
        (Some(unit_weight_g), Some(units_per_package)) => Some(UnitDose {
            unit_weight_g,
            units_per_package,
        }),
        (None, None) => None,
        _ => {
            return Err(AssayError::InvalidUnitDose(
                "--unit-weight and --units-per-package must be given together".into(),
            ))
        }
    };

    let custom_range = custom_range(&profile, args.thca, args.d9_thc);

    let requests: Vec<GenerationRequest> = (0..args.count.max(1))
        .map(|i| {
            let suffix = |id: &str| {
                if args.count > 1 {
                    format!("{id}-{:03}", i + 1)
                } else {
                    id.to_string()
                }
            };
            GenerationRequest {
                sample_id: suffix(&args.sample_id),
                batch_id: args.batch_id.clone(),
                profile: profile.profile,
                custom_range,
                product_type,
                seed: args.seed.wrapping_add(u64::from(i)),
                unit_dose: unit_dose.clone(),
                moisture: args.moisture,
            }
        })
        .collect();

    // Presets go through the parallel batch path; a custom file is generated in place
    let results = if args.profile_file.is_none() {
        assay_core::generate_batch(&requests, &config)
    } else {
        requests
            .iter()
            .map(|request| generate(request, &profile, &config))
            .collect()
    };
    let reports = results.into_iter().collect::<Result<Vec<Report>, _>>()?;

    if let Some(path) = &args.out {
        let json = if reports.len() == 1 {
            serde_json::to_string_pretty(&reports[0])?
        } else {
            serde_json::to_string_pretty(&reports)?
        };
        std::fs::write(path, json)?;
        eprintln!(
            "Generated {} report(s) from {}, written to {}",
            reports.len(),
            profile.name,
            path.display()
        );
        return Ok(());
    }

    match args.output.as_str() {
        "json" if reports.len() == 1 => output::json::print(&reports[0])?,
        "json" => output::json::print(&reports)?,
        _ => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                output::table::print_report(report);
            }
        }
    }

    Ok(())
}

/// Build an override from the command line, filling an omitted bound from the profile.
fn custom_range(
    profile: &ProfileDef,
    thca: (Option<Decimal>, Option<Decimal>),
    d9_thc: (Option<Decimal>, Option<Decimal>),
) -> Option<CustomRange> {
    let merge = |bounds: (Option<Decimal>, Option<Decimal>), default: Range| match bounds {
        (None, None) => None,
        (min, max) => Some(Range::new(
            min.unwrap_or(default.min),
            max.unwrap_or(default.max),
        )),
    };
    let range = CustomRange {
        thca: merge(thca, profile.thca),
        d9_thc: merge(d9_thc, profile.d9_thc),
    };
    (range.thca.is_some() || range.d9_thc.is_some()).then_some(range)
}
