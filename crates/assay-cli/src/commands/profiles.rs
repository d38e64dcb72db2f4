use assay_core::error::AssayError;
use assay_core::profiles::builtin;
use assay_core::profiles::schema::{Basis, ProfileDef};
use assay_core::reference::{self, Analyte};
use std::path::Path;

pub fn list() -> Result<(), AssayError> {
    println!("Available predefined profiles:\n");
    for name in builtin::PRESETS {
        let profile = builtin::load_preset(name)?;
        println!(
            "  {:<15} {} (v{})  THCA {}-{} %, D9-THC {}-{} %",
            name,
            profile.name,
            profile.version,
            profile.thca.min,
            profile.thca.max,
            profile.d9_thc.min,
            profile.d9_thc.max
        );
        if let Some(ref desc) = profile.description {
            println!("                  {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(preset: &str) -> Result<(), AssayError> {
    let profile = builtin::load_preset(preset)?;

    println!("{} (version {})\n", profile.name, profile.version);

    if let Some(ref desc) = profile.description {
        println!("{}\n", desc);
    }

    println!("Primary analytes are drawn uniformly within:\n");
    println!("  THCA     {} - {} %", profile.thca.min, profile.thca.max);
    println!("  D9-THC   {} - {} %", profile.d9_thc.min, profile.d9_thc.max);
    match &profile.moisture {
        Some(m) => println!("  Moisture {} - {} % (flower and pre-rolls only)\n", m.min, m.max),
        None => println!("  Moisture not generated\n"),
    }

    println!("Minor analytes are derived from the primary draws:\n");

    let max_name_len = profile
        .ratios
        .iter()
        .map(|r| r.analyte.to_string().len())
        .max()
        .unwrap_or(10);

    println!("  {:<width$}  {:<8}  Basis", "Analyte", "Ratio", width = max_name_len);
    println!("  {}", "-".repeat(max_name_len + 18));

    for analyte in reference::report_order() {
        if matches!(analyte, Analyte::Thca | Analyte::D9Thc) {
            continue;
        }
        match profile.ratios.iter().find(|r| r.analyte == analyte) {
            Some(r) => {
                let basis = match r.basis {
                    Basis::Thca => "THCA",
                    Basis::D9Thc => "D9-THC",
                };
                println!(
                    "  {:<width$}  {:<8}  {}",
                    analyte.to_string(),
                    r.ratio,
                    basis,
                    width = max_name_len
                );
            }
            None => println!(
                "  {:<width$}  {:<8}  (not detected)",
                analyte.to_string(),
                "0",
                width = max_name_len
            ),
        }
    }

    println!();
    println!("Every analyte is classified against the fixed LOD/LOQ reference table");
    println!("(`{}`, unit {}).\n", reference::reference_table().version, reference::reference_table().unit);

    Ok(())
}

pub fn schema() -> Result<(), AssayError> {
    print!(
        r#"JSON Profile Schema
===================

A profile file describes a category of product: the ranges the two
primary cannabinoids are drawn from when generating a report, and the
ratios that derive every minor cannabinoid from those draws.

Top-level fields:
  profile       (string, required)  Variant: high-potency, low-potency,
                                    hemp-compliant, decarboxylated,
                                    concentrate or edible
  name          (string, required)  Human-readable name
  description   (string, optional)  What this profile represents
  version       (string, required)  Version identifier (e.g., "2025.1")
  thca          (object, required)  {{ "min": "18", "max": "30" }} in % w/w
  d9_thc        (object, required)  Same shape, for Delta-9-THC
  moisture      (object, optional)  Moisture range for flower and pre-rolls
  ratios        (array, optional)   Minor analyte derivations (see below)

Each entry in "ratios":
  analyte       (string, required)  Analyte key: d8_thc, thcv, cbd, cbda,
                                    cbdv, cbg, cbga, cbn, cbc
  basis         (string, required)  "thca" or "d9_thc"
  ratio         (string, required)  Multiplier applied to the basis draw

Example:
{{
  "profile": "low-potency",
  "name": "House flower",
  "version": "1.0",
  "thca": {{ "min": "10", "max": "14" }},
  "d9_thc": {{ "min": "0.2", "max": "0.6" }},
  "moisture": {{ "min": "9", "max": "12" }},
  "ratios": [
    {{ "analyte": "cbga", "basis": "thca", "ratio": "0.04" }},
    {{ "analyte": "cbn", "basis": "d9_thc", "ratio": "0.05" }}
  ]
}}

Note: numbers must be quoted strings, not bare numbers, to keep exact
decimal precision (e.g., "0.25" not 0.25). Ranges must lie within
0-100 with min <= max. THCA and D9-THC cannot appear in "ratios".
"#
    );
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), AssayError> {
    let profile = assay_core::profiles::load_profile(file)?;

    println!(
        "Profile '{}' (v{}, {}) is valid.",
        profile.name, profile.version, profile.profile
    );
    println!("  Ratios: {} analytes", profile.ratios.len());

    let warnings = profile_warnings(&profile);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

/// Issues that make a profile suspicious without making it unusable.
fn profile_warnings(profile: &ProfileDef) -> Vec<String> {
    let mut warnings = Vec::new();
    for analyte in reference::report_order() {
        if matches!(analyte, Analyte::Thca | Analyte::D9Thc) {
            continue;
        }
        if !profile.ratios.iter().any(|r| r.analyte == analyte) {
            warnings.push(format!(
                "no ratio for {}; it will always be reported as not detected",
                analyte.key()
            ));
        }
    }
    if profile.moisture.is_none() {
        warnings.push("no moisture range; flower reports will carry no moisture".into());
    }
    warnings
}
