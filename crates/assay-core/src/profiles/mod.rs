pub mod builtin;
pub mod schema;

use crate::error::AssayError;
use crate::reference::Analyte;
use schema::ProfileDef;
use std::collections::HashSet;
use std::path::Path;

/// Load a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<ProfileDef, AssayError> {
    let content = std::fs::read_to_string(path).map_err(|e| AssayError::ProfileLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_profile(&content, path)
}

/// Parse a profile from a JSON string.
pub fn parse_profile(json: &str, source: &Path) -> Result<ProfileDef, AssayError> {
    let profile: ProfileDef = serde_json::from_str(json).map_err(|e| AssayError::ProfileLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Parse a profile from a JSON string (no file path context).
pub fn parse_profile_str(json: &str) -> Result<ProfileDef, AssayError> {
    let profile: ProfileDef = serde_json::from_str(json)?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Validate that a profile is well-formed.
pub fn validate_profile(profile: &ProfileDef) -> Result<(), AssayError> {
    if profile.name.trim().is_empty() {
        return Err(AssayError::ProfileInvalid(
            "profile name must not be empty".into(),
        ));
    }

    profile
        .thca
        .validate("thca")
        .map_err(|e| AssayError::ProfileInvalid(e.to_string()))?;
    profile
        .d9_thc
        .validate("d9_thc")
        .map_err(|e| AssayError::ProfileInvalid(e.to_string()))?;
    if let Some(moisture) = &profile.moisture {
        moisture
            .validate("moisture")
            .map_err(|e| AssayError::ProfileInvalid(e.to_string()))?;
    }

    let mut seen = HashSet::new();
    for ratio in &profile.ratios {
        if matches!(ratio.analyte, Analyte::Thca | Analyte::D9Thc) {
            return Err(AssayError::ProfileInvalid(format!(
                "'{}' is a primary analyte and cannot be derived from a ratio",
                ratio.analyte.key()
            )));
        }

        if ratio.ratio.is_sign_negative() && !ratio.ratio.is_zero() {
            return Err(AssayError::ProfileInvalid(format!(
                "ratio for '{}' must not be negative",
                ratio.analyte.key()
            )));
        }

        if !seen.insert(ratio.analyte) {
            return Err(AssayError::ProfileInvalid(format!(
                "analyte '{}' has more than one ratio",
                ratio.analyte.key()
            )));
        }
    }

    Ok(())
}
