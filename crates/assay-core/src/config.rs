use crate::error::AssayError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mass retained when an acid-form cannabinoid decarboxylates (THCA -> THC, CBDA -> CBD).
pub const DECARB_FACTOR: Decimal = Decimal::from_parts(877, 0, 0, false, 3);

/// Stated and recomputed totals within this many percentage points agree.
pub const FORMULA_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Formula mismatches above this many percentage points block publishing.
pub const FORMULA_ERROR_THRESHOLD: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// What a below-quantitation analyte contributes to the total of all analytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelowLoqPolicy {
    /// Contributes nothing, same as not detected.
    #[default]
    Zero,
    /// Contributes half of the analyte's LOQ.
    HalfLoq,
}

impl BelowLoqPolicy {
    pub fn contribution(&self, loq: Decimal) -> Decimal {
        match self {
            BelowLoqPolicy::Zero => Decimal::ZERO,
            BelowLoqPolicy::HalfLoq => loq / Decimal::TWO,
        }
    }
}

/// Engine-wide constants. Fixed for a deployment, never varied per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub decarb_factor: Decimal,
    pub formula_tolerance: Decimal,
    pub formula_error_threshold: Decimal,
    /// Accepted moisture range in %, inclusive.
    pub moisture_min: Decimal,
    pub moisture_max: Decimal,
    pub below_loq_policy: BelowLoqPolicy,
    /// Total THC ceiling for hemp-compliant products, in %.
    pub hemp_thc_limit: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decarb_factor: DECARB_FACTOR,
            formula_tolerance: FORMULA_TOLERANCE,
            formula_error_threshold: FORMULA_ERROR_THRESHOLD,
            moisture_min: Decimal::from(5),
            moisture_max: Decimal::from(15),
            below_loq_policy: BelowLoqPolicy::Zero,
            hemp_thc_limit: Decimal::from_parts(3, 0, 0, false, 1),
        }
    }
}

/// Load engine config from a JSON file. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig, AssayError> {
    let content = std::fs::read_to_string(path).map_err(|e| AssayError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: EngineConfig =
        serde_json::from_str(&content).map_err(|e| AssayError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse engine config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<EngineConfig, AssayError> {
    let config: EngineConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is usable.
pub fn validate_config(config: &EngineConfig) -> Result<(), AssayError> {
    if config.decarb_factor <= Decimal::ZERO || config.decarb_factor > Decimal::ONE {
        return Err(AssayError::ConfigInvalid(format!(
            "decarb_factor {} must be in (0, 1]",
            config.decarb_factor
        )));
    }

    if config.formula_tolerance.is_sign_negative() {
        return Err(AssayError::ConfigInvalid(
            "formula_tolerance must not be negative".into(),
        ));
    }

    if config.formula_error_threshold < config.formula_tolerance {
        return Err(AssayError::ConfigInvalid(format!(
            "formula_error_threshold {} is below formula_tolerance {}",
            config.formula_error_threshold, config.formula_tolerance
        )));
    }

    if config.moisture_min > config.moisture_max {
        return Err(AssayError::ConfigInvalid(format!(
            "moisture range {}-{} is empty",
            config.moisture_min, config.moisture_max
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.decarb_factor, dec!(0.877));
        assert_eq!(c.formula_tolerance, dec!(0.01));
        assert_eq!(c.formula_error_threshold, dec!(0.10));
        assert_eq!(c.hemp_thc_limit, dec!(0.3));
        assert_eq!(c.below_loq_policy, BelowLoqPolicy::Zero);
        assert!(validate_config(&c).is_ok());
    }

    #[test]
    fn test_policy_contribution() {
        assert_eq!(BelowLoqPolicy::Zero.contribution(dec!(0.05)), dec!(0));
        assert_eq!(BelowLoqPolicy::HalfLoq.contribution(dec!(0.05)), dec!(0.025));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c = parse_config_str(r#"{ "below_loq_policy": "half_loq" }"#).unwrap();
        assert_eq!(c.below_loq_policy, BelowLoqPolicy::HalfLoq);
        assert_eq!(c.moisture_max, dec!(15));
    }

    #[test]
    fn test_threshold_below_tolerance_rejected() {
        let json = r#"{ "formula_tolerance": "0.5", "formula_error_threshold": "0.1" }"#;
        assert!(matches!(
            parse_config_str(json),
            Err(AssayError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_bad_decarb_factor_rejected() {
        assert!(parse_config_str(r#"{ "decarb_factor": "1.2" }"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "moisture_min": "8", "moisture_max": "12" }}"#).unwrap();
        let c = load_config(file.path()).unwrap();
        assert_eq!(c.moisture_min, dec!(8));
        assert_eq!(c.moisture_max, dec!(12));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/assay.json")).unwrap_err();
        assert!(matches!(err, AssayError::ConfigLoad { .. }));
    }
}
