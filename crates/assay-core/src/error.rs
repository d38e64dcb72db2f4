use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AssayError {
    #[error("report '{sample_id}' has no analyte measurements")]
    EmptyAnalyteList { sample_id: String },

    #[error("invalid custom range for {analyte}: {reason}")]
    InvalidRange { analyte: String, reason: String },

    #[error("invalid unit dose: {0}")]
    InvalidUnitDose(String),

    #[error("failed to parse quantity: {0}")]
    ParseError(String),

    #[error("failed to load profile from {path}: {reason}")]
    ProfileLoad { path: PathBuf, reason: String },

    #[error("invalid profile: {0}")]
    ProfileInvalid(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
