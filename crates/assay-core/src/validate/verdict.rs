use crate::potency::PotencyTotals;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Formula,
    Logic,
    Uniqueness,
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckType::Formula => write!(f, "formula"),
            CheckType::Logic => write!(f, "logic"),
            CheckType::Uniqueness => write!(f, "uniqueness"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Malformed or missing numeric input, treated as zero.
    Structural,
    /// An internal contradiction in the report.
    Consistency,
    /// Surfaced for review, does not block publishing.
    Warning,
}

impl Severity {
    pub fn blocks_publish(&self) -> bool {
        matches!(self, Severity::Structural | Severity::Consistency)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Structural => write!(f, "structural error"),
            Severity::Consistency => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check: CheckType,
    pub severity: Severity,
    pub message: String,
    /// Report field the finding refers to (e.g. "total_thc", "analytes.cbd").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Recomputed or required value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Decimal>,
    /// Value found in the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Decimal>,
}

impl Finding {
    pub fn new(check: CheckType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check,
            severity,
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_values(mut self, expected: Option<Decimal>, actual: Option<Decimal>) -> Self {
        self.expected = expected;
        self.actual = actual;
        self
    }
}

/// Outcome of one of the three checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: CheckType,
    /// False if any finding blocks publishing.
    pub passed: bool,
    pub findings: Vec<Finding>,
}

impl CheckResult {
    pub fn from_findings(check: CheckType, findings: Vec<Finding>) -> Self {
        Self {
            check,
            passed: !findings.iter().any(|f| f.severity.blocks_publish()),
            findings,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity.blocks_publish())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.severity.blocks_publish())
    }
}

/// Informational flags raised by the logic check. Not findings by themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicFlags {
    /// At least one analyte is not detected or below quantitation.
    pub has_non_detects: bool,
    /// A CBD-family analyte (CBD, CBDA, CBDV) is present.
    pub has_cbd_family: bool,
    /// Delta-8-THC is present and must be called out on the report.
    pub has_delta8: bool,
}

/// Combined result of validating one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub sample_id: String,
    /// True iff no finding blocks publishing.
    pub passed: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub formula: CheckResult,
    pub logic: CheckResult,
    pub uniqueness: CheckResult,
    pub flags: LogicFlags,
    /// Totals recomputed from the analyte list.
    pub computed: PotencyTotals,
}

impl Verdict {
    /// Merge the three checks. Flat lists keep formula, logic, uniqueness order.
    pub fn assemble(
        sample_id: impl Into<String>,
        formula: CheckResult,
        logic: CheckResult,
        uniqueness: CheckResult,
        flags: LogicFlags,
        computed: PotencyTotals,
    ) -> Self {
        let checks = [&formula, &logic, &uniqueness];
        let errors: Vec<Finding> = checks
            .into_iter()
            .flat_map(|c| c.errors())
            .cloned()
            .collect();
        let warnings: Vec<Finding> = checks
            .into_iter()
            .flat_map(|c| c.warnings())
            .cloned()
            .collect();

        Self {
            sample_id: sample_id.into(),
            passed: errors.is_empty(),
            errors,
            warnings,
            formula,
            logic,
            uniqueness,
            flags,
            computed,
        }
    }
}
