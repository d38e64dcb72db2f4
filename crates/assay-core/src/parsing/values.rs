use crate::error::AssayError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// A hand-entered quantity, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuantity {
    /// A numeric percent-by-weight value.
    Value(Decimal),
    /// Reported as "ND".
    NotDetected,
    /// Reported as "<LOQ" without a number.
    BelowQuantitation,
    /// Reported as "< x" with an explicit limit.
    BelowLimit(Decimal),
}

/// Parse a hand-entered quantity string.
///
/// Handles formats like:
/// - "21.4" / "21,4" / "21.4 %" -> Value(21.4)
/// - "ND" / "n.d." -> NotDetected
/// - "<LOQ" -> BelowQuantitation
/// - "< 0.05" -> BelowLimit(0.05)
/// - "", "-", "N/A" -> None (missing)
pub fn parse_quantity(s: &str) -> Result<Option<ParsedQuantity>, AssayError> {
    let s = s.trim();

    if s.is_empty() || s == "-" || s == "—" || s.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }

    let lower = s.to_lowercase();
    if matches!(lower.as_str(), "nd" | "n.d." | "n.d" | "not detected") {
        return Ok(Some(ParsedQuantity::NotDetected));
    }

    if let Some(rest) = s.strip_prefix('<') {
        let rest = rest.trim();
        if rest.eq_ignore_ascii_case("loq") {
            return Ok(Some(ParsedQuantity::BelowQuantitation));
        }
        let limit = parse_decimal(rest)?;
        return Ok(Some(ParsedQuantity::BelowLimit(limit)));
    }

    let value = parse_decimal(s)?;
    Ok(Some(ParsedQuantity::Value(value)))
}

/// Parse a decimal value, accepting a decimal comma and a trailing percent sign.
fn parse_decimal(s: &str) -> Result<Decimal, AssayError> {
    let trimmed = s.trim().trim_end_matches('%').trim_end();
    let normalized = trimmed.replace(',', ".");
    Decimal::from_str(&normalized)
        .map_err(|e| AssayError::ParseError(format!("invalid number '{}': {}", s, e)))
}
