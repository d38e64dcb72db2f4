pub mod normalize;
pub mod values;

use crate::classify::classify_quantity;
use crate::model::{
    percent_to_mg_per_g, AnalyteMeasurement, AnalyteResult, PanelStatus, ProductType, Report,
    TestStatus,
};
use crate::reference::{self, Analyte};
use normalize::normalize_analyte;
use rust_decimal::Decimal;
use values::{parse_quantity, ParsedQuantity};

/// Hand-entered potency results, one `name,value` line each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    /// Recognized analytes in input order.
    pub analytes: Vec<AnalyteMeasurement>,
    pub total_thc: Option<Decimal>,
    pub total_cbd: Option<Decimal>,
    pub total_cannabinoids: Option<Decimal>,
    pub moisture: Option<Decimal>,
    /// Lines that were ignored: unknown names, repeated analytes, no value column.
    pub skipped: Vec<String>,
    /// Names whose value could not be read; kept with a missing quantity.
    pub unparsed: Vec<String>,
}

impl ParsedSheet {
    /// Wrap the sheet in a report. Stated totals are taken as entered.
    pub fn into_report(
        self,
        sample_id: impl Into<String>,
        batch_id: impl Into<String>,
        product_type: ProductType,
    ) -> Report {
        let cannabinoids = if self.analytes.is_empty() {
            PanelStatus::NotTested
        } else {
            PanelStatus::Complete
        };
        let moisture = if self.moisture.is_some() {
            PanelStatus::Complete
        } else {
            PanelStatus::NotTested
        };
        Report {
            sample_id: sample_id.into(),
            batch_id: batch_id.into(),
            product_type,
            profile: None,
            moisture: self.moisture,
            status: TestStatus {
                batch: PanelStatus::Complete,
                cannabinoids,
                moisture,
                ..TestStatus::default()
            },
            unit_dose: None,
            analytes: self.analytes,
            total_thc: self.total_thc,
            total_cbd: self.total_cbd,
            total_cannabinoids: self.total_cannabinoids,
            per_unit: None,
        }
    }
}

/// Parse `name,value` lines into measurements.
///
/// Columns may be separated by a comma, semicolon, tab or a gap of two or
/// more spaces. Values accept the forms `parse_quantity` understands. Rows
/// named `total_thc`, `total_cbd`, `total_cannabinoids` or `moisture` fill
/// the stated report fields instead of adding an analyte. Limits come from
/// the reference table.
pub fn parse_sheet(text: &str) -> ParsedSheet {
    let mut sheet = ParsedSheet::default();
    let mut seen: Vec<Analyte> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, raw_value)) = split_row(line) else {
            sheet.skipped.push(line.to_string());
            continue;
        };
        let key = normalize_analyte(name);
        if is_header_word(&key) {
            continue;
        }

        let quantity = match parse_quantity(raw_value) {
            Ok(q) => q,
            Err(e) => {
                tracing::debug!(name, error = %e, "unreadable value");
                sheet.unparsed.push(name.to_string());
                None
            }
        };

        let stated = match key.as_str() {
            "total_thc" => Some(&mut sheet.total_thc),
            "total_cbd" => Some(&mut sheet.total_cbd),
            "total_cannabinoids" | "total" => Some(&mut sheet.total_cannabinoids),
            "moisture" => Some(&mut sheet.moisture),
            _ => None,
        };
        if let Some(slot) = stated {
            *slot = match quantity {
                Some(ParsedQuantity::Value(v)) => Some(v),
                Some(_) => Some(Decimal::ZERO),
                None => None,
            };
            continue;
        }

        let Some(analyte) = Analyte::from_name(name) else {
            sheet.skipped.push(line.to_string());
            continue;
        };
        if seen.contains(&analyte) {
            sheet.skipped.push(line.to_string());
            continue;
        }
        seen.push(analyte);
        sheet.analytes.push(measurement(analyte, quantity));
    }

    tracing::debug!(
        analytes = sheet.analytes.len(),
        skipped = sheet.skipped.len(),
        unparsed = sheet.unparsed.len(),
        "parsed result sheet"
    );

    sheet
}

/// Turn a parsed quantity into a measurement against reference limits.
fn measurement(analyte: Analyte, quantity: Option<ParsedQuantity>) -> AnalyteMeasurement {
    let limits = reference::limits(analyte);
    let (lod, loq) = (limits.lod, limits.loq);

    let (percent, result) = match quantity {
        None => (None, AnalyteResult::NotDetected),
        Some(ParsedQuantity::Value(v)) => (Some(v), classify_quantity(Some(v), lod, loq).result),
        Some(ParsedQuantity::NotDetected) => (Some(Decimal::ZERO), AnalyteResult::NotDetected),
        Some(ParsedQuantity::BelowQuantitation) => (Some(lod), AnalyteResult::BelowQuantitation),
        Some(ParsedQuantity::BelowLimit(limit)) if limit <= lod => {
            (Some(Decimal::ZERO), AnalyteResult::NotDetected)
        }
        Some(ParsedQuantity::BelowLimit(_)) => (Some(lod), AnalyteResult::BelowQuantitation),
    };

    AnalyteMeasurement {
        name: analyte.key().to_string(),
        percent,
        mg_per_g: percent.and_then(percent_to_mg_per_g),
        lod,
        loq,
        result,
        mg_per_unit: None,
    }
}

/// Split a row into its name and first value column.
fn split_row(line: &str) -> Option<(&str, &str)> {
    let Some(idx) = line.find([',', ';', '\t']) else {
        let segments = split_by_whitespace_gaps(line);
        let name = *segments.first()?;
        let value = *segments.get(1)?;
        return Some((name.trim(), value.trim()));
    };
    // A decimal comma is only possible when the separator is not a comma
    let separator = line[idx..].chars().next()?;
    let name = line[..idx].trim();
    let rest = &line[idx + separator.len_utf8()..];
    let value = rest.split(separator).next().unwrap_or(rest);
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Split a line by gaps of 2+ whitespace characters.
fn split_by_whitespace_gaps(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = None;
    let mut space_count = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            space_count += 1;
            if space_count == 2 {
                if let Some(s) = start {
                    segments.push(line[s..i].trim_end());
                    start = None;
                }
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            space_count = 0;
        }
    }

    if let Some(s) = start {
        segments.push(&line[s..]);
    }

    segments
}

/// Column headings that may precede the data rows.
fn is_header_word(key: &str) -> bool {
    matches!(
        key,
        "analyte" | "name" | "compound" | "cannabinoid" | "value" | "result" | "percent"
    )
}
