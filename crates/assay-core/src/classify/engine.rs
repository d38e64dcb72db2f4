use crate::classify::outcome::{Classification, QuantityIssue};
use crate::model::{AnalyteMeasurement, AnalyteResult, PanelStatus};
use rust_decimal::Decimal;

/// Largest meaningful percent-by-weight value.
pub const MAX_PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Classify a quantity against its detection and quantitation limits.
///
/// q < LOD -> not detected, LOD <= q < LOQ -> below quantitation,
/// q >= LOQ -> detected. Missing, negative or above-100 % input is
/// classified as 0 and the problem is returned alongside the result.
pub fn classify_quantity(quantity: Option<Decimal>, lod: Decimal, loq: Decimal) -> Classification {
    let mut issues = Vec::new();

    let quantity = match quantity {
        None => {
            issues.push(QuantityIssue::Missing);
            Decimal::ZERO
        }
        Some(q) if q.is_sign_negative() && !q.is_zero() => {
            issues.push(QuantityIssue::Negative { value: q });
            Decimal::ZERO
        }
        Some(q) if q > MAX_PERCENT => {
            issues.push(QuantityIssue::OutOfRange { value: q });
            Decimal::ZERO
        }
        Some(q) => q,
    };

    if lod > loq {
        issues.push(QuantityIssue::LimitsInverted { lod, loq });
    }
    let in_range = |limit: Decimal| limit >= Decimal::ZERO && limit <= MAX_PERCENT;
    if !in_range(lod) || !in_range(loq) {
        issues.push(QuantityIssue::LimitsOutOfRange { lod, loq });
    }

    Classification {
        result: categorize(quantity, lod, loq),
        quantity,
        issues,
    }
}

/// Classify a measurement by its stated percentage and limits.
pub fn classify_measurement(measurement: &AnalyteMeasurement) -> Classification {
    classify_quantity(measurement.percent, measurement.lod, measurement.loq)
}

fn categorize(quantity: Decimal, lod: Decimal, loq: Decimal) -> AnalyteResult {
    if quantity < lod {
        AnalyteResult::NotDetected
    } else if quantity < loq {
        AnalyteResult::BelowQuantitation
    } else {
        AnalyteResult::Detected
    }
}

/// Status of a whole test panel.
///
/// A panel the client never ordered is not submitted; an ordered panel is
/// complete once results are recorded, otherwise not tested.
pub fn classify_panel(submitted: bool, results_recorded: bool) -> PanelStatus {
    match (submitted, results_recorded) {
        (false, _) => PanelStatus::NotSubmitted,
        (true, true) => PanelStatus::Complete,
        (true, false) => PanelStatus::NotTested,
    }
}
