use crate::model::Report;

/// Read-only access to previously issued reports.
///
/// Implemented for slices and vectors of reports; a storage-backed
/// implementation can stream from a query instead.
pub trait ReportHistory: Sync {
    fn reports(&self) -> Box<dyn Iterator<Item = &Report> + '_>;
}

impl ReportHistory for &[Report] {
    fn reports(&self) -> Box<dyn Iterator<Item = &Report> + '_> {
        Box::new(self.iter())
    }
}

impl ReportHistory for Vec<Report> {
    fn reports(&self) -> Box<dyn Iterator<Item = &Report> + '_> {
        Box::new(self.iter())
    }
}

/// Empty history, for reports validated without prior context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl ReportHistory for NoHistory {
    fn reports(&self) -> Box<dyn Iterator<Item = &Report> + '_> {
        Box::new(std::iter::empty())
    }
}
