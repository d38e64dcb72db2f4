pub mod engine;
pub mod outcome;

pub use engine::{classify_measurement, classify_panel, classify_quantity, MAX_PERCENT};
pub use outcome::{Classification, QuantityIssue};
