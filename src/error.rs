// Typed faults carried inside eyre reports

use thiserror::Error;

/// Hard failures a caller may want to tell apart.
///
/// Store operations return `eyre::Result`; these values travel inside the
/// report and can be recovered with `report.downcast_ref::<LedgerError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Field not found: '{0}'")]
    UnknownField(String),

    #[error("Invalid date '{value}' in booking at position {position} (expected YYYY-MM-DD)")]
    InvalidDate { position: usize, value: String },

    #[error("Invalid cost '{value}' in booking at position {position}")]
    InvalidCost { position: usize, value: String },

    #[error("Malformed ledger row on line {line}: expected {expected} fields, found {found}")]
    MalformedRow { line: u64, expected: usize, found: usize },
}
