//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The requested key does not exist in a record.
    #[error("Record key not found: {0}")]
    RecordKeyNotFound(String),

    /// A record value has a type other than the requested one.
    #[error("Unexpected record value type for key {0}")]
    RecordValueType(String),
}
