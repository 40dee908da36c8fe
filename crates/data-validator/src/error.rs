//! Validation Error Types

use thiserror::Error;

/// Errors raised for a rejected query body
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but not of the expected type
    #[error("{field} must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    /// Value below the allowed minimum
    #[error("{field} value {value} is out of range (minimum {min})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
    },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}
