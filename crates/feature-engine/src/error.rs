//! Feature Extraction Error Types

use thiserror::Error;

/// Errors raised while planning or running an extraction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Invalid window/overlap relationship, sampling rate or filter design
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Requested window exceeds the signal, or input too short for a routine
    #[error("Data out of range: {0}")]
    DataRange(String),
}
