//! Time-Window Query Validation

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Validated `(start_time, window_size)` query, both in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRequest {
    start_time: u64,
    #[serde(rename = "window_size")]
    length: u64,
}

impl WindowRequest {
    /// `start_time >= 0`, `length >= 1`
    pub fn new(start_time: i64, length: i64) -> Result<Self, ValidationError> {
        let start_time = u64::try_from(start_time).map_err(|_| ValidationError::OutOfRange {
            field: "start_time",
            value: start_time,
            min: 0,
        })?;
        let length = u64::try_from(length)
            .ok()
            .filter(|&l| l >= 1)
            .ok_or(ValidationError::OutOfRange {
                field: "window_size",
                value: length,
                min: 1,
            })?;
        Ok(Self { start_time, length })
    }

    /// Validate a JSON body `{"start_time": .., "window_size": ..}`
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let Some(fields) = body.as_object() else {
            return Err(ValidationError::InvalidFormat(
                "query body must be a JSON object".to_string(),
            ));
        };

        let integer = |field: &'static str| -> Result<i64, ValidationError> {
            match fields.get(field) {
                None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
                Some(value) => value.as_i64().ok_or(ValidationError::InvalidType {
                    field,
                    expected: "an integer number of seconds",
                }),
            }
        };

        let start_time = integer("start_time")?;
        let length = integer("window_size")?;
        let request = Self::new(start_time, length)?;
        debug!("Validated window request {:?}", request);
        Ok(request)
    }

    /// Parse and validate raw request bytes
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;
        Self::from_json(&value)
    }

    /// First second of the window
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Window length in seconds
    pub fn length(&self) -> u64 {
        self.length
    }

    /// One past the last second of the window
    pub fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.length)
    }
}
