//! Query Validation
//!
//! Checks inbound time-window queries before any computation runs.

mod error;
mod request;

pub use error::ValidationError;
pub use request::WindowRequest;
