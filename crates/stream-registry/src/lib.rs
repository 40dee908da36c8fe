//! Stream Registry
//!
//! Loads configured recordings, runs the extractors once, and publishes an
//! immutable registry that answers windowed queries.

mod loader;
mod registry;
mod resolver;
mod settings;
mod stream;

pub use loader::{read_channels_csv, read_signal_csv, RegistryLoader};
pub use registry::{Metadata, Registry, RegistryBuilder};
pub use resolver::{resolve_window, StreamSlice, WindowResolver, WindowResponse};
pub use settings::{EegSection, GsrSection, PpgSection, ServerConfig, VisualizerConfig};
pub use stream::{Stream, StreamData};

use feature_engine::FeatureError;
use std::path::PathBuf;
use thiserror::Error;

/// Load-time errors; any of them aborts startup
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error(transparent)]
    Feature(#[from] FeatureError),
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        RegistryError::Configuration(err.to_string())
    }
}
