//! Feature Extraction Engine
//!
//! Turns raw physiological recordings into time-aligned derived series:
//! EEG band powers, GSR phasic/tonic components and PPG cardiac metrics.
//! Numeric primitives sit behind narrow traits so they can be swapped without
//! touching windowing or alignment.

mod autonomic;
mod band_power;
mod cardiac;
mod error;
mod filter;
mod peaks;
mod spectral;
mod statistics;
mod windowing;

pub use autonomic::{decompose_gsr, AutonomicDecomposer, EdaDecomposer, LowPassDecomposer, PhasicTonic};
pub use band_power::{
    extract_power_bands, extract_power_bands_window, Band, BandPowerExtractor, BandPowers,
    BandSeries, PowerMode, EEG_BANDS,
};
pub use cardiac::{
    extract_cardiac_features, CardiacExtractor, CardiacSeries, DEFAULT_PPG_OVERLAP,
    DEFAULT_PPG_WINDOW,
};
pub use error::FeatureError;
pub use filter::ZeroPhaseFilter;
pub use peaks::{detect_peaks, CardiacEstimator, CardiacMeasures, PeakCardiacEstimator};
pub use spectral::{simpson, FftMagnitude, Spectrum, SpectrumEstimator, Welch};
pub use windowing::{duration_seconds, sample_range, WindowSpec};
