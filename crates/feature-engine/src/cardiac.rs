//! PPG Cardiac Feature Extraction

use crate::filter::ZeroPhaseFilter;
use crate::peaks::{CardiacEstimator, PeakCardiacEstimator};
use crate::windowing::{duration_seconds, sample_range, WindowSpec};
use crate::FeatureError;
use std::sync::Arc;
use tracing::{debug, info};

/// Default segment length (s)
pub const DEFAULT_PPG_WINDOW: u32 = 20;
/// Default segment overlap (s), one estimate per second
pub const DEFAULT_PPG_OVERLAP: u32 = 19;

/// Three 1 Hz cardiac series of `floor(duration)` entries each
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardiacSeries {
    pub heart_rate: Vec<f64>,
    pub hrv: Vec<f64>,
    pub breathing_rate: Vec<f64>,
}

/// Band-pass filtering plus segment-wise estimation
#[derive(Debug, Clone)]
pub struct CardiacExtractor {
    passband: (f64, f64),
    order: usize,
    estimator: Arc<dyn CardiacEstimator>,
}

impl Default for CardiacExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CardiacExtractor {
    /// Order-3 Butterworth 0.7-2.5 Hz pass band with [`PeakCardiacEstimator`]
    pub fn new() -> Self {
        Self {
            passband: (0.7, 2.5),
            order: 3,
            estimator: Arc::new(PeakCardiacEstimator::default()),
        }
    }

    /// Swap the per-segment estimator
    pub fn with_estimator(mut self, estimator: Arc<dyn CardiacEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Override the pass band (Hz)
    pub fn with_passband(mut self, low_hz: f64, high_hz: f64) -> Self {
        self.passband = (low_hz, high_hz);
        self
    }

    /// Override the Butterworth order of the pass band
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Heart rate, HRV and breathing rate on a 1 Hz grid
    pub fn extract(
        &self,
        signal: &[f64],
        sampling_rate: u32,
        spec: WindowSpec,
    ) -> Result<CardiacSeries, FeatureError> {
        if sampling_rate == 0 {
            return Err(FeatureError::Configuration(
                "PPG sampling rate must be positive".to_string(),
            ));
        }

        let filter = ZeroPhaseFilter::bandpass(
            f64::from(sampling_rate),
            self.passband.0,
            self.passband.1,
            self.order,
        )?;
        let total_seconds = duration_seconds(signal.len(), sampling_rate);
        let starts = spec.starts(total_seconds)?;
        let filtered = filter.apply(signal)?;
        debug!(
            "PPG segmentation: {:.1}s, {} segments of {}s (step {}s)",
            total_seconds,
            starts.len(),
            spec.window_size(),
            spec.step()
        );

        let mut heart_rate = Vec::with_capacity(starts.len());
        let mut hrv = Vec::with_capacity(starts.len());
        let mut breathing_rate = Vec::with_capacity(starts.len());
        for &start in &starts {
            let range = sample_range(
                start,
                u64::from(spec.window_size()),
                sampling_rate,
                filtered.len(),
            );
            let measures = self.estimator.estimate(&filtered[range], sampling_rate);
            heart_rate.push(measures.heart_rate);
            hrv.push(measures.hrv);
            breathing_rate.push(measures.breathing_rate);
        }

        info!(
            "Computed cardiac features over {} PPG segments",
            starts.len()
        );
        Ok(CardiacSeries {
            heart_rate: spec.align(&heart_rate, total_seconds),
            hrv: spec.align(&hrv, total_seconds),
            breathing_rate: spec.align(&breathing_rate, total_seconds),
        })
    }
}

/// Cardiac series with the default filter and estimator
pub fn extract_cardiac_features(
    signal: &[f64],
    sampling_rate: u32,
    window_size: u32,
    overlap: u32,
) -> Result<CardiacSeries, FeatureError> {
    let spec = WindowSpec::new(window_size, overlap)?;
    CardiacExtractor::new().extract(signal, sampling_rate, spec)
}
