//! EEG Band Power Extraction
//!
//! Two modes share the same band table and channel averaging:
//! - grid mode slides a window over the whole recording and emits one 1 Hz
//!   series per band (mean FFT magnitude per band);
//! - window mode answers a single query window with one value per band
//!   (Welch PSD integrated with Simpson's rule, optionally relative).

use crate::spectral::{FftMagnitude, Spectrum, SpectrumEstimator, Welch};
use crate::windowing::{duration_seconds, sample_range, WindowSpec};
use crate::FeatureError;
use ndarray::{s, ArrayView2};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Frequency band `[low, high)` in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub name: &'static str,
    pub low: f64,
    pub high: f64,
}

/// Canonical EEG bands
pub const EEG_BANDS: [Band; 5] = [
    Band { name: "Delta", low: 0.0, high: 4.0 },
    Band { name: "Theta", low: 4.0, high: 8.0 },
    Band { name: "Alpha", low: 8.0, high: 12.0 },
    Band { name: "Beta", low: 12.0, high: 30.0 },
    Band { name: "Gamma", low: 30.0, high: 45.0 },
];

/// Single-window result: band name -> power
pub type BandPowers = BTreeMap<&'static str, f64>;

/// Whether window-mode power is normalized by total signal power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerMode {
    Absolute,
    #[default]
    Relative,
}

/// Grid-mode result: one 1 Hz series per band
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BandSeries {
    series: BTreeMap<&'static str, Vec<f64>>,
}

impl BandSeries {
    /// Series for a band name
    pub fn get(&self, band: &str) -> Option<&[f64]> {
        self.series.get(band).map(Vec::as_slice)
    }

    /// Take ownership of a band's series
    pub fn take(&mut self, band: &str) -> Option<Vec<f64>> {
        self.series.remove(band)
    }

    /// Band names present
    pub fn bands(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.series.keys().copied()
    }
}

/// Band power extractor over channel-major (channels x samples) data
#[derive(Debug, Clone)]
pub struct BandPowerExtractor {
    bands: Vec<Band>,
    grid_estimator: Arc<dyn SpectrumEstimator>,
    window_estimator: Arc<dyn SpectrumEstimator>,
}

impl Default for BandPowerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl BandPowerExtractor {
    /// Canonical bands, FFT magnitude for the grid and Welch for single windows
    pub fn new() -> Self {
        Self {
            bands: EEG_BANDS.to_vec(),
            grid_estimator: Arc::new(FftMagnitude),
            window_estimator: Arc::new(Welch::default()),
        }
    }

    /// Replace the band table
    pub fn with_bands(mut self, bands: Vec<Band>) -> Self {
        self.bands = bands;
        self
    }

    /// Swap the spectral primitives
    pub fn with_estimators(
        mut self,
        grid: Arc<dyn SpectrumEstimator>,
        window: Arc<dyn SpectrumEstimator>,
    ) -> Self {
        self.grid_estimator = grid;
        self.window_estimator = window;
        self
    }

    /// Configured bands
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Precompute one 1 Hz series per band over the whole recording
    pub fn extract(
        &self,
        data: ArrayView2<'_, f64>,
        sampling_rate: u32,
        spec: WindowSpec,
    ) -> Result<BandSeries, FeatureError> {
        if sampling_rate == 0 {
            return Err(FeatureError::Configuration(
                "EEG sampling rate must be positive".to_string(),
            ));
        }

        let total_seconds = duration_seconds(data.ncols(), sampling_rate);
        let starts = spec.starts(total_seconds)?;
        debug!(
            "Band power grid: {} channels, {:.1}s, {} windows of {}s (step {}s)",
            data.nrows(),
            total_seconds,
            starts.len(),
            spec.window_size(),
            spec.step()
        );

        let mut per_band: Vec<Vec<f64>> = vec![Vec::with_capacity(starts.len()); self.bands.len()];
        for &start in &starts {
            let range = sample_range(
                start,
                u64::from(spec.window_size()),
                sampling_rate,
                data.ncols(),
            );
            let window = data.slice(s![.., range]);
            let powers = self.channel_average(
                window,
                sampling_rate,
                self.grid_estimator.as_ref(),
                |spectrum, band| spectrum.mean_in(band.low, band.high),
            );
            for (series, power) in per_band.iter_mut().zip(powers) {
                series.push(power);
            }
        }

        let series = self
            .bands
            .iter()
            .zip(per_band)
            .map(|(band, values)| (band.name, spec.align(&values, total_seconds)))
            .collect();

        info!(
            "Computed {} band power series over {} windows",
            self.bands.len(),
            starts.len()
        );
        Ok(BandSeries { series })
    }

    /// Band powers for the single window `[start_time, start_time + length)` seconds.
    ///
    /// Windows reaching past the data use whatever falls in range; an empty or
    /// powerless window yields NaN for every band.
    pub fn extract_window(
        &self,
        data: ArrayView2<'_, f64>,
        sampling_rate: u32,
        start_time: u64,
        length: u64,
        mode: PowerMode,
    ) -> BandPowers {
        let range = sample_range(start_time, length, sampling_rate, data.ncols());
        if range.is_empty() || data.nrows() == 0 {
            debug!(
                "Band power window {}s+{}s has no samples in range",
                start_time, length
            );
            return self.bands.iter().map(|band| (band.name, f64::NAN)).collect();
        }

        let window = data.slice(s![.., range]);
        let powers = self.channel_average(
            window,
            sampling_rate,
            self.window_estimator.as_ref(),
            |spectrum, band| {
                let power = spectrum.integrate(band.low, band.high);
                match mode {
                    PowerMode::Absolute => power,
                    PowerMode::Relative => {
                        let total = spectrum.total();
                        if total > 0.0 {
                            power / total
                        } else {
                            f64::NAN
                        }
                    }
                }
            },
        );

        self.bands
            .iter()
            .zip(powers)
            .map(|(band, power)| (band.name, power))
            .collect()
    }

    /// Per-band value averaged across channels
    fn channel_average<F>(
        &self,
        window: ArrayView2<'_, f64>,
        sampling_rate: u32,
        estimator: &dyn SpectrumEstimator,
        band_value: F,
    ) -> Vec<f64>
    where
        F: Fn(&Spectrum, &Band) -> f64,
    {
        let channels = window.nrows();
        if channels == 0 {
            return vec![f64::NAN; self.bands.len()];
        }

        let mut sums = vec![0.0; self.bands.len()];
        for row in window.outer_iter() {
            let signal = row.to_vec();
            let spectrum = estimator.estimate(&signal, f64::from(sampling_rate));
            for (sum, band) in sums.iter_mut().zip(&self.bands) {
                *sum += band_value(&spectrum, band);
            }
        }

        sums.into_iter().map(|sum| sum / channels as f64).collect()
    }
}

/// Precompute the five canonical band series with default primitives
pub fn extract_power_bands(
    data: ArrayView2<'_, f64>,
    sampling_rate: u32,
    window_size: u32,
    overlap: u32,
) -> Result<BandSeries, FeatureError> {
    let spec = WindowSpec::new(window_size, overlap)?;
    BandPowerExtractor::new().extract(data, sampling_rate, spec)
}

/// Relative band powers for one query window with default primitives
pub fn extract_power_bands_window(
    data: ArrayView2<'_, f64>,
    sampling_rate: u32,
    start_time: u64,
    length: u64,
) -> BandPowers {
    BandPowerExtractor::new().extract_window(
        data,
        sampling_rate,
        start_time,
        length,
        PowerMode::Relative,
    )
}
