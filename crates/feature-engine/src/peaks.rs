//! Peak-Based Cardiac Estimation
//!
//! Systolic peaks are local maxima above an adaptive threshold with a
//! refractory distance. Beat-to-beat (RR) intervals give heart rate, SDSD and,
//! through the resampled RR tachogram, the dominant breathing frequency.

use crate::spectral::{FftMagnitude, SpectrumEstimator};
use crate::statistics::{mean, std_dev, successive_differences};
use std::fmt::Debug;

/// Heart rate (bpm), HRV as SDSD (ms) and breathing rate (Hz); NaN when not estimable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardiacMeasures {
    pub heart_rate: f64,
    pub hrv: f64,
    pub breathing_rate: f64,
}

impl CardiacMeasures {
    /// All metrics undefined
    pub fn undefined() -> Self {
        Self {
            heart_rate: f64::NAN,
            hrv: f64::NAN,
            breathing_rate: f64::NAN,
        }
    }
}

/// Narrow interface to a per-segment PPG estimator
pub trait CardiacEstimator: Debug + Send + Sync {
    /// Estimate measures for one band-passed segment
    fn estimate(&self, segment: &[f64], sampling_rate: u32) -> CardiacMeasures;
}

/// Peak detection with RR-interval statistics
#[derive(Debug, Clone, Copy)]
pub struct PeakCardiacEstimator {
    /// Shortest accepted RR interval (s)
    pub min_interval: f64,
    /// Longest accepted RR interval (s)
    pub max_interval: f64,
    /// Peak threshold as a fraction of (max - mean) above the mean
    pub threshold_ratio: f64,
    /// Search band for the breathing frequency (Hz)
    pub breathing_band: (f64, f64),
    /// Resampling rate of the RR tachogram (Hz)
    pub tachogram_rate: f64,
}

impl Default for PeakCardiacEstimator {
    fn default() -> Self {
        Self {
            min_interval: 0.3,
            max_interval: 2.0,
            threshold_ratio: 0.3,
            breathing_band: (0.1, 0.4),
            tachogram_rate: 4.0,
        }
    }
}

impl CardiacEstimator for PeakCardiacEstimator {
    fn estimate(&self, segment: &[f64], sampling_rate: u32) -> CardiacMeasures {
        if sampling_rate == 0 {
            return CardiacMeasures::undefined();
        }
        let rate = f64::from(sampling_rate);

        let peaks = detect_peaks(segment, rate, self.min_interval, self.threshold_ratio);
        let beats = self.beat_intervals(&peaks, rate);
        let intervals: Vec<f64> = beats.iter().map(|(_, rr)| *rr).collect();

        let heart_rate = match mean(&intervals) {
            Some(mean_rr) if intervals.len() >= 2 && mean_rr > 0.0 => 60_000.0 / mean_rr,
            _ => f64::NAN,
        };

        let differences = successive_differences(&intervals);
        let hrv = if differences.len() >= 2 {
            std_dev(&differences).unwrap_or(f64::NAN)
        } else {
            f64::NAN
        };

        CardiacMeasures {
            heart_rate,
            hrv,
            breathing_rate: self.breathing_rate(&beats),
        }
    }
}

impl PeakCardiacEstimator {
    /// `(time of closing beat in s, RR in ms)` for every plausible interval
    fn beat_intervals(&self, peaks: &[usize], rate: f64) -> Vec<(f64, f64)> {
        peaks
            .windows(2)
            .filter_map(|pair| {
                let seconds = (pair[1] - pair[0]) as f64 / rate;
                (seconds >= self.min_interval && seconds <= self.max_interval)
                    .then(|| (pair[1] as f64 / rate, seconds * 1000.0))
            })
            .collect()
    }

    /// Dominant frequency of the evenly resampled RR tachogram
    fn breathing_rate(&self, beats: &[(f64, f64)]) -> f64 {
        if beats.len() < 4 {
            return f64::NAN;
        }

        let first = beats[0].0;
        let last = beats[beats.len() - 1].0;
        let samples = ((last - first) * self.tachogram_rate).floor() as usize + 1;
        if samples < 8 {
            return f64::NAN;
        }

        let mut resampled = Vec::with_capacity(samples);
        let mut cursor = 0;
        for i in 0..samples {
            let t = first + i as f64 / self.tachogram_rate;
            while cursor + 2 < beats.len() && beats[cursor + 1].0 < t {
                cursor += 1;
            }
            let (t0, v0) = beats[cursor];
            let (t1, v1) = beats[cursor + 1];
            let fraction = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 0.0 };
            resampled.push(v0 + fraction * (v1 - v0));
        }

        let Some(level) = mean(&resampled) else {
            return f64::NAN;
        };
        let centered: Vec<f64> = resampled.iter().map(|v| v - level).collect();
        FftMagnitude
            .estimate(&centered, self.tachogram_rate)
            .peak_in(self.breathing_band.0, self.breathing_band.1)
            .unwrap_or(f64::NAN)
    }
}

/// Local maxima above `mean + threshold_ratio * (max - mean)`, at least
/// `min_interval` seconds apart (the taller peak wins within that distance)
pub fn detect_peaks(signal: &[f64], rate: f64, min_interval: f64, threshold_ratio: f64) -> Vec<usize> {
    if signal.len() < 3 {
        return Vec::new();
    }

    let Some(level) = mean(signal) else {
        return Vec::new();
    };
    let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = level + threshold_ratio * (max - level);
    let min_distance = (min_interval * rate).max(1.0) as usize;

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..signal.len() - 1 {
        let value = signal[i];
        if value <= threshold || value <= signal[i - 1] || value < signal[i + 1] {
            continue;
        }
        match peaks.last_mut() {
            Some(last) if i - *last < min_distance => {
                if value > signal[*last] {
                    *last = i;
                }
            }
            _ => peaks.push(i),
        }
    }
    peaks
}
