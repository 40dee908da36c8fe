//! FFT-based Spectral Estimation
//!
//! The extractors only see [`SpectrumEstimator`]; the FFT magnitude and Welch
//! implementations below are the default primitives behind it.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;
use std::fmt::Debug;

/// One-sided spectrum, bins ascending from 0 Hz
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    /// Bin frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Magnitude or power density per bin, depending on the estimator
    pub values: Vec<f64>,
}

impl Spectrum {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no bin was produced
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Frequency spacing between bins
    pub fn resolution(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Mean value of bins with `low <= f < high`; 0.0 if no bin falls inside
    pub fn mean_in(&self, low: f64, high: f64) -> f64 {
        let (sum, count) = self
            .bins()
            .filter(|(f, _)| *f >= low && *f < high)
            .fold((0.0, 0usize), |(sum, count), (_, v)| (sum + v, count + 1));

        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Simpson integral over bins with `low <= f <= high`
    pub fn integrate(&self, low: f64, high: f64) -> f64 {
        let selected: Vec<f64> = self
            .bins()
            .filter(|(f, _)| *f >= low && *f <= high)
            .map(|(_, v)| v)
            .collect();
        simpson(&selected, self.resolution())
    }

    /// Simpson integral over the whole spectrum
    pub fn total(&self) -> f64 {
        simpson(&self.values, self.resolution())
    }

    /// Frequency of the largest bin with `low <= f <= high`
    pub fn peak_in(&self, low: f64, high: f64) -> Option<f64> {
        self.bins()
            .filter(|(f, v)| *f >= low && *f <= high && v.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(f, _)| f)
    }

    fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies.iter().copied().zip(self.values.iter().copied())
    }
}

/// Narrow interface to a spectral primitive
pub trait SpectrumEstimator: Debug + Send + Sync {
    /// Estimate the one-sided spectrum of `signal` sampled at `sampling_rate` Hz
    fn estimate(&self, signal: &[f64], sampling_rate: f64) -> Spectrum;
}

/// Absolute value of the real FFT (numpy `abs(rfft(x))` equivalent)
#[derive(Debug, Clone, Copy, Default)]
pub struct FftMagnitude;

impl SpectrumEstimator for FftMagnitude {
    fn estimate(&self, signal: &[f64], sampling_rate: f64) -> Spectrum {
        let n = signal.len();
        if n == 0 || sampling_rate <= 0.0 {
            return Spectrum::default();
        }

        let mut planner = FftPlanner::new();
        let buffer = forward_fft(&mut planner, signal.iter().copied());

        let bins = n / 2 + 1;
        Spectrum {
            frequencies: bin_frequencies(bins, n, sampling_rate),
            values: buffer.iter().take(bins).map(|c| c.norm()).collect(),
        }
    }
}

/// Welch's averaged periodogram with a Hann window and density scaling
#[derive(Debug, Clone, Copy)]
pub struct Welch {
    /// Segment length in seconds (clamped to the signal length)
    pub segment_seconds: f64,
    /// Fraction of each segment shared with the next one
    pub overlap_ratio: f64,
}

impl Default for Welch {
    fn default() -> Self {
        Self {
            segment_seconds: 2.0,
            overlap_ratio: 0.5,
        }
    }
}

impl SpectrumEstimator for Welch {
    fn estimate(&self, signal: &[f64], sampling_rate: f64) -> Spectrum {
        let n = signal.len();
        if n == 0 || sampling_rate <= 0.0 {
            return Spectrum::default();
        }

        let nperseg = ((self.segment_seconds * sampling_rate).round() as usize).clamp(1, n);
        let noverlap = (nperseg as f64 * self.overlap_ratio.clamp(0.0, 0.99)).floor() as usize;
        let step = (nperseg - noverlap).max(1);

        let window = hann_window(nperseg);
        let window_energy: f64 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (sampling_rate * window_energy);

        let bins = nperseg / 2 + 1;
        let mut psd = vec![0.0; bins];
        let mut segments = 0usize;
        let mut planner = FftPlanner::new();

        let mut start = 0;
        while start + nperseg <= n {
            let segment = &signal[start..start + nperseg];
            let mean = segment.iter().sum::<f64>() / nperseg as f64;
            let buffer = forward_fft(
                &mut planner,
                segment.iter().zip(&window).map(|(x, w)| (x - mean) * w),
            );

            for (k, acc) in psd.iter_mut().enumerate() {
                let mut power = buffer[k].norm_sqr() * scale;
                // One-sided: fold negative frequencies except DC and Nyquist
                let is_nyquist = nperseg % 2 == 0 && k == bins - 1;
                if k != 0 && !is_nyquist {
                    power *= 2.0;
                }
                *acc += power;
            }

            segments += 1;
            start += step;
        }

        for value in &mut psd {
            *value /= segments as f64;
        }

        Spectrum {
            frequencies: bin_frequencies(bins, nperseg, sampling_rate),
            values: psd,
        }
    }
}

/// Composite Simpson's rule on evenly spaced samples.
///
/// An even sample count integrates the final interval with the trapezoid rule.
pub fn simpson(y: &[f64], dx: f64) -> f64 {
    match y.len() {
        0 | 1 => 0.0,
        2 => 0.5 * dx * (y[0] + y[1]),
        n if n % 2 == 1 => composite_simpson(y, dx),
        n => composite_simpson(&y[..n - 1], dx) + 0.5 * dx * (y[n - 2] + y[n - 1]),
    }
}

fn composite_simpson(y: &[f64], dx: f64) -> f64 {
    let n = y.len();
    let interior: f64 = y[1..n - 1]
        .iter()
        .enumerate()
        .map(|(i, v)| if i % 2 == 0 { 4.0 * v } else { 2.0 * v })
        .sum();
    (y[0] + interior + y[n - 1]) * dx / 3.0
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}

fn forward_fft(
    planner: &mut FftPlanner<f64>,
    samples: impl Iterator<Item = f64>,
) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = samples.map(|v| Complex::new(v, 0.0)).collect();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer
}

fn bin_frequencies(bins: usize, n: usize, sampling_rate: f64) -> Vec<f64> {
    let resolution = sampling_rate / n as f64;
    (0..bins).map(|k| k as f64 * resolution).collect()
}
