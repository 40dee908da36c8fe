//! Zero-Phase Butterworth Filtering
//!
//! Butterworth designs as second-order sections, run forward then backward
//! through `sosfiltfilt` so the output stays sample-aligned with the input.

use crate::FeatureError;
use sci_rs::signal::filter::design::{
    butter_dyn, DigitalFilter, FilterBandType, FilterOutputType, Sos, SosFormatFilter,
};
use sci_rs::signal::filter::sosfiltfilt_dyn;

/// Cascade of second-order sections applied forward and backward
#[derive(Debug, Clone)]
pub struct ZeroPhaseFilter {
    sections: Vec<Sos<f64>>,
}

impl ZeroPhaseFilter {
    /// Order-`order` Butterworth low-pass below `cutoff_hz`
    pub fn lowpass(sampling_rate: f64, cutoff_hz: f64, order: usize) -> Result<Self, FeatureError> {
        Self::check_edge(sampling_rate, cutoff_hz)?;
        Self::design(order, vec![cutoff_hz], FilterBandType::Lowpass, sampling_rate)
    }

    /// Order-`order` Butterworth band-pass between `low_hz` and `high_hz`
    pub fn bandpass(
        sampling_rate: f64,
        low_hz: f64,
        high_hz: f64,
        order: usize,
    ) -> Result<Self, FeatureError> {
        if low_hz >= high_hz {
            return Err(FeatureError::Configuration(format!(
                "band-pass edges must be ascending, got {low_hz}..{high_hz} Hz"
            )));
        }
        Self::check_edge(sampling_rate, low_hz)?;
        Self::check_edge(sampling_rate, high_hz)?;
        Self::design(
            order,
            vec![low_hz, high_hz],
            FilterBandType::Bandpass,
            sampling_rate,
        )
    }

    fn check_edge(sampling_rate: f64, edge_hz: f64) -> Result<(), FeatureError> {
        let nyquist = sampling_rate / 2.0;
        if !(edge_hz > 0.0 && edge_hz < nyquist) {
            return Err(FeatureError::Configuration(format!(
                "cutoff {edge_hz} Hz must lie in (0, {nyquist}) for sampling rate {sampling_rate} Hz"
            )));
        }
        Ok(())
    }

    fn design(
        order: usize,
        edges: Vec<f64>,
        band: FilterBandType,
        sampling_rate: f64,
    ) -> Result<Self, FeatureError> {
        if order == 0 {
            return Err(FeatureError::Configuration(
                "filter order must be at least 1".to_string(),
            ));
        }
        match butter_dyn(
            order,
            edges,
            Some(band),
            Some(false),
            Some(FilterOutputType::Sos),
            Some(sampling_rate),
        ) {
            DigitalFilter::Sos(SosFormatFilter { sos }) => Ok(Self { sections: sos }),
            _ => Err(FeatureError::Configuration(
                "Butterworth design did not yield second-order sections".to_string(),
            )),
        }
    }

    /// Number of second-order sections
    pub fn sections(&self) -> usize {
        self.sections.len()
    }

    /// Shortest input the odd-extension padding accepts
    pub fn min_len(&self) -> usize {
        3 * (2 * self.sections.len() + 1) + 1
    }

    /// Filter `signal`; output has the same length and no phase shift
    pub fn apply(&self, signal: &[f64]) -> Result<Vec<f64>, FeatureError> {
        if signal.len() < self.min_len() {
            return Err(FeatureError::DataRange(format!(
                "{} samples are too few to filter, need at least {}",
                signal.len(),
                self.min_len()
            )));
        }
        Ok(sosfiltfilt_dyn(signal.iter(), &self.sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, rate: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| (2.0 * PI * freq * i as f64 / rate).sin())
            .collect()
    }

    fn rms(values: &[f64]) -> f64 {
        (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
    }

    #[test]
    fn test_lowpass_dc_passthrough() {
        let filter = ZeroPhaseFilter::lowpass(128.0, 2.0, 2).unwrap();
        let output = filter.apply(&[5.0; 300]).unwrap();
        assert_eq!(output.len(), 300);
        assert!(output.iter().all(|v| (v - 5.0).abs() < 1e-6));
    }

    #[test]
    fn test_lowpass_attenuates_high_frequency() {
        let filter = ZeroPhaseFilter::lowpass(128.0, 2.0, 2).unwrap();
        let output = filter.apply(&sine(20.0, 128.0, 1024)).unwrap();
        assert!(rms(&output[128..896]) < 0.05);
    }

    #[test]
    fn test_bandpass_blocks_dc_keeps_passband() {
        let filter = ZeroPhaseFilter::bandpass(64.0, 0.7, 2.5, 3).unwrap();
        assert_eq!(filter.sections(), 3);

        let offset: Vec<f64> = sine(1.2, 64.0, 64 * 30).iter().map(|v| v + 10.0).collect();
        let output = filter.apply(&offset).unwrap();

        let steady = &output[64 * 5..64 * 25];
        let mean = steady.iter().sum::<f64>() / steady.len() as f64;
        assert!(mean.abs() < 0.1);
        assert!(rms(steady) > 0.4);
    }

    #[test]
    fn test_bandpass_rejects_out_of_band_tone() {
        let filter = ZeroPhaseFilter::bandpass(64.0, 0.7, 2.5, 3).unwrap();
        let output = filter.apply(&sine(12.0, 64.0, 64 * 30)).unwrap();
        assert!(rms(&output[64 * 5..64 * 25]) < 0.01);
    }

    #[test]
    fn test_zero_phase_keeps_peak_position() {
        let signal = sine(1.0, 100.0, 1000);
        let output = ZeroPhaseFilter::lowpass(100.0, 5.0, 2)
            .unwrap()
            .apply(&signal)
            .unwrap();
        // Peak of the fourth cycle sits at sample 325
        let window = &output[300..350];
        let argmax = window
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i + 300)
            .unwrap();
        assert!((argmax as i64 - 325).abs() <= 1);
    }

    #[test]
    fn test_invalid_design_rejected() {
        assert!(matches!(
            ZeroPhaseFilter::lowpass(4.0, 2.5, 2),
            Err(FeatureError::Configuration(_))
        ));
        assert!(ZeroPhaseFilter::bandpass(64.0, 2.5, 0.7, 3).is_err());
        assert!(ZeroPhaseFilter::lowpass(64.0, 2.0, 0).is_err());
    }

    #[test]
    fn test_short_input_rejected() {
        let filter = ZeroPhaseFilter::lowpass(10.0, 1.0, 2).unwrap();
        assert_eq!(filter.min_len(), 10);
        assert!(matches!(
            filter.apply(&[3.0; 9]),
            Err(FeatureError::DataRange(_))
        ));
        assert_eq!(filter.apply(&[3.0; 10]).unwrap().len(), 10);
    }
}
