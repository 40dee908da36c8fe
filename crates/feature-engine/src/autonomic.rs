//! GSR Phasic/Tonic Decomposition

use crate::filter::ZeroPhaseFilter;
use crate::FeatureError;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

/// Phasic and tonic components, sample-aligned with the input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhasicTonic {
    pub phasic: Vec<f64>,
    pub tonic: Vec<f64>,
}

/// Narrow interface to an electrodermal decomposition routine
pub trait EdaDecomposer: Debug + Send + Sync {
    /// Fewest samples the routine accepts at `sampling_rate`
    fn min_samples(&self, sampling_rate: u32) -> usize;

    /// Split `signal` into phasic and tonic components
    fn decompose(&self, signal: &[f64], sampling_rate: u32) -> Result<PhasicTonic, FeatureError>;
}

/// Butterworth order of the tonic low-pass
const TONIC_FILTER_ORDER: usize = 2;

/// Tonic level as a very slow zero-phase low-pass; phasic is the remainder
#[derive(Debug, Clone, Copy)]
pub struct LowPassDecomposer {
    /// Tonic cutoff (Hz)
    pub tonic_cutoff_hz: f64,
}

impl Default for LowPassDecomposer {
    fn default() -> Self {
        Self {
            tonic_cutoff_hz: 0.05,
        }
    }
}

impl EdaDecomposer for LowPassDecomposer {
    fn min_samples(&self, sampling_rate: u32) -> usize {
        (sampling_rate as usize).max(12)
    }

    fn decompose(&self, signal: &[f64], sampling_rate: u32) -> Result<PhasicTonic, FeatureError> {
        let filter = ZeroPhaseFilter::lowpass(
            f64::from(sampling_rate),
            self.tonic_cutoff_hz,
            TONIC_FILTER_ORDER,
        )?;
        let tonic = filter.apply(signal)?;
        let phasic = signal.iter().zip(&tonic).map(|(s, t)| s - t).collect();
        Ok(PhasicTonic { phasic, tonic })
    }
}

/// Owns the input contract and alignment around an [`EdaDecomposer`]
#[derive(Debug, Clone)]
pub struct AutonomicDecomposer {
    routine: Arc<dyn EdaDecomposer>,
}

impl Default for AutonomicDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl AutonomicDecomposer {
    /// Decomposer backed by [`LowPassDecomposer`]
    pub fn new() -> Self {
        Self::with_routine(Arc::new(LowPassDecomposer::default()))
    }

    /// Decomposer backed by a custom routine
    pub fn with_routine(routine: Arc<dyn EdaDecomposer>) -> Self {
        Self { routine }
    }

    /// Phasic and tonic series at the input's sampling rate
    pub fn decompose(&self, signal: &[f64], sampling_rate: u32) -> Result<PhasicTonic, FeatureError> {
        if sampling_rate == 0 {
            return Err(FeatureError::Configuration(
                "GSR sampling rate must be positive".to_string(),
            ));
        }

        let required = self.routine.min_samples(sampling_rate).max(1);
        if signal.len() < required {
            return Err(FeatureError::DataRange(format!(
                "GSR signal has {} samples, decomposition needs at least {required}",
                signal.len()
            )));
        }

        let components = self.routine.decompose(signal, sampling_rate)?;
        if components.phasic.len() != signal.len() || components.tonic.len() != signal.len() {
            return Err(FeatureError::DataRange(format!(
                "decomposition returned {}/{} samples for a {}-sample input",
                components.phasic.len(),
                components.tonic.len(),
                signal.len()
            )));
        }

        info!(
            "Decomposed {} GSR samples at {} Hz into phasic/tonic",
            signal.len(),
            sampling_rate
        );
        Ok(components)
    }
}

/// Phasic/tonic decomposition with the default routine
pub fn decompose_gsr(signal: &[f64], sampling_rate: u32) -> Result<PhasicTonic, FeatureError> {
    AutonomicDecomposer::new().decompose(signal, sampling_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[derive(Debug)]
    struct Truncating;

    impl EdaDecomposer for Truncating {
        fn min_samples(&self, _sampling_rate: u32) -> usize {
            1
        }

        fn decompose(&self, signal: &[f64], _sampling_rate: u32) -> Result<PhasicTonic, FeatureError> {
            Ok(PhasicTonic {
                phasic: signal[1..].to_vec(),
                tonic: signal[1..].to_vec(),
            })
        }
    }

    /// Slow drift plus skin-conductance responses every 10 s
    fn gsr(rate: f64, seconds: usize) -> Vec<f64> {
        (0..(rate as usize * seconds))
            .map(|i| {
                let t = i as f64 / rate;
                let drift = 2.0 + 0.002 * t;
                let response = 0.5 * (2.0 * PI * t / 10.0).sin().max(0.0).powi(8);
                drift + response
            })
            .collect()
    }

    #[test]
    fn test_components_aligned_with_input() {
        let signal = gsr(50.0, 60);
        let components = decompose_gsr(&signal, 50).unwrap();

        assert_eq!(components.phasic.len(), signal.len());
        assert_eq!(components.tonic.len(), signal.len());
        for ((s, p), t) in signal.iter().zip(&components.phasic).zip(&components.tonic) {
            assert!((p + t - s).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tonic_tracks_baseline() {
        let signal = gsr(50.0, 120);
        let components = decompose_gsr(&signal, 50).unwrap();

        let tonic_spread = components.tonic[50 * 30..50 * 90]
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let phasic_spread = components.phasic[50 * 30..50 * 90]
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        assert!(phasic_spread.1 - phasic_spread.0 > tonic_spread.1 - tonic_spread.0);
    }

    #[test]
    fn test_degenerate_input_rejected() {
        assert!(matches!(
            decompose_gsr(&[], 50),
            Err(FeatureError::DataRange(_))
        ));
        assert!(matches!(
            decompose_gsr(&[1.0; 20], 50),
            Err(FeatureError::DataRange(_))
        ));
        assert!(matches!(
            decompose_gsr(&[1.0; 100], 0),
            Err(FeatureError::Configuration(_))
        ));
    }

    #[test]
    fn test_misaligned_routine_output_rejected() {
        let decomposer = AutonomicDecomposer::with_routine(Arc::new(Truncating));
        assert!(matches!(
            decomposer.decompose(&[1.0, 2.0, 3.0], 10),
            Err(FeatureError::DataRange(_))
        ));
    }
}
