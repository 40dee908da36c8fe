//! Sliding Window Planning and 1 Hz Output Alignment
//!
//! A window is admitted while `start + window_size <= total_seconds`, so the
//! final window that exactly fits the signal is kept.
//!
//! Window `k` covers `[k * step, k * step + window_size)` seconds and its
//! value lands on second `k * step + window_size - 1`, the last second it
//! covers. The value is held until the next window lands; the last one is held
//! to the end of the output. Every second before `window_size - 1` is NaN.

use crate::FeatureError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Validated window/overlap pair in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindowSpec")]
pub struct WindowSpec {
    window_size: u32,
    overlap: u32,
}

/// Unchecked wire form; deserialization goes through [`WindowSpec::new`]
#[derive(Deserialize)]
struct RawWindowSpec {
    window_size: u32,
    overlap: u32,
}

impl TryFrom<RawWindowSpec> for WindowSpec {
    type Error = FeatureError;

    fn try_from(raw: RawWindowSpec) -> Result<Self, Self::Error> {
        Self::new(raw.window_size, raw.overlap)
    }
}

impl WindowSpec {
    /// `window_size >= 1` and `overlap < window_size`
    pub fn new(window_size: u32, overlap: u32) -> Result<Self, FeatureError> {
        if window_size < 1 {
            return Err(FeatureError::Configuration(
                "window size should be equal or bigger than 1 second".to_string(),
            ));
        }
        if overlap >= window_size {
            return Err(FeatureError::Configuration(format!(
                "overlap ({overlap} s) should be smaller than window size ({window_size} s)"
            )));
        }
        Ok(Self {
            window_size,
            overlap,
        })
    }

    /// Window length (seconds)
    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Seconds shared by consecutive windows
    pub fn overlap(&self) -> u32 {
        self.overlap
    }

    /// Seconds between consecutive window starts
    pub fn step(&self) -> u32 {
        self.window_size - self.overlap
    }

    /// Start second of every admitted window
    pub fn starts(&self, total_seconds: f64) -> Result<Vec<u64>, FeatureError> {
        let window = u64::from(self.window_size);
        if window as f64 > total_seconds {
            return Err(FeatureError::DataRange(format!(
                "window of {window} s exceeds signal duration of {total_seconds} s"
            )));
        }

        let mut starts = Vec::new();
        let mut start = 0u64;
        while (start + window) as f64 <= total_seconds {
            starts.push(start);
            start += u64::from(self.step());
        }
        Ok(starts)
    }

    /// Spread one value per window onto a 1 Hz grid of `floor(total_seconds)` entries
    pub fn align(&self, values: &[f64], total_seconds: f64) -> Vec<f64> {
        let len = total_seconds.max(0.0).floor() as usize;
        let mut aligned = vec![f64::NAN; len];

        let step = self.step() as usize;
        let lead = self.window_size as usize - 1;
        for (k, &value) in values.iter().enumerate() {
            let from = (k * step + lead).min(len);
            let to = if k + 1 < values.len() {
                ((k + 1) * step + lead).min(len)
            } else {
                len
            };
            aligned[from..to].fill(value);
        }
        aligned
    }
}

/// Signal duration in seconds
pub fn duration_seconds(samples: usize, sampling_rate: u32) -> f64 {
    if sampling_rate == 0 {
        return 0.0;
    }
    samples as f64 / f64::from(sampling_rate)
}

/// Sample indices for `[start_second, start_second + length_seconds)`, clamped to `available`
pub fn sample_range(
    start_second: u64,
    length_seconds: u64,
    sampling_rate: u32,
    available: usize,
) -> Range<usize> {
    let rate = u64::from(sampling_rate);
    let to_index = |seconds: u64| {
        usize::try_from(seconds.saturating_mul(rate))
            .unwrap_or(usize::MAX)
            .min(available)
    };

    let start = to_index(start_second);
    let end = to_index(start_second.saturating_add(length_seconds));
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_invalid_window() {
        assert!(matches!(
            WindowSpec::new(0, 0),
            Err(FeatureError::Configuration(_))
        ));
        assert!(matches!(
            WindowSpec::new(4, 4),
            Err(FeatureError::Configuration(_))
        ));
        assert!(WindowSpec::new(4, 3).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<WindowSpec>(r#"{"window_size":2,"overlap":5}"#).is_err());
        assert!(serde_json::from_str::<WindowSpec>(r#"{"window_size":0,"overlap":0}"#).is_err());

        let spec: WindowSpec = serde_json::from_str(r#"{"window_size":4,"overlap":1}"#).unwrap();
        assert_eq!(spec.step(), 3);
        assert_eq!(serde_json::to_string(&spec).unwrap(), r#"{"window_size":4,"overlap":1}"#);
    }

    #[test]
    fn test_window_longer_than_signal() {
        let spec = WindowSpec::new(20, 19).unwrap();
        assert!(matches!(
            spec.starts(19.5),
            Err(FeatureError::DataRange(_))
        ));
    }

    #[test]
    fn test_final_exact_window_is_included() {
        let spec = WindowSpec::new(4, 2).unwrap();
        assert_eq!(spec.starts(10.0).unwrap(), vec![0, 2, 4, 6]);

        // Window equal to the whole signal still yields one window
        let whole = WindowSpec::new(10, 0).unwrap();
        assert_eq!(whole.starts(10.0).unwrap(), vec![0]);
    }

    #[test]
    fn test_align_holds_values_between_steps() {
        let spec = WindowSpec::new(4, 0).unwrap();
        let starts = spec.starts(10.0).unwrap();
        assert_eq!(starts, vec![0, 4]);

        let aligned = spec.align(&[1.0, 2.0], 10.0);
        assert_eq!(aligned.len(), 10);
        assert!(aligned[..3].iter().all(|v| v.is_nan()));
        assert_eq!(&aligned[3..7], &[1.0; 4]);
        assert_eq!(&aligned[7..], &[2.0; 3]);
    }

    #[test]
    fn test_align_unit_step_fills_exactly() {
        let spec = WindowSpec::new(3, 2).unwrap();
        let starts = spec.starts(6.0).unwrap();
        let values: Vec<f64> = starts.iter().map(|&s| s as f64).collect();
        let aligned = spec.align(&values, 6.0);
        assert!(aligned[0].is_nan() && aligned[1].is_nan());
        assert_eq!(&aligned[2..], &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sample_range_clamps() {
        assert_eq!(sample_range(2, 3, 50, 500), 100..250);
        assert_eq!(sample_range(8, 5, 50, 500), 400..500);
        assert_eq!(sample_range(20, 5, 50, 500), 500..500);
        assert_eq!(sample_range(u64::MAX, 1, 50, 500), 500..500);
    }

    proptest! {
        #[test]
        fn prop_aligned_length_and_undefined_prefix(
            window_size in 1u32..12,
            overlap_seed in 0u32..12,
            extra in 0u32..50,
            fraction in 0.0f64..0.999,
        ) {
            let spec = WindowSpec::new(window_size, overlap_seed % window_size).unwrap();
            let total = f64::from(window_size + extra) + fraction;
            let starts = spec.starts(total).unwrap();
            let values: Vec<f64> = (0..starts.len()).map(|k| k as f64).collect();
            let aligned = spec.align(&values, total);

            let lead = window_size as usize - 1;
            prop_assert_eq!(aligned.len(), total.floor() as usize);
            prop_assert!(aligned[..lead].iter().all(|v| v.is_nan()));
            prop_assert!(aligned[lead..].iter().all(|v| v.is_finite()));
        }

        #[test]
        fn prop_in_bounds_range_has_exact_length(
            start in 0u64..20,
            length in 1u64..20,
            rate in 1u32..256,
        ) {
            let available = ((start + length) * u64::from(rate)) as usize + 7;
            let range = sample_range(start, length, rate, available);
            prop_assert_eq!(range.len(), (length * u64::from(rate)) as usize);
        }
    }
}
