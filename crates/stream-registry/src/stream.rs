//! Registered Stream Variants

use feature_engine::BandPowerExtractor;
use ndarray::Array2;
use std::sync::Arc;

/// Stored samples of a precomputed stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamData {
    /// One value per sample
    Samples(Vec<f64>),
    /// Channels x samples, shared with on-demand streams of the same recording
    Channels(Arc<Array2<f64>>),
}

impl StreamData {
    /// Samples along the time axis
    pub fn sample_count(&self) -> usize {
        match self {
            StreamData::Samples(values) => values.len(),
            StreamData::Channels(data) => data.ncols(),
        }
    }
}

/// A named entry of the registry
#[derive(Debug, Clone)]
pub enum Stream {
    /// Stored once at load time and sliced per query
    Precomputed { data: StreamData, sampling_rate: u32 },
    /// Computed per query from the raw recording
    OnDemand {
        raw: Arc<Array2<f64>>,
        sampling_rate: u32,
        extractor: BandPowerExtractor,
    },
}

impl Stream {
    pub fn samples(values: Vec<f64>, sampling_rate: u32) -> Self {
        Stream::Precomputed {
            data: StreamData::Samples(values),
            sampling_rate,
        }
    }

    pub fn channels(data: Arc<Array2<f64>>, sampling_rate: u32) -> Self {
        Stream::Precomputed {
            data: StreamData::Channels(data),
            sampling_rate,
        }
    }

    pub fn on_demand(
        raw: Arc<Array2<f64>>,
        sampling_rate: u32,
        extractor: BandPowerExtractor,
    ) -> Self {
        Stream::OnDemand {
            raw,
            sampling_rate,
            extractor,
        }
    }

    /// Samples per second of the stored data
    pub fn sampling_rate(&self) -> u32 {
        match self {
            Stream::Precomputed { sampling_rate, .. } | Stream::OnDemand { sampling_rate, .. } => {
                *sampling_rate
            }
        }
    }

    pub fn sample_count(&self) -> usize {
        match self {
            Stream::Precomputed { data, .. } => data.sample_count(),
            Stream::OnDemand { raw, .. } => raw.ncols(),
        }
    }

    pub fn is_on_demand(&self) -> bool {
        matches!(self, Stream::OnDemand { .. })
    }
}
