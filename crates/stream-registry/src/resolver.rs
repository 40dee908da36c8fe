//! Windowed Query Resolution
//!
//! Slices every precomputed stream to the requested seconds and runs the
//! on-demand band power extractor over the same window. Non-finite values
//! serialize as JSON `null`.

use crate::registry::Registry;
use crate::stream::{Stream, StreamData};
use data_validator::WindowRequest;
use feature_engine::{sample_range, PowerMode};
use ndarray::s;
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Resolved contents of one stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSlice {
    Samples(Vec<f64>),
    /// Channel-major
    Channels(Vec<Vec<f64>>),
    /// Band name to power
    Bands(BTreeMap<String, f64>),
}

impl StreamSlice {
    /// Samples along the time axis, or the number of bands
    pub fn len(&self) -> usize {
        match self {
            StreamSlice::Samples(values) => values.len(),
            StreamSlice::Channels(channels) => channels.first().map_or(0, Vec::len),
            StreamSlice::Bands(bands) => bands.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Nullable(f64);

impl Serialize for Nullable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_none()
        }
    }
}

struct NullableSeq<'a>(&'a [f64]);

impl Serialize for NullableSeq<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|&v| Nullable(v)))
    }
}

impl Serialize for StreamSlice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StreamSlice::Samples(values) => NullableSeq(values).serialize(serializer),
            StreamSlice::Channels(channels) => {
                serializer.collect_seq(channels.iter().map(|c| NullableSeq(c)))
            }
            StreamSlice::Bands(bands) => {
                serializer.collect_map(bands.iter().map(|(band, &v)| (band, Nullable(v))))
            }
        }
    }
}

/// Stream name to resolved slice, one entry per registered stream
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct WindowResponse {
    streams: BTreeMap<String, StreamSlice>,
}

impl WindowResponse {
    pub fn get(&self, name: &str) -> Option<&StreamSlice> {
        self.streams.get(name)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StreamSlice)> {
        self.streams.iter().map(|(name, slice)| (name.as_str(), slice))
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Answers window requests against a borrowed registry
#[derive(Debug, Clone, Copy)]
pub struct WindowResolver<'a> {
    registry: &'a Registry,
}

impl<'a> WindowResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolve every stream; out-of-range windows give short or empty slices
    pub fn resolve(&self, request: &WindowRequest) -> WindowResponse {
        let streams = self
            .registry
            .streams()
            .map(|(name, stream)| (name.to_string(), Self::resolve_stream(name, stream, request)))
            .collect();
        debug!(
            "Resolved window {}s+{}s over {} streams",
            request.start_time(),
            request.length(),
            self.registry.len()
        );
        WindowResponse { streams }
    }

    fn resolve_stream(name: &str, stream: &Stream, request: &WindowRequest) -> StreamSlice {
        let (start, length) = (request.start_time(), request.length());
        match stream {
            Stream::Precomputed {
                data: StreamData::Samples(values),
                sampling_rate,
            } => {
                let range = sample_range(start, length, *sampling_rate, values.len());
                StreamSlice::Samples(values[range].to_vec())
            }
            Stream::Precomputed {
                data: StreamData::Channels(data),
                sampling_rate,
            } => {
                let range = sample_range(start, length, *sampling_rate, data.ncols());
                StreamSlice::Channels(
                    data.slice(s![.., range])
                        .outer_iter()
                        .map(|channel| channel.to_vec())
                        .collect(),
                )
            }
            Stream::OnDemand {
                raw,
                sampling_rate,
                extractor,
            } => {
                let powers = extractor.extract_window(
                    raw.view(),
                    *sampling_rate,
                    start,
                    length,
                    PowerMode::Relative,
                );
                if powers.values().all(|p| p.is_nan()) {
                    warn!(
                        "No band power for {} in window {}s+{}s",
                        name, start, length
                    );
                }
                StreamSlice::Bands(
                    powers
                        .into_iter()
                        .map(|(band, power)| (band.to_string(), power))
                        .collect(),
                )
            }
        }
    }
}

/// Resolve `request` against `registry`
pub fn resolve_window(registry: &Registry, request: &WindowRequest) -> WindowResponse {
    WindowResolver::new(registry).resolve(request)
}
