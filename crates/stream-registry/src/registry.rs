//! Immutable Stream Registry

use crate::stream::Stream;
use crate::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the raw EEG stream; channel labels are published only while it is active
pub const EEG_STREAM: &str = "eeg";

/// Named streams plus recording-level metadata, fixed after load
#[derive(Debug, Clone, Default)]
pub struct Registry {
    streams: BTreeMap<String, Stream>,
    total_duration: f64,
    eeg_channels: Vec<String>,
}

/// Startup metadata served to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub enabled_graphs: Vec<String>,
    /// Seconds
    pub data_length: f64,
    pub sampling_rates: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eeg_channels: Option<Vec<String>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Stream> {
        self.streams.get(name)
    }

    /// Streams in name order
    pub fn streams(&self) -> impl Iterator<Item = (&str, &Stream)> {
        self.streams.iter().map(|(name, stream)| (name.as_str(), stream))
    }

    pub fn names(&self) -> Vec<String> {
        self.streams.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Duration (s) of the last modality loaded
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn sampling_rates(&self) -> BTreeMap<String, u32> {
        self.streams
            .iter()
            .map(|(name, stream)| (name.clone(), stream.sampling_rate()))
            .collect()
    }

    pub fn eeg_channels(&self) -> Option<&[String]> {
        self.streams
            .contains_key(EEG_STREAM)
            .then_some(self.eeg_channels.as_slice())
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            enabled_graphs: self.names(),
            data_length: self.total_duration,
            sampling_rates: self.sampling_rates(),
            eeg_channels: self.eeg_channels().map(<[String]>::to_vec),
        }
    }
}

/// Mutable staging area used only while loading
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    streams: BTreeMap<String, Stream>,
    total_duration: f64,
    eeg_channels: Vec<String>,
}

impl RegistryBuilder {
    /// Register `stream`; names are unique
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        stream: Stream,
    ) -> Result<&mut Self, RegistryError> {
        let name = name.into();
        if self.streams.contains_key(&name) {
            return Err(RegistryError::Configuration(format!(
                "stream '{name}' registered twice"
            )));
        }
        debug!(
            "Registered stream {} ({} samples at {} Hz)",
            name,
            stream.sample_count(),
            stream.sampling_rate()
        );
        self.streams.insert(name, stream);
        Ok(self)
    }

    /// Later calls overwrite earlier ones
    pub fn set_duration(&mut self, seconds: f64) -> &mut Self {
        self.total_duration = seconds;
        self
    }

    pub fn set_eeg_channels(&mut self, channels: Vec<String>) -> &mut Self {
        self.eeg_channels = channels;
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            streams: self.streams,
            total_duration: self.total_duration,
            eeg_channels: self.eeg_channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::sync::Arc;

    fn channels() -> Vec<String> {
        vec!["Fp1".to_string(), "Fp2".to_string()]
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut builder = Registry::builder();
        builder.insert("gsr", Stream::samples(vec![1.0], 50)).unwrap();
        assert!(matches!(
            builder.insert("gsr", Stream::samples(vec![2.0], 50)),
            Err(RegistryError::Configuration(_))
        ));
    }

    #[test]
    fn test_metadata_with_eeg() {
        let mut builder = Registry::builder();
        builder
            .insert("eeg", Stream::channels(Arc::new(Array2::zeros((2, 256))), 128))
            .unwrap()
            .insert("alpha_band", Stream::samples(vec![0.0; 2], 1))
            .unwrap();
        builder.set_duration(2.0).set_eeg_channels(channels());
        let registry = builder.build();

        let metadata = registry.metadata();
        assert_eq!(metadata.enabled_graphs, vec!["alpha_band", "eeg"]);
        assert_eq!(metadata.data_length, 2.0);
        assert_eq!(metadata.sampling_rates["eeg"], 128);
        assert_eq!(metadata.sampling_rates["alpha_band"], 1);
        assert_eq!(metadata.eeg_channels, Some(channels()));
    }

    #[test]
    fn test_channels_hidden_without_raw_eeg() {
        let mut builder = Registry::builder();
        builder
            .insert("delta_band", Stream::samples(vec![0.0; 10], 1))
            .unwrap();
        builder.set_duration(10.0).set_eeg_channels(channels());
        let registry = builder.build();

        assert!(registry.eeg_channels().is_none());
        let json = serde_json::to_value(registry.metadata()).unwrap();
        assert!(json.get("eeg_channels").is_none());
        assert_eq!(json["data_length"], 10.0);
    }

    #[test]
    fn test_last_duration_wins() {
        let mut builder = Registry::builder();
        builder.set_duration(10.0).set_duration(8.5);
        assert_eq!(builder.build().total_duration(), 8.5);
    }
}
