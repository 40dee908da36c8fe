//! CSV Ingestion and Registry Assembly
//!
//! Modalities load in a fixed order (EEG, GSR, PPG); the last one loaded
//! sets the registry's total duration.

use crate::registry::{Registry, RegistryBuilder, EEG_STREAM};
use crate::settings::{EegSection, GsrSection, PpgSection, VisualizerConfig};
use crate::stream::Stream;
use crate::RegistryError;
use feature_engine::{
    duration_seconds, AutonomicDecomposer, BandPowerExtractor, CardiacExtractor,
};
use ndarray::Array2;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Rate of every derived 1 Hz series
const FEATURE_RATE: u32 = 1;

fn reader(path: &Path, has_headers: bool) -> Result<csv::Reader<std::fs::File>, RegistryError> {
    if !path.is_file() {
        return Err(RegistryError::NotFound(path.to_path_buf()));
    }
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| parse_error(path, e))
}

fn parse_error(path: &Path, reason: impl ToString) -> RegistryError {
    RegistryError::Parse {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn parse_value(path: &Path, field: &str, row: usize, column: usize) -> Result<f64, RegistryError> {
    field.parse::<f64>().map_err(|_| {
        parse_error(
            path,
            format!("row {row}, column {column}: '{field}' is not a number"),
        )
    })
}

/// Read a multichannel CSV (header of channel labels, one row per sample)
/// into a channels x samples array
pub fn read_channels_csv(path: &Path) -> Result<(Array2<f64>, Vec<String>), RegistryError> {
    let mut reader = reader(path, true)?;
    let labels: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        return Err(parse_error(path, "no channel columns"));
    }

    let mut values = Vec::new();
    let mut samples = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| parse_error(path, e))?;
        if record.len() != labels.len() {
            return Err(parse_error(
                path,
                format!(
                    "row {row} has {} fields, expected {}",
                    record.len(),
                    labels.len()
                ),
            ));
        }
        for (column, field) in record.iter().enumerate() {
            values.push(parse_value(path, field, row, column)?);
        }
        samples += 1;
    }

    let by_sample = Array2::from_shape_vec((samples, labels.len()), values)
        .map_err(|e| parse_error(path, e))?;
    debug!(
        "Read {} channels x {} samples from {}",
        labels.len(),
        samples,
        path.display()
    );
    Ok((by_sample.t().as_standard_layout().into_owned(), labels))
}

/// Read a headerless CSV whose first column is the signal
pub fn read_signal_csv(path: &Path) -> Result<Vec<f64>, RegistryError> {
    let mut reader = reader(path, false)?;
    let mut signal = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| parse_error(path, e))?;
        let field = record
            .get(0)
            .ok_or_else(|| parse_error(path, format!("row {row} is empty")))?;
        signal.push(parse_value(path, field, row, 0)?);
    }
    debug!("Read {} samples from {}", signal.len(), path.display());
    Ok(signal)
}

/// Runs every enabled extractor once and assembles the registry
#[derive(Debug, Clone, Default)]
pub struct RegistryLoader {
    band_power: BandPowerExtractor,
    autonomic: AutonomicDecomposer,
    cardiac: CardiacExtractor,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_band_power(mut self, extractor: BandPowerExtractor) -> Self {
        self.band_power = extractor;
        self
    }

    pub fn with_autonomic(mut self, decomposer: AutonomicDecomposer) -> Self {
        self.autonomic = decomposer;
        self
    }

    pub fn with_cardiac(mut self, extractor: CardiacExtractor) -> Self {
        self.cardiac = extractor;
        self
    }

    /// Load every configured modality; any failure aborts the whole load
    pub fn load(&self, config: &VisualizerConfig) -> Result<Registry, RegistryError> {
        config.validate()?;

        let mut builder = Registry::builder();
        if let Some(section) = &config.eeg {
            self.load_eeg(section, &mut builder)?;
        }
        if let Some(section) = &config.gsr {
            self.load_gsr(section, &mut builder)?;
        }
        if let Some(section) = &config.ppg {
            self.load_ppg(section, &mut builder)?;
        }

        let registry = builder.build();
        info!(
            "Registry ready: {} streams over {:.1}s",
            registry.len(),
            registry.total_duration()
        );
        Ok(registry)
    }

    fn load_eeg(&self, section: &EegSection, builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
        let rate = section.sampling_rate;
        let (data, channels) = read_channels_csv(&section.path)?;
        info!(
            "Loaded EEG: {} channels x {} samples at {} Hz",
            data.nrows(),
            data.ncols(),
            rate
        );
        builder
            .set_duration(duration_seconds(data.ncols(), rate))
            .set_eeg_channels(channels);

        let raw = Arc::new(data);
        if section.wants_band_series() {
            let mut series = self
                .band_power
                .extract(raw.view(), rate, section.window_spec()?)?;
            for (band, name, enabled) in section.band_streams() {
                if !enabled {
                    continue;
                }
                let values = series.take(band).ok_or_else(|| {
                    RegistryError::Configuration(format!("band '{band}' is not configured"))
                })?;
                builder.insert(name, Stream::samples(values, FEATURE_RATE))?;
            }
        }
        if section.display_signal {
            builder.insert(EEG_STREAM, Stream::channels(Arc::clone(&raw), rate))?;
        }
        if section.display_power_band_bars {
            builder.insert(
                "power_bands",
                Stream::on_demand(raw, rate, self.band_power.clone()),
            )?;
        }
        Ok(())
    }

    fn load_gsr(&self, section: &GsrSection, builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
        let rate = section.sampling_rate;
        let signal = read_signal_csv(&section.path)?;
        info!("Loaded GSR: {} samples at {} Hz", signal.len(), rate);
        builder.set_duration(duration_seconds(signal.len(), rate));

        if section.wants_components() {
            let components = self.autonomic.decompose(&signal, rate)?;
            if section.display_phasic {
                builder.insert("gsr_phasic", Stream::samples(components.phasic, rate))?;
            }
            if section.display_tonic {
                builder.insert("gsr_tonic", Stream::samples(components.tonic, rate))?;
            }
        }
        if section.display_signal {
            builder.insert("gsr", Stream::samples(signal, rate))?;
        }
        Ok(())
    }

    fn load_ppg(&self, section: &PpgSection, builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
        let rate = section.sampling_rate;
        let signal = read_signal_csv(&section.path)?;
        info!("Loaded PPG: {} samples at {} Hz", signal.len(), rate);
        builder.set_duration(duration_seconds(signal.len(), rate));

        if section.wants_features() {
            let series = self.cardiac.extract(&signal, rate, section.window_spec()?)?;
            let outputs = [
                ("hr", section.display_hr, series.heart_rate),
                ("hrv", section.display_hrv, series.hrv),
                ("breathing_rate", section.display_breathing_rate, series.breathing_rate),
            ];
            for (name, enabled, values) in outputs {
                if enabled {
                    builder.insert(name, Stream::samples(values, FEATURE_RATE))?;
                }
            }
        }
        if section.display_signal {
            builder.insert("ppg", Stream::samples(signal, rate))?;
        }
        Ok(())
    }
}
