//! Visualizer Configuration
//!
//! One optional section per modality (`EEG`, `GSR`, `PPG`) plus `server`.
//! `.conf`/`.ini` files are read as INI, other extensions by their format.
//! Environment variables prefixed `VISUALIZER__` override file values, e.g.
//! `VISUALIZER__SERVER__ADDRESS=127.0.0.1:9000`.

use crate::RegistryError;
use config::{Config, Environment, File, FileFormat};
use feature_engine::{WindowSpec, DEFAULT_PPG_OVERLAP, DEFAULT_PPG_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "VISUALIZER";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            log_level: default_log_level(),
        }
    }
}

/// `[EEG]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EegSection {
    pub path: PathBuf,
    pub sampling_rate: u32,
    #[serde(default)]
    pub display_signal: bool,
    #[serde(default)]
    pub display_delta_signal: bool,
    #[serde(default)]
    pub display_theta_signal: bool,
    #[serde(default)]
    pub display_alpha_signal: bool,
    #[serde(default)]
    pub display_beta_signal: bool,
    #[serde(default)]
    pub display_gamma_signal: bool,
    /// Keep the raw recording to compute band bars per query
    #[serde(default)]
    pub display_power_band_bars: bool,
    #[serde(default)]
    pub window_size: Option<u32>,
    #[serde(default)]
    pub overlap: Option<u32>,
}

impl EegSection {
    /// `(band name, stream name, enabled)` for each band series
    pub fn band_streams(&self) -> [(&'static str, &'static str, bool); 5] {
        [
            ("Delta", "delta_band", self.display_delta_signal),
            ("Theta", "theta_band", self.display_theta_signal),
            ("Alpha", "alpha_band", self.display_alpha_signal),
            ("Beta", "beta_band", self.display_beta_signal),
            ("Gamma", "gamma_band", self.display_gamma_signal),
        ]
    }

    /// Whether any precomputed band series is displayed
    pub fn wants_band_series(&self) -> bool {
        self.band_streams().iter().any(|(_, _, enabled)| *enabled)
    }

    /// Validated window; both fields are required for band series
    pub fn window_spec(&self) -> Result<WindowSpec, RegistryError> {
        let (Some(window_size), Some(overlap)) = (self.window_size, self.overlap) else {
            return Err(RegistryError::Configuration(
                "EEG window_size and overlap are required to display band signals".to_string(),
            ));
        };
        WindowSpec::new(window_size, overlap)
            .map_err(|e| RegistryError::Configuration(format!("EEG: {e}")))
    }
}

/// `[GSR]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GsrSection {
    pub path: PathBuf,
    pub sampling_rate: u32,
    #[serde(default)]
    pub display_signal: bool,
    #[serde(default)]
    pub display_phasic: bool,
    #[serde(default)]
    pub display_tonic: bool,
}

impl GsrSection {
    /// Whether the decomposition has to run
    pub fn wants_components(&self) -> bool {
        self.display_phasic || self.display_tonic
    }
}

/// `[PPG]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpgSection {
    pub path: PathBuf,
    pub sampling_rate: u32,
    #[serde(default)]
    pub display_signal: bool,
    #[serde(default)]
    pub display_hr: bool,
    #[serde(default)]
    pub display_hrv: bool,
    #[serde(default)]
    pub display_breathing_rate: bool,
    #[serde(default = "default_ppg_window")]
    pub window_size: u32,
    #[serde(default = "default_ppg_overlap")]
    pub overlap: u32,
}

fn default_ppg_window() -> u32 {
    DEFAULT_PPG_WINDOW
}

fn default_ppg_overlap() -> u32 {
    DEFAULT_PPG_OVERLAP
}

impl PpgSection {
    /// Whether segment-wise estimation has to run
    pub fn wants_features(&self) -> bool {
        self.display_hr || self.display_hrv || self.display_breathing_rate
    }

    /// Validated segment window
    pub fn window_spec(&self) -> Result<WindowSpec, RegistryError> {
        WindowSpec::new(self.window_size, self.overlap)
            .map_err(|e| RegistryError::Configuration(format!("PPG: {e}")))
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizerConfig {
    #[serde(default, alias = "SERVER")]
    pub server: ServerConfig,
    #[serde(default, alias = "EEG")]
    pub eeg: Option<EegSection>,
    #[serde(default, alias = "GSR")]
    pub gsr: Option<GsrSection>,
    #[serde(default, alias = "PPG")]
    pub ppg: Option<PpgSection>,
}

impl VisualizerConfig {
    /// Read `path`, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RegistryError::NotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            Some("yaml" | "yml") => FileFormat::Yaml,
            _ => FileFormat::Ini,
        };

        let settings = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), format))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        debug!("Read configuration from {}", path.display());
        Ok(config)
    }

    /// Names of the configured modalities, in load order
    pub fn modalities(&self) -> Vec<&'static str> {
        [
            ("EEG", self.eeg.is_some()),
            ("GSR", self.gsr.is_some()),
            ("PPG", self.ppg.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    /// Sampling rates positive, windows valid wherever a windowed feature is enabled
    pub fn validate(&self) -> Result<(), RegistryError> {
        let rates = [
            ("EEG", self.eeg.as_ref().map(|s| s.sampling_rate)),
            ("GSR", self.gsr.as_ref().map(|s| s.sampling_rate)),
            ("PPG", self.ppg.as_ref().map(|s| s.sampling_rate)),
        ];
        for (modality, rate) in rates {
            if rate == Some(0) {
                return Err(RegistryError::Configuration(format!(
                    "{modality} sampling_rate must be positive"
                )));
            }
        }

        if let Some(eeg) = self.eeg.as_ref().filter(|s| s.wants_band_series()) {
            eeg.window_spec()?;
        }
        if let Some(ppg) = self.ppg.as_ref().filter(|s| s.wants_features()) {
            ppg.window_spec()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_ini_sections() {
        let file = write_config(
            ".conf",
            "[EEG]\n\
             path = /data/eeg.csv\n\
             sampling_rate = 128\n\
             display_signal = true\n\
             display_alpha_signal = true\n\
             display_power_band_bars = false\n\
             window_size = 3\n\
             overlap = 2\n\
             \n\
             [PPG]\n\
             path = /data/ppg.csv\n\
             sampling_rate = 64\n\
             display_hr = true\n",
        );

        let config = VisualizerConfig::load(file.path()).unwrap();
        let eeg = config.eeg.as_ref().unwrap();
        assert_eq!(eeg.sampling_rate, 128);
        assert!(eeg.display_signal && eeg.display_alpha_signal);
        assert!(!eeg.display_beta_signal);
        assert_eq!(eeg.window_spec().unwrap().step(), 1);

        let ppg = config.ppg.as_ref().unwrap();
        assert_eq!((ppg.window_size, ppg.overlap), (20, 19));
        assert!(config.gsr.is_none());
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.modalities(), vec!["EEG", "PPG"]);
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            "[server]\naddress = \"127.0.0.1:9000\"\n\n[gsr]\npath = \"/data/gsr.csv\"\nsampling_rate = 50\ndisplay_phasic = true\n",
        );

        let config = VisualizerConfig::load(file.path()).unwrap();
        assert_eq!(config.server.address, "127.0.0.1:9000");
        assert_eq!(config.modalities(), vec!["GSR"]);
        assert!(config.gsr.unwrap().wants_components());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        assert!(matches!(
            VisualizerConfig::load("/nonexistent/visualizer.conf"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_overlap_not_smaller_than_window() {
        let file = write_config(
            ".conf",
            "[EEG]\npath = /data/eeg.csv\nsampling_rate = 128\ndisplay_beta_signal = true\nwindow_size = 3\noverlap = 3\n",
        );
        assert!(matches!(
            VisualizerConfig::load(file.path()),
            Err(RegistryError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_required_fields() {
        let missing_rate = write_config(".conf", "[GSR]\npath = /data/gsr.csv\n");
        assert!(matches!(
            VisualizerConfig::load(missing_rate.path()),
            Err(RegistryError::Configuration(_))
        ));

        let missing_window = write_config(
            ".conf",
            "[EEG]\npath = /data/eeg.csv\nsampling_rate = 128\ndisplay_delta_signal = true\n",
        );
        assert!(matches!(
            VisualizerConfig::load(missing_window.path()),
            Err(RegistryError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_sampling_rate_rejected() {
        let config = VisualizerConfig {
            gsr: Some(GsrSection {
                path: PathBuf::from("/data/gsr.csv"),
                sampling_rate: 0,
                display_signal: true,
                display_phasic: false,
                display_tonic: false,
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistryError::Configuration(_))
        ));
    }
}
