//! File configuration.
//!
//! All tunables reach the components as explicit, passed-in records; no
//! module-level mutable configuration exists anywhere in the crate.

use crate::analysis::{AnalysisConfig, Roi};
use crate::transport::TransportConfig;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration validation and loading errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("invalid transport endpoint")]
    InvalidEndpoint,
    #[error("invalid timeout (must be nonzero)")]
    InvalidTimeout,
    #[error("invalid analysis threshold")]
    InvalidThreshold,
    #[error("roi {roi:?} outside {frame_width}x{frame_height} frame bounds")]
    RoiOutOfBounds {
        roi: Roi,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("static mode requires a reference image path")]
    ReferenceMissing,
    #[error("failed to load reference image: {0}")]
    ReferenceImage(String),
    #[error("failed to read config file: {0}")]
    FileRead(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Which mask-producing strategy the loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// Diff against a static background snapshot (requires
    /// `reference_image`).
    Static,
    /// Adaptive statistical background model; no snapshot needed.
    #[default]
    Adaptive,
}

/// Run-scope settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunConfig {
    /// Analysis strategy.
    #[serde(default)]
    pub mode: AnalysisMode,
    /// Stop after this many frames; `None` runs until the stream ends.
    #[serde(default)]
    pub max_frames: Option<u64>,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Region of interest; `None` analyzes the full frame.
    #[serde(default)]
    pub roi: Option<Roi>,
    /// Background snapshot for static mode.
    #[serde(default)]
    pub reference_image: Option<PathBuf>,
    #[serde(default)]
    pub run: RunConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport.validate()?;
        self.analysis.validate()?;
        if self.run.mode == AnalysisMode::Static && self.reference_image.is_none() {
            return Err(ConfigError::ReferenceMissing);
        }
        Ok(())
    }

    /// Loads and decodes the configured reference image.
    pub fn load_reference(&self) -> Result<RgbImage, ConfigError> {
        let path = self
            .reference_image
            .as_ref()
            .ok_or(ConfigError::ReferenceMissing)?;
        let img = image::open(path)
            .map_err(|e| ConfigError::ReferenceImage(format!("{}: {e}", path.display())))?;
        Ok(img.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.run.mode, AnalysisMode::Adaptive);
    }

    #[test]
    fn test_static_mode_requires_reference() {
        let mut config = FileConfig::default();
        config.run.mode = AnalysisMode::Static;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReferenceMissing)
        ));

        config.reference_image = Some(PathBuf::from("background.png"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_sections() {
        let toml = r#"
            [transport]
            host = "127.0.0.1"
            port = 27183
            connect_timeout_ms = 1000
            read_timeout_ms = 2000
            handshake_delay_ms = 100

            [analysis]
            diff_threshold = 40
            min_area = 200
            dilate_iterations = 2

            [analysis.adaptive]
            history = 120
            decision_threshold = 0.8

            [roi]
            x = 45
            y = 105
            width = 488
            height = 664

            [run]
            mode = "adaptive"
            max_frames = 500
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.roi.unwrap().width, 488);
        assert_eq!(config.run.max_frames, Some(500));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.transport.port, 27183);
        assert_eq!(config.analysis.diff_threshold, 40);
        assert!(config.roi.is_none());
    }

    #[test]
    fn test_missing_reference_file_is_error() {
        let mut config = FileConfig::default();
        config.reference_image = Some(PathBuf::from("/nonexistent/background.png"));
        assert!(matches!(
            config.load_reference(),
            Err(ConfigError::ReferenceImage(_))
        ));
    }
}
