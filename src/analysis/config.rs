//! Background-subtraction tuning parameters.
//!
//! All thresholds live here as an explicit record with documented
//! defaults so tuning is testable in isolation. The defaults are the
//! values observed to separate character-sized objects from noise on a
//! 576x1024 mirrored screen.

use serde::{Deserialize, Serialize};

/// Tuning for both mask producers and the post-processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Gray-delta cutoff for the static reference diff. Pixels whose
    /// intensity difference exceeds this are marked foreground.
    pub diff_threshold: u8,
    /// Minimum connected-component area, in pixels, for a candidate
    /// object. Inclusive: a component of exactly this area is kept.
    pub min_area: u32,
    /// Dilation iterations applied after opening, merging nearby
    /// foreground fragments into coherent blobs.
    pub dilate_iterations: u32,
    /// Adaptive background model tuning.
    #[serde(default)]
    pub adaptive: AdaptiveConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            diff_threshold: 40,
            min_area: 200,
            dilate_iterations: 2,
            adaptive: AdaptiveConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), crate::config::ConfigError> {
        if self.diff_threshold == 0 {
            return Err(crate::config::ConfigError::InvalidThreshold);
        }
        if self.dilate_iterations == 0 || self.dilate_iterations > u8::MAX as u32 {
            return Err(crate::config::ConfigError::InvalidThreshold);
        }
        self.adaptive.validate()
    }
}

/// Tuning for the adaptive statistical background model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    /// Number of frames over which the model initializes and, afterwards,
    /// the effective averaging window for the running estimate.
    pub history: u32,
    /// Minimum fraction of recent frames a pixel must have matched its
    /// background estimate to be classified as background.
    pub decision_threshold: f32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            history: 120,
            decision_threshold: 0.8,
        }
    }
}

impl AdaptiveConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), crate::config::ConfigError> {
        if self.history == 0 {
            return Err(crate::config::ConfigError::InvalidThreshold);
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(crate::config::ConfigError::InvalidThreshold);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.diff_threshold, 40);
        assert_eq!(config.min_area, 200);
        assert_eq!(config.adaptive.history, 120);
    }

    #[test]
    fn test_zero_history_invalid() {
        let mut config = AnalysisConfig::default();
        config.adaptive.history = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decision_threshold_out_of_range() {
        let mut config = AdaptiveConfig::default();
        config.decision_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
