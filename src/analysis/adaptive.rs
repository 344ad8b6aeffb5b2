//! Adaptive statistical background model.
//!
//! Maintains a per-pixel running Gaussian estimate of "typical"
//! grayscale intensity plus a match-support score tracking how
//! consistently each pixel has agreed with its estimate. Pixels that
//! persist with low variance become background; everything else is
//! foreground. Needs no externally supplied reference and follows slow
//! scene changes such as lighting drift.
//!
//! Frames must arrive one at a time in temporal order. Skipped or
//! reordered frames degrade classification quality but never panic; a
//! dimension change simply restarts the estimate.

use super::{luma601, AdaptiveConfig, AnalysisError};
use crate::decode::Frame;
use image::GrayImage;

/// Match gate in standard deviations: a pixel matches its estimate when
/// its squared deviation is within this many sigmas.
const MATCH_GATE_SIGMA: f32 = 2.5;
/// Variance assigned to a pixel when first observed.
const INITIAL_VARIANCE: f32 = 225.0;
/// Variance floor, keeping the gate open on perfectly static pixels.
const MIN_VARIANCE: f32 = 9.0;

/// Continuously updated foreground/background classifier.
pub struct AdaptiveBackgroundModel {
    config: AdaptiveConfig,
    width: u32,
    height: u32,
    /// Per-pixel running mean intensity.
    mean: Vec<f32>,
    /// Per-pixel running variance.
    variance: Vec<f32>,
    /// Per-pixel fraction of recent frames that matched the estimate.
    support: Vec<f32>,
    frames_seen: u64,
}

impl AdaptiveBackgroundModel {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self {
            config,
            width: 0,
            height: 0,
            mean: Vec::new(),
            variance: Vec::new(),
            support: Vec::new(),
            frames_seen: 0,
        }
    }

    /// Number of frames observed so far.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// True once the initialization window has been observed.
    pub fn is_initialized(&self) -> bool {
        self.frames_seen >= self.config.history as u64
    }

    /// Classifies one frame and folds it into the background estimate.
    ///
    /// Returns a binary mask where 255 marks foreground. State is owned
    /// exclusively by this instance and mutated only here.
    pub fn apply(&mut self, frame: &Frame) -> Result<GrayImage, AnalysisError> {
        if !frame.is_valid() {
            return Err(AnalysisError::InvalidFrame);
        }
        if (frame.width(), frame.height()) != (self.width, self.height) {
            self.restart(frame.width(), frame.height());
        }

        // 1/n learning rate while initializing, then a constant 1/history
        // so the estimate keeps adapting to slow drift.
        let n = (self.frames_seen + 1).min(self.config.history as u64);
        let alpha = 1.0 / n as f32;
        let gate = MATCH_GATE_SIGMA * MATCH_GATE_SIGMA;
        let decision = self.config.decision_threshold;

        let mut mask = GrayImage::new(self.width, self.height);
        let mask_buf: &mut [u8] = &mut mask;
        for (i, rgb) in frame.pixels().chunks_exact(3).enumerate() {
            let value = luma601(rgb[0], rgb[1], rgb[2]) as f32;
            let deviation = value - self.mean[i];
            let matched = deviation * deviation <= gate * self.variance[i].max(MIN_VARIANCE);

            if !matched || self.support[i] < decision {
                mask_buf[i] = 255;
            }

            self.mean[i] += alpha * deviation;
            self.variance[i] += alpha * (deviation * deviation - self.variance[i]);
            if self.variance[i] < MIN_VARIANCE {
                self.variance[i] = MIN_VARIANCE;
            }
            let observed = if matched { 1.0 } else { 0.0 };
            self.support[i] += alpha * (observed - self.support[i]);
        }

        self.frames_seen += 1;
        Ok(mask)
    }

    fn restart(&mut self, width: u32, height: u32) {
        if self.frames_seen > 0 {
            tracing::warn!(
                old_w = self.width,
                old_h = self.height,
                new_w = width,
                new_h = height,
                "frame dimensions changed, restarting background estimate"
            );
        }
        let len = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.mean = vec![0.0; len];
        self.variance = vec![INITIAL_VARIANCE; len];
        self.support = vec![0.0; len];
        self.frames_seen = 0;
    }
}
