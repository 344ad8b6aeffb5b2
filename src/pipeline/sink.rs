//! Presentation seam for analyzed frames.
//!
//! Rendering and annotation UIs are external collaborators; the loop
//! only sees this trait. A sink can also request a stop, which is how a
//! "quit" keypress reaches the controller.

use crate::analysis::CandidateObject;
use crate::decode::Frame;
use image::GrayImage;

/// Consumes one analyzed frame per loop iteration.
pub trait FrameSink {
    /// Presents a frame with its mask and candidates.
    ///
    /// Returns `false` to request a cooperative stop.
    fn present(&mut self, frame: &Frame, mask: &GrayImage, candidates: &[CandidateObject]) -> bool;
}

/// Sink that reports candidates through the diagnostic log.
#[derive(Debug, Default)]
pub struct TracingSink;

impl FrameSink for TracingSink {
    fn present(&mut self, frame: &Frame, mask: &GrayImage, candidates: &[CandidateObject]) -> bool {
        let foreground = mask.pixels().filter(|p| p.0[0] != 0).count();
        tracing::debug!(
            sequence = frame.sequence(),
            foreground_pixels = foreground,
            candidates = candidates.len(),
            "frame analyzed"
        );
        for candidate in candidates {
            tracing::trace!(
                x = candidate.bbox.left(),
                y = candidate.bbox.top(),
                w = candidate.bbox.width(),
                h = candidate.bbox.height(),
                area = candidate.area,
                "candidate object"
            );
        }
        true
    }
}

/// Sink that drops everything. Useful for timing runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _: &Frame, _: &GrayImage, _: &[CandidateObject]) -> bool {
        true
    }
}
