//! Background subtraction and candidate extraction.
//!
//! Two mask-producing strategies behind one closed seam: a static
//! reference diff for scenes with a known clean background, and an
//! adaptive per-pixel statistical model for scenes without one. Both emit
//! a binary foreground mask that the post-processor turns into candidate
//! object rectangles.

mod adaptive;
mod config;
mod postprocess;
mod reference;
mod roi;

pub use adaptive::AdaptiveBackgroundModel;
pub use config::{AdaptiveConfig, AnalysisConfig};
pub use postprocess::{CandidateObject, MaskPostProcessor};
pub use reference::ReferenceModel;
pub use roi::Roi;

use crate::decode::Frame;
use image::GrayImage;
use thiserror::Error;

/// Errors raised while analyzing a frame.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("roi {roi:?} does not fit inside a {width}x{height} frame")]
    RoiOutOfFrame { roi: Roi, width: u32, height: u32 },

    #[error("frame pixel buffer does not match its dimensions")]
    InvalidFrame,
}

/// The configured mask-producing strategy.
///
/// A closed set of two variants, selected at configuration time.
pub enum MaskProducer {
    /// Diff against a static background snapshot.
    Static(ReferenceModel),
    /// Continuously adapting statistical background estimate.
    Adaptive(AdaptiveBackgroundModel),
}

impl MaskProducer {
    /// Produces the foreground mask for one frame.
    pub fn mask_for(&mut self, frame: &Frame) -> Result<GrayImage, AnalysisError> {
        match self {
            Self::Static(model) => model.diff(frame),
            Self::Adaptive(model) => model.apply(frame),
        }
    }

    /// Strategy name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Static(_) => "static-reference",
            Self::Adaptive(_) => "adaptive",
        }
    }
}

/// Copies the ROI sub-grid out of a frame.
pub(crate) fn crop_roi(frame: &Frame, roi: Roi) -> Result<image::RgbImage, AnalysisError> {
    if !frame.is_valid() {
        return Err(AnalysisError::InvalidFrame);
    }
    roi.validate_within(frame.width(), frame.height())
        .map_err(|_| AnalysisError::RoiOutOfFrame {
            roi,
            width: frame.width(),
            height: frame.height(),
        })?;

    let stride = frame.width() as usize * 3;
    let mut out = Vec::with_capacity(roi.width as usize * roi.height as usize * 3);
    for row in roi.y..roi.y + roi.height {
        let start = row as usize * stride + roi.x as usize * 3;
        let end = start + roi.width as usize * 3;
        out.extend_from_slice(&frame.pixels()[start..end]);
    }
    // Dimensions and buffer length agree by construction.
    image::RgbImage::from_raw(roi.width, roi.height, out).ok_or(AnalysisError::InvalidFrame)
}

/// BT.601 luma of an RGB triple, matching the original capture chain's
/// grayscale conversion.
#[inline]
pub(crate) fn luma601(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_roi_extracts_subgrid() {
        // 4x4 frame, pixel value = x + 4*y in every channel.
        let mut pixels = Vec::new();
        for y in 0u8..4 {
            for x in 0u8..4 {
                let v = x + 4 * y;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        let frame = Frame::new(pixels, 4, 4, 1);
        let roi = Roi {
            x: 1,
            y: 2,
            width: 2,
            height: 2,
        };

        let cropped = crop_roi(&frame, roi).unwrap();
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.get_pixel(0, 0).0, [9, 9, 9]); // x=1, y=2
        assert_eq!(cropped.get_pixel(1, 1).0, [14, 14, 14]); // x=2, y=3
    }

    #[test]
    fn test_crop_roi_rejects_out_of_bounds() {
        let frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 1);
        let roi = Roi {
            x: 3,
            y: 0,
            width: 2,
            height: 2,
        };
        assert!(matches!(
            crop_roi(&frame, roi),
            Err(AnalysisError::RoiOutOfFrame { .. })
        ));
    }

    #[test]
    fn test_luma_black_and_white() {
        assert_eq!(luma601(0, 0, 0), 0);
        assert_eq!(luma601(255, 255, 255), 255);
    }
}
