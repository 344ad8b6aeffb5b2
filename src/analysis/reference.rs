//! Static-background differencing.
//!
//! Compares the ROI of each live frame against a fixed background
//! snapshot. Aside from a one-time cached resize of the reference, this
//! is a pure function of its inputs: no state evolves across frames.

use super::{crop_roi, luma601, AnalysisError, Roi};
use crate::decode::Frame;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

/// Foreground mask value for "different from background".
const FOREGROUND: u8 = 255;

/// Diffs live frames against a static background reference.
pub struct ReferenceModel {
    reference: RgbImage,
    /// Reference resized to the ROI dimensions, computed at most once.
    resized: Option<RgbImage>,
    roi: Roi,
    threshold: u8,
    resize_count: u32,
}

impl ReferenceModel {
    /// Configures the model with a background snapshot and an ROI.
    ///
    /// The reference keeps its original dimensions; if they differ from
    /// the ROI a resized copy is produced on first use and cached. The
    /// original is never mutated.
    pub fn new(reference: RgbImage, roi: Roi, threshold: u8) -> Self {
        Self {
            reference,
            resized: None,
            roi,
            threshold,
            resize_count: 0,
        }
    }

    /// The configured region of interest.
    pub fn roi(&self) -> Roi {
        self.roi
    }

    /// How many times the reference has been resized. At most 1.
    pub fn resize_count(&self) -> u32 {
        self.resize_count
    }

    /// Computes the binary difference mask for one frame.
    ///
    /// Steps: crop the ROI; absolute per-channel difference against the
    /// (resized) reference; grayscale conversion; binary threshold.
    /// Deterministic: identical inputs yield bit-identical masks.
    pub fn diff(&mut self, frame: &Frame) -> Result<GrayImage, AnalysisError> {
        let live = crop_roi(frame, self.roi)?;
        let threshold = self.threshold;
        let reference = self.active_reference();

        let (w, h) = (live.width(), live.height());
        let mut mask = GrayImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let a = live.get_pixel(x, y).0;
                let b = reference.get_pixel(x, y).0;
                let gray = luma601(
                    a[0].abs_diff(b[0]),
                    a[1].abs_diff(b[1]),
                    a[2].abs_diff(b[2]),
                );
                if gray > threshold {
                    mask.put_pixel(x, y, image::Luma([FOREGROUND]));
                }
            }
        }
        Ok(mask)
    }

    /// The reference at ROI dimensions, resizing and caching on first
    /// mismatch.
    fn active_reference(&mut self) -> &RgbImage {
        let (rw, rh) = (self.roi.width, self.roi.height);
        if self.reference.dimensions() != (rw, rh) && self.resized.is_none() {
            self.resize_count += 1;
            tracing::debug!(
                from_w = self.reference.width(),
                from_h = self.reference.height(),
                to_w = rw,
                to_h = rh,
                "resizing background reference to roi"
            );
            self.resized = Some(imageops::resize(&self.reference, rw, rh, FilterType::Triangle));
        }
        self.resized.as_ref().unwrap_or(&self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h, 1)
    }

    fn solid_image(w: u32, h: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, image::Rgb([value, value, value]))
    }

    #[test]
    fn test_identical_frame_empty_mask() {
        let roi = Roi::full_frame(16, 16);
        let mut model = ReferenceModel::new(solid_image(16, 16, 100), roi, 40);

        let mask = model.diff(&solid_frame(16, 16, 100)).unwrap();
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_black_square_on_gray_background() {
        // Reference: solid gray 100x100. Live: same gray with a 20x20
        // black square at (10, 10). The mask must be 255 exactly inside
        // rows/cols 10..=29.
        let roi = Roi::full_frame(100, 100);
        let mut model = ReferenceModel::new(solid_image(100, 100, 128), roi, 40);

        let mut frame_pixels = vec![128u8; 100 * 100 * 3];
        for y in 10..30usize {
            for x in 10..30usize {
                let i = (y * 100 + x) * 3;
                frame_pixels[i..i + 3].copy_from_slice(&[0, 0, 0]);
            }
        }
        let frame = Frame::new(frame_pixels, 100, 100, 1);

        let mask = model.diff(&frame).unwrap();
        for y in 0..100 {
            for x in 0..100 {
                let inside = (10..30).contains(&x) && (10..30).contains(&y);
                let expected = if inside { 255 } else { 0 };
                assert_eq!(mask.get_pixel(x, y).0[0], expected, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_diff_is_idempotent() {
        let roi = Roi::full_frame(32, 32);
        let mut model = ReferenceModel::new(solid_image(32, 32, 50), roi, 40);
        let frame = solid_frame(32, 32, 200);

        let first = model.diff(&frame).unwrap();
        let second = model.diff(&frame).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_mismatched_reference_resized_once() {
        let roi = Roi::full_frame(32, 32);
        // Reference at double resolution.
        let mut model = ReferenceModel::new(solid_image(64, 64, 100), roi, 40);
        let frame = solid_frame(32, 32, 100);

        assert_eq!(model.resize_count(), 0);
        model.diff(&frame).unwrap();
        assert_eq!(model.resize_count(), 1);
        model.diff(&frame).unwrap();
        model.diff(&frame).unwrap();
        assert_eq!(model.resize_count(), 1);
    }

    #[test]
    fn test_matching_reference_never_resized() {
        let roi = Roi::full_frame(32, 32);
        let mut model = ReferenceModel::new(solid_image(32, 32, 100), roi, 40);

        model.diff(&solid_frame(32, 32, 100)).unwrap();
        assert_eq!(model.resize_count(), 0);
    }

    #[test]
    fn test_delta_at_threshold_not_marked() {
        // Gray delta of exactly the threshold stays background; the
        // cutoff is strictly greater-than.
        let roi = Roi::full_frame(8, 8);
        let mut model = ReferenceModel::new(solid_image(8, 8, 100), roi, 40);

        let at = model.diff(&solid_frame(8, 8, 140)).unwrap();
        assert!(at.pixels().all(|p| p.0[0] == 0));

        let above = model.diff(&solid_frame(8, 8, 141)).unwrap();
        assert!(above.pixels().all(|p| p.0[0] == 255));
    }
}
