//! Region of interest in frame pixel coordinates.

use serde::{Deserialize, Serialize};

/// A fixed rectangular sub-area of a frame selected for analysis.
///
/// Immutable once configured for a session. Must lie entirely within the
/// frame: `x + width <= frame.width` and `y + height <= frame.height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// The full frame as an ROI.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Validates that this ROI fits inside the given frame dimensions.
    pub fn validate_within(
        &self,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<(), crate::config::ConfigError> {
        let fits_x = self
            .x
            .checked_add(self.width)
            .is_some_and(|end| end <= frame_width);
        let fits_y = self
            .y
            .checked_add(self.height)
            .is_some_and(|end| end <= frame_height);
        if self.width == 0 || self.height == 0 || !fits_x || !fits_y {
            return Err(crate::config::ConfigError::RoiOutOfBounds {
                roi: *self,
                frame_width,
                frame_height,
            });
        }
        Ok(())
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_within_frame() {
        let roi = Roi {
            x: 45,
            y: 105,
            width: 488,
            height: 664,
        };
        assert!(roi.validate_within(576, 1024).is_ok());
    }

    #[test]
    fn test_roi_exactly_filling_frame() {
        let roi = Roi::full_frame(576, 1024);
        assert!(roi.validate_within(576, 1024).is_ok());
    }

    #[test]
    fn test_roi_exceeding_frame() {
        let roi = Roi {
            x: 100,
            y: 0,
            width: 500,
            height: 10,
        };
        assert!(roi.validate_within(576, 1024).is_err());
    }

    #[test]
    fn test_empty_roi_rejected() {
        let roi = Roi {
            x: 0,
            y: 0,
            width: 0,
            height: 10,
        };
        assert!(roi.validate_within(576, 1024).is_err());
    }

    #[test]
    fn test_overflowing_roi_rejected() {
        let roi = Roi {
            x: u32::MAX,
            y: 0,
            width: 2,
            height: 2,
        };
        assert!(roi.validate_within(576, 1024).is_err());
    }
}
