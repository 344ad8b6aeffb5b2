//! Mask cleanup and candidate extraction.
//!
//! Opening removes speckle noise, dilation merges nearby fragments, and
//! connected-component labelling turns the surviving blobs into bounding
//! rectangles. Candidates are per-frame and carry no identity: nothing
//! here tracks objects across frames.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, open};
use imageproc::rect::Rect;
use imageproc::region_labelling::{connected_components, Connectivity};

/// A candidate object extracted from one frame's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateObject {
    /// Axis-aligned bounding rectangle in mask coordinates.
    pub bbox: Rect,
    /// Component area in pixels.
    pub area: u32,
}

/// Cleans binary masks and extracts candidate objects.
#[derive(Debug, Clone)]
pub struct MaskPostProcessor {
    /// Dilation radius applied after opening.
    dilate_radius: u8,
}

impl MaskPostProcessor {
    /// Creates a post-processor dilating by the given number of
    /// iterations of the 3x3 element.
    pub fn new(dilate_iterations: u32) -> Self {
        Self {
            dilate_radius: dilate_iterations.min(u8::MAX as u32) as u8,
        }
    }

    /// Extracts candidate objects from a binary mask.
    ///
    /// Components with area below `min_area` are discarded; a component
    /// of exactly `min_area` pixels is kept. Candidates are returned in
    /// label-discovery order, which callers must not rely on.
    pub fn extract(&self, mask: &GrayImage, min_area: u32) -> Vec<CandidateObject> {
        // 3x3 cross element, as the original's elliptical kernel reduces
        // to at this size.
        let opened = open(mask, Norm::L1, 1);
        let merged = if self.dilate_radius > 0 {
            dilate(&opened, Norm::L1, self.dilate_radius)
        } else {
            opened
        };

        let labels = connected_components(&merged, Connectivity::Eight, Luma([0u8]));

        #[derive(Clone)]
        struct Span {
            min_x: u32,
            min_y: u32,
            max_x: u32,
            max_y: u32,
            area: u32,
        }
        let mut spans: Vec<Option<Span>> = Vec::new();

        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0] as usize;
            if label == 0 {
                continue;
            }
            if spans.len() < label {
                spans.resize(label, None);
            }
            let slot = &mut spans[label - 1];
            match slot {
                Some(span) => {
                    span.min_x = span.min_x.min(x);
                    span.min_y = span.min_y.min(y);
                    span.max_x = span.max_x.max(x);
                    span.max_y = span.max_y.max(y);
                    span.area += 1;
                }
                None => {
                    *slot = Some(Span {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                        area: 1,
                    });
                }
            }
        }

        spans
            .into_iter()
            .flatten()
            .filter(|span| span.area >= min_area)
            .map(|span| CandidateObject {
                bbox: Rect::at(span.min_x as i32, span.min_y as i32).of_size(
                    span.max_x - span.min_x + 1,
                    span.max_y - span.min_y + 1,
                ),
                area: span.area,
            })
            .collect()
    }
}
