//! Table structure detection over a grayscale drawing region.
//!
//! The pipeline mirrors a scanned-drawing workflow: straighten the page,
//! binarize with the text as foreground, pull the table rulings out with
//! directional morphology, then take the connected white regions of the
//! ruling mask as cell candidates. The same pass also produces a copy of
//! the region with the rulings erased, which downstream recognition reads
//! from so the grid lines never leak into cell text.

use image::{imageops, GrayImage};
use tablescan_types::{BoundingBox, SelectionRect};

use crate::config::GridDetectorConfig;
use crate::contours::cell_boxes;
use crate::error::GridError;
use crate::lines::{combine_lines, isolate_lines, overlay_lines, Axis};
use crate::raster::binarize_inverted;
use crate::skew::{estimate_rotation, rotate_about_center};

/// Output of [`GridDetector::detect`].
pub struct GridDetection {
    /// Skew-corrected region with the detected rulings erased.
    pub line_free: GrayImage,
    /// Cell candidate boxes in top-to-bottom order, in the coordinate
    /// frame of `line_free`.
    pub boxes: Vec<BoundingBox>,
}

/// Detects table cell boxes in a grayscale image.
pub struct GridDetector {
    config: GridDetectorConfig,
}

impl GridDetector {
    pub fn new(config: GridDetectorConfig) -> Self {
        Self { config }
    }

    /// Runs the full detection pass.
    ///
    /// When no grid structure is found (at most one candidate region
    /// survives filtering) the whole image is returned as a single box,
    /// so a selection without rulings still flows through recognition
    /// as one cell.
    pub fn detect(&self, image: &GrayImage) -> Result<GridDetection, GridError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GridError::EmptyInput);
        }

        let straightened = match estimate_rotation(image, &self.config) {
            Some(angle) => rotate_about_center(image, angle),
            None => image.clone(),
        };

        let inverted = binarize_inverted(&straightened);
        let vertical = isolate_lines(&inverted, Axis::Vertical, &self.config);
        let horizontal = isolate_lines(&inverted, Axis::Horizontal, &self.config);
        let combined = combine_lines(&vertical, &horizontal, self.config.combine_erode_iterations);
        let line_free = overlay_lines(&straightened, &combined);

        let mut boxes = cell_boxes(&combined, &self.config);
        if boxes.len() <= 1 {
            boxes = vec![BoundingBox::new(
                0,
                0,
                straightened.width(),
                straightened.height(),
            )];
        }

        Ok(GridDetection { line_free, boxes })
    }
}

/// Crops the selected region out of a full-page image.
///
/// The selection is normalized first, so drags in any direction address
/// the same pixels. A selection that reaches outside the image fails
/// rather than being clamped: a misplaced selection should be redrawn,
/// not silently shrunk.
pub fn crop_roi(image: &GrayImage, selection: SelectionRect) -> Result<GrayImage, GridError> {
    let rect = selection.normalized();
    if rect.width == 0 || rect.height == 0 {
        return Err(GridError::EmptySelection);
    }
    let right = rect.x.checked_add(rect.width);
    let bottom = rect.y.checked_add(rect.height);
    let fits = rect.x >= 0
        && rect.y >= 0
        && right.is_some_and(|r| r <= image.width() as i32)
        && bottom.is_some_and(|b| b <= image.height() as i32);
    if !fits {
        return Err(GridError::CropOutOfBounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            image_width: image.width(),
            image_height: image.height(),
        });
    }
    Ok(imageops::crop_imm(
        image,
        rect.x as u32,
        rect.y as u32,
        rect.width as u32,
        rect.height as u32,
    )
    .to_image())
}
