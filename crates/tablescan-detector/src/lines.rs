//! Morphological isolation of table rulings.
//!
//! An erode-then-dilate pass with a line-shaped structuring element keeps
//! strokes at least as long as the element and removes everything shorter,
//! which separates rulings from text. Masks are binary (0 / 255) and runs
//! are processed per scan lane, so each pass is linear in the pixel count.

use image::GrayImage;

use crate::config::GridDetectorConfig;
use crate::raster::{self, FOREGROUND};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Horizontal,
    Vertical,
}

/// Isolates rulings aligned with `axis` from the inverted binary image.
/// The element length follows the configured divisor of the image width.
pub(crate) fn isolate_lines(
    inverted: &GrayImage,
    axis: Axis,
    config: &GridDetectorConfig,
) -> GrayImage {
    let divisor = match axis {
        Axis::Vertical => config.vertical_kernel_divisor,
        Axis::Horizontal => config.horizontal_kernel_divisor,
    };
    let len = (inverted.width() / divisor.max(1)).max(2) as usize;
    let mut mask = inverted.clone();
    for _ in 0..config.line_iterations {
        mask = morph_line(&mask, len, axis, Morph::Erode);
    }
    for _ in 0..config.line_iterations {
        mask = morph_line(&mask, len, axis, Morph::Dilate);
    }
    mask
}

/// Blends the two line masks, inverts, erodes with a 2x2 element, and
/// re-binarizes with Otsu. The result is a mask where rulings are black
/// and background plus cell interiors are foreground.
pub(crate) fn combine_lines(
    vertical: &GrayImage,
    horizontal: &GrayImage,
    erode_iterations: u32,
) -> GrayImage {
    let blended = raster::blend_half(vertical, horizontal);
    let mut combined = raster::invert(&blended);
    for _ in 0..erode_iterations {
        combined = erode_square2(&combined);
    }
    let level = raster::otsu_level(&combined);
    raster::threshold_binary(&combined, level)
}

/// XORs the source image against the combined-lines mask and inverts,
/// suppressing the rulings so per-cell OCR sees clean glyphs.
pub(crate) fn overlay_lines(image: &GrayImage, combined: &GrayImage) -> GrayImage {
    raster::invert(&raster::bitwise_xor(image, combined))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Morph {
    Erode,
    Dilate,
}

/// Applies a 1-D structuring element of `len` pixels along `axis`. The
/// anchor sits at `len / 2`; pixels outside the image are neutral, so runs
/// touching the border only shrink on their interior side.
fn morph_line(mask: &GrayImage, len: usize, axis: Axis, op: Morph) -> GrayImage {
    let (width, height) = (mask.width() as usize, mask.height() as usize);
    let src = mask.as_raw();
    let mut dst = vec![0u8; src.len()];
    match axis {
        Axis::Horizontal => {
            for y in 0..height {
                let row = &src[y * width..(y + 1) * width];
                let out = &mut dst[y * width..(y + 1) * width];
                morph_lane(row, out, len, op);
            }
        }
        Axis::Vertical => {
            let mut lane = vec![0u8; height];
            let mut out_lane = vec![0u8; height];
            for x in 0..width {
                for y in 0..height {
                    lane[y] = src[y * width + x];
                }
                out_lane.fill(0);
                morph_lane(&lane, &mut out_lane, len, op);
                for y in 0..height {
                    dst[y * width + x] = out_lane[y];
                }
            }
        }
    }
    GrayImage::from_raw(mask.width(), mask.height(), dst)
        .expect("morphed buffer matches source dimensions")
}

fn morph_lane(src: &[u8], dst: &mut [u8], len: usize, op: Morph) {
    let n = src.len();
    if n == 0 || len == 0 {
        return;
    }
    let anchor = len / 2;
    let trailing = len - 1 - anchor;
    let mut i = 0usize;
    while i < n {
        if src[i] != FOREGROUND {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && src[i] == FOREGROUND {
            i += 1;
        }
        let end = i;
        match op {
            Morph::Erode => {
                // Out-of-bounds positions count as foreground, so runs
                // reaching the border keep their border end.
                let lo = if start == 0 { 0 } else { start + anchor };
                let hi = if end == n {
                    n
                } else {
                    end.saturating_sub(trailing)
                };
                if lo < hi {
                    dst[lo..hi].fill(FOREGROUND);
                }
            }
            Morph::Dilate => {
                let lo = start.saturating_sub(trailing);
                let hi = (end + anchor).min(n);
                dst[lo..hi].fill(FOREGROUND);
            }
        }
    }
}

/// Grayscale erosion with a 2x2 element anchored at its bottom-right
/// pixel, matching the combine step's small-kernel cleanup.
fn erode_square2(image: &GrayImage) -> GrayImage {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let src = image.as_raw();
    let mut dst = vec![0u8; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut min = u8::MAX;
            for dy in 0..2usize {
                for dx in 0..2usize {
                    let (sx, sy) = (x.wrapping_sub(1).wrapping_add(dx), y.wrapping_sub(1).wrapping_add(dy));
                    if sx < width && sy < height {
                        min = min.min(src[sy * width + sx]);
                    }
                }
            }
            dst[y * width + x] = min;
        }
    }
    GrayImage::from_raw(image.width(), image.height(), dst)
        .expect("eroded buffer matches source dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        GrayImage::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn horizontal_erosion_removes_short_runs() {
        let mask = from_rows(&[&[0, 255, 255, 0, 255, 255, 255, 255, 255, 0]]);
        let eroded = morph_line(&mask, 4, Axis::Horizontal, Morph::Erode);
        // The 2-pixel run vanishes; the 5-pixel run survives shrunk.
        let row: Vec<u8> = eroded.as_raw().clone();
        assert_eq!(row.iter().filter(|&&p| p == FOREGROUND).count(), 2);
        assert_eq!(&row[6..8], &[255, 255]);
    }

    #[test]
    fn erode_then_dilate_preserves_long_runs() {
        let mut row = vec![0u8; 64];
        for px in row.iter_mut().take(60).skip(4) {
            *px = 255;
        }
        let mask = from_rows(&[&row]);
        let opened = morph_line(
            &morph_line(&mask, 8, Axis::Horizontal, Morph::Erode),
            8,
            Axis::Horizontal,
            Morph::Dilate,
        );
        let restored: Vec<usize> = opened
            .as_raw()
            .iter()
            .enumerate()
            .filter(|(_, &p)| p == FOREGROUND)
            .map(|(i, _)| i)
            .collect();
        assert!(!restored.is_empty());
        assert!(*restored.first().unwrap() >= 3 && *restored.last().unwrap() <= 60);
        assert!(restored.len() >= 50);
    }

    #[test]
    fn vertical_kernel_removes_horizontal_strokes() {
        // 8 wide, 8 tall: one vertical line and one horizontal stroke.
        let mut rows = vec![vec![0u8; 8]; 8];
        for row in rows.iter_mut() {
            row[3] = 255;
        }
        for x in 0..8 {
            rows[5][x] = 255;
        }
        let refs: Vec<&[u8]> = rows.iter().map(|r| r.as_slice()).collect();
        let mask = from_rows(&refs);
        let eroded = morph_line(&mask, 6, Axis::Vertical, Morph::Erode);
        let dilated = morph_line(&eroded, 6, Axis::Vertical, Morph::Dilate);
        for y in 0..8 {
            for x in 0..8 {
                let expected = if x == 3 { FOREGROUND } else { 0 };
                assert_eq!(dilated.get_pixel(x, y).0[0], expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn combine_lines_leaves_rulings_black() {
        let vertical = from_rows(&[&[0, 255, 0], &[0, 255, 0], &[0, 255, 0]]);
        let horizontal = from_rows(&[&[0, 0, 0], &[255, 255, 255], &[0, 0, 0]]);
        let combined = combine_lines(&vertical, &horizontal, 0);
        // Ruling pixels end up below the threshold, background above it.
        assert_eq!(combined.get_pixel(1, 1).0[0], 0);
        assert_eq!(combined.get_pixel(0, 0).0[0], FOREGROUND);
    }
}
