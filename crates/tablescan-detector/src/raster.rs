use image::GrayImage;

pub(crate) const FOREGROUND: u8 = 255;

/// Otsu's threshold level: maximizes between-class variance over the
/// intensity histogram. Degenerate (single-intensity) images yield 0.
pub(crate) fn otsu_level(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for &px in image.as_raw() {
        histogram[px as usize] += 1;
    }
    let total = image.as_raw().len() as f64;
    if total == 0.0 {
        return 0;
    }
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut weight_low = 0f64;
    let mut sum_low = 0f64;
    let mut best_level = 0u8;
    let mut best_variance = 0f64;
    for level in 0..256usize {
        weight_low += histogram[level] as f64;
        if weight_low == 0.0 {
            continue;
        }
        let weight_high = total - weight_low;
        if weight_high == 0.0 {
            break;
        }
        sum_low += level as f64 * histogram[level] as f64;
        let mean_low = sum_low / weight_low;
        let mean_high = (sum_all - sum_low) / weight_high;
        let variance = weight_low * weight_high * (mean_low - mean_high) * (mean_low - mean_high);
        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }
    best_level
}

/// Binary threshold: pixels above `level` become foreground.
pub(crate) fn threshold_binary(image: &GrayImage, level: u8) -> GrayImage {
    map_pixels(image, |px| if px > level { FOREGROUND } else { 0 })
}

/// Otsu threshold followed by inversion, so dark strokes (text and
/// rulings) become foreground.
pub(crate) fn binarize_inverted(image: &GrayImage) -> GrayImage {
    let level = otsu_level(image);
    map_pixels(image, |px| if px <= level { FOREGROUND } else { 0 })
}

pub(crate) fn invert(image: &GrayImage) -> GrayImage {
    map_pixels(image, |px| 255 - px)
}

/// Average blend with equal weights.
pub(crate) fn blend_half(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine_pixels(a, b, |pa, pb| ((pa as u16 + pb as u16) / 2) as u8)
}

pub(crate) fn bitwise_xor(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine_pixels(a, b, |pa, pb| pa ^ pb)
}

fn map_pixels(image: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let data = image.as_raw().iter().map(|&px| f(px)).collect();
    GrayImage::from_raw(image.width(), image.height(), data)
        .expect("mapped buffer matches source dimensions")
}

fn combine_pixels(a: &GrayImage, b: &GrayImage, f: impl Fn(u8, u8) -> u8) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let data = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&pa, &pb)| f(pa, pb))
        .collect();
    GrayImage::from_raw(a.width(), a.height(), data)
        .expect("combined buffer matches source dimensions")
}
