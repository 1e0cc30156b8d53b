//! Small-rotation skew estimation and correction.
//!
//! Scanned drawings arrive slightly rotated. The estimate averages the
//! slope of long straight segments (Canny edge map, accumulator Hough with
//! a peak walk that honors min length / max gap), excluding near-vertical
//! rulings via the slope limit, and the image is rotated back about its
//! center. Estimation returns `None` on degenerate input so the caller can
//! take the no-op path explicitly.

use image::GrayImage;

use crate::config::GridDetectorConfig;
use crate::raster::FOREGROUND;

const THETA_STEPS: usize = 180;
const WALK_TOLERANCE: i32 = 1;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    fn length(&self) -> f32 {
        let dx = (self.x2 - self.x1) as f32;
        let dy = (self.y2 - self.y1) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Average-slope rotation estimate in radians, or `None` when the image
/// has no qualifying straight segments (blank or degenerate input).
pub(crate) fn estimate_rotation(image: &GrayImage, config: &GridDetectorConfig) -> Option<f32> {
    let edges = canny(image, config.canny_low, config.canny_high);
    let segments = hough_segments(&edges, config);
    let mut slope_sum = 0f32;
    let mut count = 0usize;
    for segment in &segments {
        let run = segment.x2 - segment.x1;
        if run == 0 {
            continue;
        }
        let slope = (segment.y2 - segment.y1) as f32 / run as f32;
        if slope.abs() < config.slope_limit {
            slope_sum += slope;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some((slope_sum / count as f32).atan())
}

/// Rotates about the image center with bilinear sampling. Out-of-range
/// samples are filled with white, the paper background.
pub(crate) fn rotate_about_center(image: &GrayImage, angle: f32) -> GrayImage {
    if angle == 0.0 {
        return image.clone();
    }
    let (width, height) = (image.width(), image.height());
    let (cx, cy) = ((width as f32 - 1.0) / 2.0, (height as f32 - 1.0) / 2.0);
    let (sin, cos) = angle.sin_cos();
    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let sx = cx + dx * cos - dy * sin;
            let sy = cy + dx * sin + dy * cos;
            output.put_pixel(x, y, image::Luma([sample_bilinear(image, sx, sy)]));
        }
    }
    output
}

fn sample_bilinear(image: &GrayImage, x: f32, y: f32) -> u8 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let fetch = |ix: f32, iy: f32| -> f32 {
        if ix < 0.0 || iy < 0.0 || ix >= image.width() as f32 || iy >= image.height() as f32 {
            255.0
        } else {
            image.get_pixel(ix as u32, iy as u32).0[0] as f32
        }
    };
    let top = fetch(x0, y0) * (1.0 - fx) + fetch(x0 + 1.0, y0) * fx;
    let bottom = fetch(x0, y0 + 1.0) * (1.0 - fx) + fetch(x0 + 1.0, y0 + 1.0) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

/// Canny edge detector: Sobel gradients, L1 magnitude, non-maximum
/// suppression over four quantized directions, hysteresis thresholding.
pub(crate) fn canny(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if width < 3 || height < 3 {
        return GrayImage::new(image.width(), image.height());
    }
    let src = image.as_raw();
    let mut gx = vec![0i32; width * height];
    let mut gy = vec![0i32; width * height];
    let mut magnitude = vec![0f32; width * height];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let p = |dx: isize, dy: isize| -> i32 {
                src[(y as isize + dy) as usize * width + (x as isize + dx) as usize] as i32
            };
            let sx = -p(-1, -1) + p(1, -1) - 2 * p(-1, 0) + 2 * p(1, 0) - p(-1, 1) + p(1, 1);
            let sy = -p(-1, -1) - 2 * p(0, -1) - p(1, -1) + p(-1, 1) + 2 * p(0, 1) + p(1, 1);
            gx[idx] = sx;
            gy[idx] = sy;
            magnitude[idx] = (sx.abs() + sy.abs()) as f32;
        }
    }

    // Non-maximum suppression: compare along the quantized gradient
    // direction.
    let mut thinned = vec![0f32; width * height];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let mag = magnitude[idx];
            if mag < low {
                continue;
            }
            let (dx, dy) = gradient_direction(gx[idx], gy[idx]);
            let ahead = magnitude[(y as isize + dy) as usize * width + (x as isize + dx) as usize];
            let behind = magnitude[(y as isize - dy) as usize * width + (x as isize - dx) as usize];
            if mag >= ahead && mag >= behind {
                thinned[idx] = mag;
            }
        }
    }

    // Hysteresis: strong edges seed a flood over connected weak edges.
    let mut edges = vec![0u8; width * height];
    let mut stack = Vec::new();
    for idx in 0..width * height {
        if thinned[idx] >= high && edges[idx] == 0 {
            edges[idx] = FOREGROUND;
            stack.push(idx);
            while let Some(current) = stack.pop() {
                let cy = current / width;
                let cx = current % width;
                for ny in cy.saturating_sub(1)..=(cy + 1).min(height - 1) {
                    for nx in cx.saturating_sub(1)..=(cx + 1).min(width - 1) {
                        let nidx = ny * width + nx;
                        if edges[nidx] == 0 && thinned[nidx] >= low {
                            edges[nidx] = FOREGROUND;
                            stack.push(nidx);
                        }
                    }
                }
            }
        }
    }
    GrayImage::from_raw(image.width(), image.height(), edges)
        .expect("edge buffer matches source dimensions")
}

/// Quantizes the gradient into one of four directions and returns the
/// neighbor offset along it.
fn gradient_direction(gx: i32, gy: i32) -> (isize, isize) {
    let angle = (gy as f32).atan2(gx as f32).to_degrees();
    let angle = if angle < 0.0 { angle + 180.0 } else { angle };
    if !(22.5..157.5).contains(&angle) {
        (1, 0)
    } else if angle < 67.5 {
        (1, 1)
    } else if angle < 112.5 {
        (0, 1)
    } else {
        (-1, 1)
    }
}

/// Deterministic line-segment extraction: a standard Hough accumulator
/// picks line candidates, then each candidate line is walked across the
/// edge map collecting runs that satisfy the max-gap and min-length
/// constraints. Segment endpoints come from the actual edge pixels, so
/// slopes are not limited to the accumulator's angular resolution.
pub(crate) fn hough_segments(edges: &GrayImage, config: &GridDetectorConfig) -> Vec<Segment> {
    let (width, height) = (edges.width() as i32, edges.height() as i32);
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let rho_max = ((width * width + height * height) as f32).sqrt().ceil() as i32;
    let rho_span = (2 * rho_max + 1) as usize;
    let tables: Vec<(f32, f32)> = (0..THETA_STEPS)
        .map(|t| {
            let theta = t as f32 * std::f32::consts::PI / THETA_STEPS as f32;
            theta.sin_cos()
        })
        .collect();

    let mut accumulator = vec![0u32; THETA_STEPS * rho_span];
    let raw = edges.as_raw();
    for y in 0..height {
        for x in 0..width {
            if raw[(y * width + x) as usize] != FOREGROUND {
                continue;
            }
            for (t, &(sin, cos)) in tables.iter().enumerate() {
                let rho = x as f32 * cos + y as f32 * sin;
                let idx = (rho.round() as i32 + rho_max) as usize;
                accumulator[t * rho_span + idx] += 1;
            }
        }
    }

    let mut segments = Vec::new();
    for t in 0..THETA_STEPS {
        for r in 0..rho_span {
            let votes = accumulator[t * rho_span + r];
            if votes < config.hough_vote_threshold {
                continue;
            }
            if !is_local_peak(&accumulator, rho_span, t, r, votes) {
                continue;
            }
            let (sin, cos) = tables[t];
            let rho = (r as i32 - rho_max) as f32;
            walk_line(edges, sin, cos, rho, config, &mut segments);
        }
    }
    segments
}

fn is_local_peak(accumulator: &[u32], rho_span: usize, t: usize, r: usize, votes: u32) -> bool {
    for dt in -1i32..=1 {
        for dr in -1i32..=1 {
            if dt == 0 && dr == 0 {
                continue;
            }
            let nt = t as i32 + dt;
            let nr = r as i32 + dr;
            if nt < 0 || nr < 0 || nt >= THETA_STEPS as i32 || nr >= rho_span as i32 {
                continue;
            }
            let neighbor = accumulator[nt as usize * rho_span + nr as usize];
            if neighbor > votes {
                return false;
            }
        }
    }
    true
}

/// Walks along the line `x cos + y sin = rho`, collecting edge-pixel runs
/// into segments. The major axis is chosen by line orientation.
fn walk_line(
    edges: &GrayImage,
    sin: f32,
    cos: f32,
    rho: f32,
    config: &GridDetectorConfig,
    segments: &mut Vec<Segment>,
) {
    let (width, height) = (edges.width() as i32, edges.height() as i32);
    let raw = edges.as_raw();
    let hit_near = |x: i32, y: i32, vertical_probe: bool| -> Option<(i32, i32)> {
        for offset in 0..=WALK_TOLERANCE {
            for signed in [offset, -offset] {
                let (px, py) = if vertical_probe {
                    (x, y + signed)
                } else {
                    (x + signed, y)
                };
                if px >= 0 && py >= 0 && px < width && py < height {
                    if raw[(py * width + px) as usize] == FOREGROUND {
                        return Some((px, py));
                    }
                }
            }
        }
        None
    };

    let mut open: Option<(Segment, i32)> = None;
    let horizontal_walk = sin.abs() >= cos.abs();
    let steps = if horizontal_walk { width } else { height };
    for step in 0..steps {
        let hit = if horizontal_walk {
            let y = ((rho - step as f32 * cos) / sin).round() as i32;
            hit_near(step, y, true)
        } else {
            let x = ((rho - step as f32 * sin) / cos).round() as i32;
            hit_near(x, step, false)
        };
        match (hit, &mut open) {
            (Some((px, py)), Some((segment, last_step))) => {
                if step - *last_step - 1 > config.hough_max_line_gap as i32 {
                    close_segment(*segment, config, segments);
                    *segment = Segment {
                        x1: px,
                        y1: py,
                        x2: px,
                        y2: py,
                    };
                } else {
                    segment.x2 = px;
                    segment.y2 = py;
                }
                *last_step = step;
            }
            (Some((px, py)), None) => {
                open = Some((
                    Segment {
                        x1: px,
                        y1: py,
                        x2: px,
                        y2: py,
                    },
                    step,
                ));
            }
            (None, _) => {}
        }
    }
    if let Some((segment, _)) = open {
        close_segment(segment, config, segments);
    }
}

fn close_segment(segment: Segment, config: &GridDetectorConfig, segments: &mut Vec<Segment>) {
    if segment.length() >= config.hough_min_line_length {
        segments.push(segment);
    }
}
