pub const DEFAULT_SLOPE_LIMIT: f32 = 0.5;
pub const DEFAULT_MAX_CELL_WIDTH: u32 = 1000;
pub const DEFAULT_MAX_CELL_HEIGHT: u32 = 500;

/// Tunables for the grid detector. Defaults match the values the pipeline
/// was calibrated with on engineering-drawing scans.
#[derive(Clone, Debug)]
pub struct GridDetectorConfig {
    /// Lower hysteresis threshold for the edge detector.
    pub canny_low: f32,
    /// Upper hysteresis threshold for the edge detector.
    pub canny_high: f32,
    /// Minimum accumulator votes for a line candidate.
    pub hough_vote_threshold: u32,
    /// Minimum segment length in pixels.
    pub hough_min_line_length: f32,
    /// Maximum gap in pixels bridged inside one segment.
    pub hough_max_line_gap: u32,
    /// Segments with |slope| at or above this are excluded from the skew
    /// estimate (filters near-vertical rulings).
    pub slope_limit: f32,
    /// Vertical structuring element length = image width / this divisor.
    pub vertical_kernel_divisor: u32,
    /// Horizontal structuring element length = image width / this divisor.
    pub horizontal_kernel_divisor: u32,
    /// Erode/dilate iterations for ruling-line isolation.
    pub line_iterations: u32,
    /// Erode iterations with the 2x2 element when combining line masks.
    pub combine_erode_iterations: u32,
    /// Boxes at or above this width are rejected as table border / noise.
    pub max_cell_width: u32,
    /// Boxes at or above this height are rejected as table border / noise.
    pub max_cell_height: u32,
}

impl Default for GridDetectorConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_vote_threshold: 100,
            hough_min_line_length: 100.0,
            hough_max_line_gap: 10,
            slope_limit: DEFAULT_SLOPE_LIMIT,
            vertical_kernel_divisor: 25,
            horizontal_kernel_divisor: 10,
            line_iterations: 3,
            combine_erode_iterations: 2,
            max_cell_width: DEFAULT_MAX_CELL_WIDTH,
            max_cell_height: DEFAULT_MAX_CELL_HEIGHT,
        }
    }
}
