pub mod assemble;

mod config;
mod contours;
mod detect;
mod error;
mod lines;
mod raster;
mod skew;

pub use assemble::assemble;
pub use config::GridDetectorConfig;
pub use detect::{crop_roi, GridDetection, GridDetector};
pub use error::GridError;
