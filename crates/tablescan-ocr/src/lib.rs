mod backends;
mod engine;
mod error;
mod request;
mod response;
mod runner;

#[cfg(feature = "engine-tesseract")]
pub use backends::tesseract::TesseractOcrEngine;
pub use engine::{NoopOcrEngine, OcrEngine};
pub use error::OcrError;
pub use request::{OcrRequest, RecognitionOptions, SegmentationMode, DEFAULT_CHARSET};
pub use response::{OcrResponse, TextFragment};
pub use runner::{recognize_cells, ProgressCallback};
