use crate::error::OcrError;
use crate::request::OcrRequest;
use crate::response::OcrResponse;

/// Text recognizer applied one table cell at a time.
///
/// Each [`OcrRequest`] carries the cell crop from the line-free page
/// together with the charset whitelist and segmentation mode to use.
/// `warm_up` runs once before the first cell, so backends that load
/// language data can fail there instead of mid-table.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn warm_up(&self) -> Result<(), OcrError> {
        Ok(())
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError>;
}

/// Backend that reads nothing: every cell comes back as an empty
/// response, which the runner records with the empty-cell sentinel.
/// Stands in when no recognizer backend is compiled in or usable.
#[derive(Debug, Default)]
pub struct NoopOcrEngine;

impl OcrEngine for NoopOcrEngine {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn recognize(&self, _: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        Ok(OcrResponse::empty())
    }
}
