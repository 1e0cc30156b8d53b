use std::io::Cursor;
use std::sync::Mutex;

use image::ImageOutputFormat;
use leptess::{LepTess, Variable};

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::request::{OcrRequest, SegmentationMode};
use crate::response::{OcrResponse, TextFragment};

// Cell crops carry no DPI metadata, so Tesseract is told to assume a
// scan-typical resolution instead of guessing.
const SOURCE_DPI: i32 = 300;

/// Tesseract-backed engine via the leptonica bindings.
///
/// The underlying handle is stateful and not thread safe, so calls are
/// serialized through a mutex.
pub struct TesseractOcrEngine {
    inner: Mutex<LepTess>,
}

impl TesseractOcrEngine {
    /// Creates an engine for the given language pack, `eng` by default.
    pub fn new(language: Option<&str>) -> Result<Self, OcrError> {
        let handle = LepTess::new(None, language.unwrap_or("eng"))
            .map_err(|err| OcrError::backend(err.to_string()))?;
        Ok(Self {
            inner: Mutex::new(handle),
        })
    }
}

fn page_seg_mode(mode: SegmentationMode) -> &'static str {
    match mode {
        SegmentationMode::SingleLine => "7",
        SegmentationMode::SparseText => "11",
    }
}

impl OcrEngine for TesseractOcrEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let mut png = Vec::new();
        request
            .image()
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(|err| OcrError::backend(err.to_string()))?;

        let mut handle = self
            .inner
            .lock()
            .map_err(|_| OcrError::backend("tesseract handle poisoned"))?;
        let options = request.options();
        handle
            .set_variable(Variable::TesseditCharWhitelist, &options.charset_whitelist)
            .map_err(|err| OcrError::backend(err.to_string()))?;
        handle
            .set_variable(
                Variable::TesseditPagesegMode,
                page_seg_mode(options.segmentation),
            )
            .map_err(|err| OcrError::backend(err.to_string()))?;
        handle
            .set_image_from_mem(&png)
            .map_err(|err| OcrError::backend(err.to_string()))?;
        handle.set_source_resolution(SOURCE_DPI);

        let text = handle
            .get_utf8_text()
            .map_err(|err| OcrError::backend(err.to_string()))?;
        if text.trim().is_empty() {
            return Ok(OcrResponse::empty());
        }
        let confidence = handle.mean_text_conf() as f32;
        Ok(OcrResponse::new(vec![
            TextFragment::new(text).with_confidence(confidence),
        ]))
    }
}
