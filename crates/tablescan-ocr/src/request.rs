use image::GrayImage;

/// Characters that can legitimately appear in a drawing table cell:
/// part numbers, dimensions, fractions, and short free-text remarks.
pub const DEFAULT_CHARSET: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz.-/ '";

/// Page-layout hint passed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    /// Treat the crop as one line of text.
    SingleLine,
    /// Find text wherever it sits, in no particular order.
    SparseText,
}

/// Recognition tuning shared by every cell of one pass.
#[derive(Debug, Clone)]
pub struct RecognitionOptions {
    pub charset_whitelist: String,
    pub segmentation: SegmentationMode,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            charset_whitelist: DEFAULT_CHARSET.to_string(),
            segmentation: SegmentationMode::SingleLine,
        }
    }
}

/// OCR invocation metadata.
#[derive(Debug)]
pub struct OcrRequest<'a> {
    image: &'a GrayImage,
    options: &'a RecognitionOptions,
}

impl<'a> OcrRequest<'a> {
    pub fn new(image: &'a GrayImage, options: &'a RecognitionOptions) -> Self {
        Self { image, options }
    }

    pub fn image(&self) -> &'a GrayImage {
        self.image
    }

    pub fn options(&self) -> &'a RecognitionOptions {
        self.options
    }
}
