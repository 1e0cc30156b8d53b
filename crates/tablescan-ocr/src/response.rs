/// One piece of recognized text.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    pub confidence: Option<f32>,
}

impl TextFragment {
    pub fn new(text: String) -> Self {
        Self {
            text,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, value: f32) -> Self {
        self.confidence = Some(value);
        self
    }
}

/// Everything a backend found in one cell crop.
#[derive(Debug, Clone)]
pub struct OcrResponse {
    pub fragments: Vec<TextFragment>,
}

impl OcrResponse {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    pub fn empty() -> Self {
        Self {
            fragments: Vec::new(),
        }
    }
}
