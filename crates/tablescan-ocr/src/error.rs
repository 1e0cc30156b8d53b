use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("backend error: {message}")]
    Backend { message: String },
    #[error("row {row} has {got} column slots, grid declares {expected}")]
    Structure { row: usize, got: usize, expected: usize },
    #[error(
        "cell box {x},{y} {width}x{height} reaches outside the {image_width}x{image_height} image"
    )]
    CellOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

impl OcrError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
