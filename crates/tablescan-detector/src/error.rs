use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("input image has zero width or height")]
    EmptyInput,
    #[error("selection rectangle has zero area after normalization")]
    EmptySelection,
    #[error(
        "selection at ({x}, {y}) sized {width}x{height} lies outside the {image_width}x{image_height} image"
    )]
    CropOutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        image_width: u32,
        image_height: u32,
    },
}
