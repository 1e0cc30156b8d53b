//! Per-cell recognition over an assembled grid.

use std::sync::Arc;

use image::{imageops, GrayImage};
use tablescan_types::{BoundingBox, CellGrid, CellResult};

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::request::{OcrRequest, RecognitionOptions};
use crate::response::OcrResponse;

/// Receives the overall completion percentage after each finished row.
pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Runs `engine` over every cell of `grid`, cropping from the line-free
/// image so rulings never reach the recognizer.
///
/// Empty slots become empty results without touching the engine. A slot
/// holding several boxes is recognized box by box and keeps the last
/// result, matching how repeated writes into the same cell behave. A
/// recognition pass that yields no usable text maps to the empty-cell
/// sentinel rather than an error; errors are reserved for backend
/// failures and malformed input.
pub fn recognize_cells(
    engine: &dyn OcrEngine,
    line_free: &GrayImage,
    grid: &CellGrid,
    options: &RecognitionOptions,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<Vec<CellResult>>, OcrError> {
    let row_count = grid.row_count();
    let column_count = grid.column_count();
    let mut results = Vec::with_capacity(row_count);
    for (row_index, row) in grid.rows().iter().enumerate() {
        if row.len() != column_count {
            return Err(OcrError::Structure {
                row: row_index,
                got: row.len(),
                expected: column_count,
            });
        }
        let mut cells = Vec::with_capacity(column_count);
        for slot in row {
            let mut cell = CellResult::empty();
            for bbox in slot {
                let crop = crop_cell(line_free, bbox)?;
                let request = OcrRequest::new(&crop, options);
                let response = engine.recognize(&request)?;
                cell = collapse_fragments(&response);
            }
            cells.push(cell);
        }
        results.push(cells);
        if let Some(report) = progress {
            report(((row_index + 1) * 100 / row_count) as u64);
        }
    }
    Ok(results)
}

fn crop_cell(image: &GrayImage, bbox: &BoundingBox) -> Result<GrayImage, OcrError> {
    if bbox.right() > image.width() || bbox.bottom() > image.height() {
        return Err(OcrError::CellOutOfBounds {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
            image_width: image.width(),
            image_height: image.height(),
        });
    }
    Ok(imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image())
}

/// Joins every scored, non-blank fragment with single spaces and averages
/// their confidences. No usable fragment means an empty cell.
fn collapse_fragments(response: &OcrResponse) -> CellResult {
    let mut texts = Vec::new();
    let mut total = 0.0f32;
    for fragment in &response.fragments {
        let trimmed = fragment.text.trim();
        let confidence = match fragment.confidence {
            Some(value) => value,
            None => continue,
        };
        if trimmed.is_empty() {
            continue;
        }
        texts.push(trimmed.to_string());
        total += confidence;
    }
    if texts.is_empty() {
        return CellResult::empty();
    }
    let confidence = total / texts.len() as f32;
    CellResult {
        text: texts.join(" "),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::response::TextFragment;
    use tablescan_types::EMPTY_CELL_CONFIDENCE;

    /// Replays a scripted list of responses in call order.
    struct ScriptedEngine {
        responses: Mutex<VecDeque<OcrResponse>>,
    }

    impl ScriptedEngine {
        fn new(responses: Vec<OcrResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn recognize(&self, _: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(OcrResponse::empty))
        }
    }

    fn fragment(text: &str, confidence: f32) -> OcrResponse {
        OcrResponse::new(vec![TextFragment::new(text.to_string()).with_confidence(confidence)])
    }

    fn bbox(x: u32, y: u32) -> BoundingBox {
        BoundingBox::new(x, y, 10, 10)
    }

    fn single_slot_grid(slots: Vec<Vec<BoundingBox>>) -> CellGrid {
        CellGrid::new(vec![slots]).unwrap()
    }

    #[test]
    fn empty_slot_skips_the_engine_and_yields_sentinel() {
        let grid = CellGrid::new(vec![vec![vec![bbox(0, 0)], Vec::new()]]).unwrap();
        let engine = ScriptedEngine::new(vec![fragment("A1", 90.0)]);
        let image = GrayImage::new(40, 40);
        let options = RecognitionOptions::default();
        let results = recognize_cells(&engine, &image, &grid, &options, None).unwrap();
        assert_eq!(results[0][0].text, "A1");
        assert_eq!(results[0][0].confidence, 90.0);
        assert_eq!(results[0][1].text, "");
        assert_eq!(results[0][1].confidence, EMPTY_CELL_CONFIDENCE);
        assert!(engine.responses.lock().unwrap().is_empty());
    }

    #[test]
    fn blank_recognition_maps_to_sentinel_not_error() {
        let grid = single_slot_grid(vec![vec![bbox(0, 0)]]);
        let engine = ScriptedEngine::new(vec![OcrResponse::new(vec![
            TextFragment::new("   ".to_string()).with_confidence(15.0),
            TextFragment::new("ghost".to_string()),
        ])]);
        let image = GrayImage::new(40, 40);
        let options = RecognitionOptions::default();
        let results = recognize_cells(&engine, &image, &grid, &options, None).unwrap();
        assert!(results[0][0].is_empty_cell());
    }

    #[test]
    fn multiple_fragments_join_with_mean_confidence() {
        let grid = single_slot_grid(vec![vec![bbox(0, 0)]]);
        let engine = ScriptedEngine::new(vec![OcrResponse::new(vec![
            TextFragment::new(" M8 ".to_string()).with_confidence(80.0),
            TextFragment::new("x20".to_string()).with_confidence(60.0),
        ])]);
        let image = GrayImage::new(40, 40);
        let options = RecognitionOptions::default();
        let results = recognize_cells(&engine, &image, &grid, &options, None).unwrap();
        assert_eq!(results[0][0].text, "M8 x20");
        assert_eq!(results[0][0].confidence, 70.0);
    }

    #[test]
    fn later_box_in_a_slot_overwrites_earlier_text() {
        let grid = single_slot_grid(vec![vec![bbox(0, 0), bbox(12, 0)]]);
        let engine =
            ScriptedEngine::new(vec![fragment("first", 50.0), fragment("second", 60.0)]);
        let image = GrayImage::new(40, 40);
        let options = RecognitionOptions::default();
        let results = recognize_cells(&engine, &image, &grid, &options, None).unwrap();
        assert_eq!(results[0][0].text, "second");
    }

    #[test]
    fn progress_reports_rise_to_one_hundred() {
        let rows = vec![
            vec![vec![bbox(0, 0)]],
            vec![vec![bbox(0, 12)]],
            vec![vec![bbox(0, 24)]],
        ];
        let grid = CellGrid::new(rows).unwrap();
        let engine = ScriptedEngine::new(Vec::new());
        let image = GrayImage::new(40, 40);
        let options = RecognitionOptions::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |value| sink.lock().unwrap().push(value));
        recognize_cells(&engine, &image, &grid, &options, Some(&callback)).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![33, 66, 100]);
    }

    #[test]
    fn cell_outside_the_image_is_rejected() {
        let grid = single_slot_grid(vec![vec![BoundingBox::new(35, 0, 10, 10)]]);
        let engine = ScriptedEngine::new(Vec::new());
        let image = GrayImage::new(40, 40);
        let options = RecognitionOptions::default();
        let err = recognize_cells(&engine, &image, &grid, &options, None).unwrap_err();
        assert!(matches!(err, OcrError::CellOutOfBounds { .. }));
    }
}
