use std::path::PathBuf;

use image::{GrayImage, Luma};
use tablescan::cli::OcrBackend;
use tablescan::pipeline::{run_pipeline, PipelineConfig, PipelineError};
use tablescan_detector::{GridDetectorConfig, GridError};
use tablescan_ocr::RecognitionOptions;
use tablescan_types::SelectionRect;

const INK: u8 = 0;
const PAPER: u8 = 255;

/// 1200x620 page with a 2x3 table inset from the border.
fn grid_page() -> GrayImage {
    let mut image = GrayImage::from_pixel(1200, 620, Luma([PAPER]));
    for y in [40u32, 305, 570] {
        for dy in 0..3 {
            for x in 40..1163 {
                image.put_pixel(x, y + dy, Luma([INK]));
            }
        }
    }
    for x in [40u32, 405, 800, 1160] {
        for dx in 0..3 {
            for y in 40..573 {
                image.put_pixel(x + dx, y, Luma([INK]));
            }
        }
    }
    image
}

fn page_on_disk(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("page.png");
    grid_page().save(&path).unwrap();
    path
}

fn noop_config(input: PathBuf) -> PipelineConfig {
    PipelineConfig {
        input,
        roi: None,
        marker: "PART".to_string(),
        backend: OcrBackend::Noop,
        language: None,
        options: RecognitionOptions::default(),
        detector: GridDetectorConfig::default(),
    }
}

#[tokio::test]
async fn whole_page_scan_yields_a_rectangular_empty_grid() {
    let dir = tempfile::tempdir().unwrap();
    let config = noop_config(page_on_disk(&dir));
    let output = run_pipeline(config, None).await.unwrap();
    assert_eq!(output.cells.len(), 2);
    for row in &output.cells {
        assert_eq!(row.len(), 3);
        for cell in row {
            assert!(cell.is_empty_cell());
        }
    }
    assert!(output.attributes.is_empty());
    assert_eq!(output.line_free.dimensions(), (1200, 620));
}

#[tokio::test]
async fn roi_selects_a_sub_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = noop_config(page_on_disk(&dir));
    // Right-to-left drag over the full page.
    config.roi = Some(SelectionRect::new(1200, 620, -1200, -620));
    let output = run_pipeline(config, None).await.unwrap();
    assert_eq!(output.cells.len(), 2);
    assert_eq!(output.cells[0].len(), 3);
}

#[tokio::test]
async fn out_of_bounds_roi_fails_instead_of_clamping() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = noop_config(page_on_disk(&dir));
    config.roi = Some(SelectionRect::new(1100, 500, 300, 300));
    let err = run_pipeline(config, None).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Grid(GridError::CropOutOfBounds { .. })
    ));
}

#[tokio::test]
async fn missing_input_reports_a_load_error() {
    let config = noop_config(PathBuf::from("/nonexistent/page.png"));
    let err = run_pipeline(config, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Load { .. }));
}
