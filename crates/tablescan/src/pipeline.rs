use std::path::PathBuf;

use image::GrayImage;
use thiserror::Error;
use tokio::task;

use crate::attributes::extract_attributes;
use crate::cli::OcrBackend;
use crate::settings::EffectiveSettings;
use tablescan_detector::{assemble, crop_roi, GridDetector, GridDetectorConfig, GridError};
use tablescan_ocr::{
    recognize_cells, NoopOcrEngine, OcrEngine, OcrError, ProgressCallback, RecognitionOptions,
    SegmentationMode,
};
use tablescan_types::{CellResult, SelectionRect, TableStructureError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Structure(#[from] TableStructureError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error("ocr backend '{name}' is not available in this build")]
    BackendUnavailable { name: &'static str },
    #[error("pipeline task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Everything the blocking stage needs, detached from the CLI types.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub roi: Option<SelectionRect>,
    pub marker: String,
    pub backend: OcrBackend,
    pub language: Option<String>,
    pub options: RecognitionOptions,
    pub detector: GridDetectorConfig,
}

impl PipelineConfig {
    pub fn from_settings(settings: &EffectiveSettings) -> Self {
        let mut options = RecognitionOptions::default();
        if let Some(charset) = settings.charset.clone() {
            options.charset_whitelist = charset;
        }
        if settings.sparse_text {
            options.segmentation = SegmentationMode::SparseText;
        }
        Self {
            input: settings.input.clone(),
            roi: settings.roi,
            marker: settings.marker.clone(),
            backend: settings.ocr_backend,
            language: settings.ocr_language.clone(),
            options,
            detector: settings.detector.clone(),
        }
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub cells: Vec<Vec<CellResult>>,
    pub attributes: Vec<String>,
    pub line_free: GrayImage,
}

/// Runs the whole extraction off the async runtime. The work is pure
/// CPU, so it lives on the blocking pool and reports progress through
/// the callback.
pub async fn run_pipeline(
    config: PipelineConfig,
    progress: Option<ProgressCallback>,
) -> Result<PipelineOutput, PipelineError> {
    task::spawn_blocking(move || run_blocking(config, progress)).await?
}

fn run_blocking(
    config: PipelineConfig,
    progress: Option<ProgressCallback>,
) -> Result<PipelineOutput, PipelineError> {
    let page = image::open(&config.input)
        .map_err(|source| PipelineError::Load {
            path: config.input.clone(),
            source,
        })?
        .to_luma8();
    let region = match config.roi {
        Some(selection) => crop_roi(&page, selection)?,
        None => page,
    };

    let detector = GridDetector::new(config.detector.clone());
    let detection = detector.detect(&region)?;
    let grid = assemble(&detection.boxes)?;

    let engine = build_engine(config.backend, config.language.as_deref())?;
    engine.warm_up()?;
    let cells = recognize_cells(
        engine.as_ref(),
        &detection.line_free,
        &grid,
        &config.options,
        progress.as_ref(),
    )?;
    let attributes = extract_attributes(&cells, &config.marker);

    Ok(PipelineOutput {
        cells,
        attributes,
        line_free: detection.line_free,
    })
}

fn build_engine(
    backend: OcrBackend,
    language: Option<&str>,
) -> Result<Box<dyn OcrEngine>, PipelineError> {
    match backend {
        OcrBackend::Noop => Ok(Box::new(NoopOcrEngine)),
        OcrBackend::Tesseract => {
            #[cfg(feature = "ocr-tesseract")]
            {
                let engine = tablescan_ocr::TesseractOcrEngine::new(language)?;
                Ok(Box::new(engine))
            }
            #[cfg(not(feature = "ocr-tesseract"))]
            {
                let _ = language;
                Err(PipelineError::BackendUnavailable { name: "tesseract" })
            }
        }
        OcrBackend::Auto => {
            #[cfg(feature = "ocr-tesseract")]
            match tablescan_ocr::TesseractOcrEngine::new(language) {
                Ok(engine) => return Ok(Box::new(engine)),
                Err(err) => {
                    eprintln!("tesseract unavailable ({err}); continuing with noop OCR");
                }
            }
            #[cfg(not(feature = "ocr-tesseract"))]
            let _ = language;
            Ok(Box::new(NoopOcrEngine))
        }
    }
}
