use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tablescan_detector::GridDetectorConfig;
use thiserror::Error;

use crate::cli::{CliArgs, CliSources, OcrBackend};

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    ocr_backend: Option<String>,
    ocr_language: Option<String>,
    marker: Option<String>,
    charset: Option<String>,
    sparse_text: Option<bool>,
    detector: Option<DetectorFileConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetectorFileConfig {
    canny_low: Option<f32>,
    canny_high: Option<f32>,
    hough_vote_threshold: Option<u32>,
    hough_min_line_length: Option<f32>,
    hough_max_line_gap: Option<u32>,
    slope_limit: Option<f32>,
    vertical_kernel_divisor: Option<u32>,
    horizontal_kernel_divisor: Option<u32>,
    line_iterations: Option<u32>,
    combine_erode_iterations: Option<u32>,
    max_cell_width: Option<u32>,
    max_cell_height: Option<u32>,
}

impl DetectorFileConfig {
    fn apply(&self, config: &mut GridDetectorConfig) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(value) = self.$field {
                    config.$field = value;
                }
            };
        }
        set!(canny_low);
        set!(canny_high);
        set!(hough_vote_threshold);
        set!(hough_min_line_length);
        set!(hough_max_line_gap);
        set!(slope_limit);
        set!(vertical_kernel_divisor);
        set!(horizontal_kernel_divisor);
        set!(line_iterations);
        set!(combine_erode_iterations);
        set!(max_cell_width);
        set!(max_cell_height);
    }
}

/// Options after merging the command line over the config file.
#[derive(Debug)]
pub struct EffectiveSettings {
    pub input: PathBuf,
    pub roi: Option<tablescan_types::SelectionRect>,
    pub output: Option<PathBuf>,
    pub line_free: Option<PathBuf>,
    pub marker: String,
    pub ocr_backend: OcrBackend,
    pub ocr_language: Option<String>,
    pub charset: Option<String>,
    pub sparse_text: bool,
    pub detector: GridDetectorConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for '{field}'")]
    InvalidValue { field: &'static str, value: String },
    #[error("config file {path} does not exist")]
    NotFound { path: PathBuf },
}

pub fn resolve_settings(cli: &CliArgs, sources: &CliSources) -> Result<EffectiveSettings, ConfigError> {
    let file = load_config(cli.config.as_deref())?;
    merge(cli, sources, file)
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path_override: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = path_override {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return read_config(path);
    }
    let Some(default_path) = default_config_path() else {
        return Ok(FileConfig::default());
    };
    if !default_path.exists() {
        return Ok(FileConfig::default());
    }
    read_config(&default_path)
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tablescan").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn parse_backend(value: &str) -> Result<OcrBackend, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(OcrBackend::Auto),
        "tesseract" => Ok(OcrBackend::Tesseract),
        "noop" => Ok(OcrBackend::Noop),
        other => Err(ConfigError::InvalidValue {
            field: "ocr_backend",
            value: other.to_string(),
        }),
    }
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
) -> Result<EffectiveSettings, ConfigError> {
    let mut ocr_backend = cli.ocr_backend;
    if !sources.ocr_backend_from_cli {
        if let Some(value) = file.ocr_backend.as_deref() {
            ocr_backend = parse_backend(value)?;
        }
    }

    let mut marker = cli.marker.clone();
    if !sources.marker_from_cli {
        if let Some(value) = file.marker.filter(|value| !value.trim().is_empty()) {
            marker = value;
        }
    }

    let mut charset = cli.charset.clone();
    if !sources.charset_from_cli && charset.is_none() {
        charset = file.charset.filter(|value| !value.is_empty());
    }

    let mut sparse_text = cli.sparse_text;
    if !sources.sparse_text_from_cli {
        if let Some(value) = file.sparse_text {
            sparse_text = value;
        }
    }

    let mut ocr_language = cli.ocr_language.clone();
    if !sources.language_from_cli && ocr_language.is_none() {
        ocr_language = file.ocr_language.filter(|value| !value.trim().is_empty());
    }

    let mut detector = GridDetectorConfig::default();
    if let Some(tunables) = file.detector.as_ref() {
        tunables.apply(&mut detector);
    }

    Ok(EffectiveSettings {
        input: cli.input.clone(),
        roi: cli.roi,
        output: cli.output.clone(),
        line_free: cli.line_free.clone(),
        marker,
        ocr_backend,
        ocr_language,
        charset,
        sparse_text,
        detector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> CliArgs {
        CliArgs {
            input: PathBuf::from("scan.png"),
            roi: None,
            output: None,
            line_free: None,
            marker: "PART".to_string(),
            config: None,
            ocr_backend: OcrBackend::Auto,
            ocr_language: None,
            charset: None,
            sparse_text: false,
        }
    }

    #[test]
    fn file_values_fill_unset_options() {
        let file = FileConfig {
            ocr_backend: Some("noop".to_string()),
            marker: Some("ITEM".to_string()),
            sparse_text: Some(true),
            ..FileConfig::default()
        };
        let settings = merge(&base_cli(), &CliSources::default(), file).unwrap();
        assert_eq!(settings.ocr_backend, OcrBackend::Noop);
        assert_eq!(settings.marker, "ITEM");
        assert!(settings.sparse_text);
    }

    #[test]
    fn cli_values_win_over_file_values() {
        let mut cli = base_cli();
        cli.marker = "POS".to_string();
        let sources = CliSources {
            marker_from_cli: true,
            ..CliSources::default()
        };
        let file = FileConfig {
            marker: Some("ITEM".to_string()),
            ..FileConfig::default()
        };
        let settings = merge(&cli, &sources, file).unwrap();
        assert_eq!(settings.marker, "POS");
    }

    #[test]
    fn unknown_backend_name_is_rejected() {
        let file = FileConfig {
            ocr_backend: Some("cloud".to_string()),
            ..FileConfig::default()
        };
        let err = merge(&base_cli(), &CliSources::default(), file).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let err = load_config(Some(Path::new("/nonexistent/tablescan.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn detector_section_overrides_selected_tunables() {
        let file: FileConfig = toml::from_str(
            "[detector]\nhough_vote_threshold = 80\nmax_cell_width = 1500\n",
        )
        .unwrap();
        let settings = merge(&base_cli(), &CliSources::default(), file).unwrap();
        assert_eq!(settings.detector.hough_vote_threshold, 80);
        assert_eq!(settings.detector.max_cell_width, 1500);
        // Untouched fields keep their defaults.
        assert_eq!(settings.detector.vertical_kernel_divisor, 25);
    }

    #[test]
    fn config_file_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "ocr_backend = \"tesseract\"\nmarker = \"ITEM\"\n").unwrap();
        let file = load_config(Some(&path)).unwrap();
        assert_eq!(file.ocr_backend.as_deref(), Some("tesseract"));
        assert_eq!(file.marker.as_deref(), Some("ITEM"));
    }
}
