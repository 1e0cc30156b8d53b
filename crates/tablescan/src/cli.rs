use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use tablescan_types::SelectionRect;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrBackend {
    Auto,
    Tesseract,
    Noop,
}

/// Tracks which options were given on the command line, so file config
/// only fills the gaps.
#[derive(Debug, Default)]
pub struct CliSources {
    pub ocr_backend_from_cli: bool,
    pub marker_from_cli: bool,
    pub charset_from_cli: bool,
    pub sparse_text_from_cli: bool,
    pub language_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            ocr_backend_from_cli: value_from_cli(matches, "ocr_backend"),
            marker_from_cli: value_from_cli(matches, "marker"),
            charset_from_cli: value_from_cli(matches, "charset"),
            sparse_text_from_cli: value_from_cli(matches, "sparse_text"),
            language_from_cli: value_from_cli(matches, "ocr_language"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

/// Parses `x,y,dx,dy`. The extents may be negative; they describe a drag
/// and are normalized later.
fn parse_selection(raw: &str) -> Result<SelectionRect, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected x,y,dx,dy but got '{raw}'"));
    }
    let mut values = [0i32; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse::<i32>()
            .map_err(|_| format!("'{part}' is not an integer"))?;
    }
    Ok(SelectionRect::new(values[0], values[1], values[2], values[3]))
}

#[derive(Debug, Parser)]
#[command(
    name = "tablescan",
    about = "Extract table structure and cell text from drawing scans",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Scanned drawing to read (grayscale conversion is applied)
    pub input: PathBuf,

    /// Table region as x,y,dx,dy in image pixels; omit to scan the whole page
    #[arg(long = "roi", value_parser = parse_selection, allow_hyphen_values = true)]
    pub roi: Option<SelectionRect>,

    /// Path for the JSON cell report
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the ruling-free intermediate image to this PNG path
    #[arg(long = "line-free", value_name = "FILE")]
    pub line_free: Option<PathBuf>,

    /// Token that marks the attribute column header
    #[arg(long = "marker", id = "marker", default_value = "PART")]
    pub marker: String,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Preferred OCR backend
    #[arg(long = "ocr-backend", id = "ocr_backend", value_enum, default_value_t = OcrBackend::Auto)]
    pub ocr_backend: OcrBackend,

    /// Language pack for the OCR backend
    #[arg(long = "ocr-language", id = "ocr_language", value_name = "LANG")]
    pub ocr_language: Option<String>,

    /// Characters the recognizer may emit
    #[arg(long = "charset", id = "charset")]
    pub charset: Option<String>,

    /// Let the recognizer hunt for scattered text instead of assuming one line
    #[arg(long = "sparse-text", id = "sparse_text")]
    pub sparse_text: bool,
}
