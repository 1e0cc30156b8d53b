use std::process::ExitCode;
use std::sync::Arc;

use indicatif::ProgressBar;

use tablescan::cli::parse_cli;
use tablescan::pipeline::{run_pipeline, PipelineConfig};
use tablescan::progress::recognition_bar_style;
use tablescan::report::{write_report, TableReport};
use tablescan::settings::resolve_settings;
use tablescan_ocr::ProgressCallback;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let (args, sources) = parse_cli();
    let settings = match resolve_settings(&args, &sources) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let bar = ProgressBar::new(100);
    bar.set_style(recognition_bar_style());
    bar.set_prefix("cells");
    let reporter = bar.clone();
    let callback: ProgressCallback = Arc::new(move |percent| reporter.set_position(percent));

    let config = PipelineConfig::from_settings(&settings);
    let output = match run_pipeline(config, Some(callback)).await {
        Ok(output) => output,
        Err(err) => {
            bar.abandon();
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    bar.finish_and_clear();

    if let Some(path) = settings.line_free.as_ref() {
        if let Err(err) = output.line_free.save(path) {
            eprintln!("failed to write {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    }

    for row in &output.cells {
        let line: Vec<&str> = row.iter().map(|cell| cell.text.as_str()).collect();
        println!("{}", line.join("\t"));
    }
    if !output.attributes.is_empty() {
        println!();
        println!("{} values under '{}':", output.attributes.len(), settings.marker);
        for value in &output.attributes {
            println!("  {value}");
        }
    }

    if let Some(path) = settings.output.as_ref() {
        let report = TableReport::new(&output.cells, output.attributes.clone());
        if let Err(err) = write_report(path, &report) {
            eprintln!("failed to write {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
        println!("report written to {}", path.display());
    }

    ExitCode::SUCCESS
}
