use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use serde::Serialize;
use tablescan_types::CellResult;

#[derive(Debug, Serialize)]
pub struct CellReport {
    pub text: String,
    pub confidence: f32,
    pub empty: bool,
}

impl From<&CellResult> for CellReport {
    fn from(cell: &CellResult) -> Self {
        Self {
            text: cell.text.clone(),
            confidence: cell.confidence,
            empty: cell.is_empty_cell(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TableReport {
    pub row_count: usize,
    pub column_count: usize,
    pub cells: Vec<Vec<CellReport>>,
    pub attributes: Vec<String>,
}

impl TableReport {
    pub fn new(cells: &[Vec<CellResult>], attributes: Vec<String>) -> Self {
        let column_count = cells.first().map(Vec::len).unwrap_or(0);
        Self {
            row_count: cells.len(),
            column_count,
            cells: cells
                .iter()
                .map(|row| row.iter().map(CellReport::from).collect())
                .collect(),
            attributes,
        }
    }
}

pub fn write_report(path: &Path, report: &TableReport) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    Ok(())
}
