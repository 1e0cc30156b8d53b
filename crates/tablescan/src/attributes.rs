//! Attribute extraction from a recognized table.
//!
//! Parts lists put their interesting values in one column, identified by
//! a marker token in the header ("PART" by default). Every non-blank
//! cell below that header is an attribute value.

use tablescan_types::CellResult;

/// Position of the first cell whose text contains `marker`.
fn find_marker(cells: &[Vec<CellResult>], marker: &str) -> Option<(usize, usize)> {
    for (row_index, row) in cells.iter().enumerate() {
        for (column_index, cell) in row.iter().enumerate() {
            if cell.text.contains(marker) {
                return Some((row_index, column_index));
            }
        }
    }
    None
}

/// Collects the values of the column whose header carries the marker
/// token. Blank cells and repeated header cells are skipped. An empty
/// list means the marker was not found anywhere.
pub fn extract_attributes(cells: &[Vec<CellResult>], marker: &str) -> Vec<String> {
    let Some((marker_row, column)) = find_marker(cells, marker) else {
        return Vec::new();
    };
    cells
        .iter()
        .enumerate()
        .filter(|(row_index, _)| *row_index != marker_row)
        .filter_map(|(_, row)| row.get(column))
        .filter(|cell| !cell.text.trim().is_empty() && !cell.text.contains(marker))
        .map(|cell| cell.text.trim().to_string())
        .collect()
}
