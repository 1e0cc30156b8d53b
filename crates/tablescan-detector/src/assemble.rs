//! Table assembly: turns a flat list of cell boxes into a rectangular
//! row/column grid.
//!
//! Boxes arrive sorted top-to-bottom. Consecutive boxes whose top edge
//! sits within half the mean box height of the current row's anchor are
//! grouped into that row, then every box is assigned to the column whose
//! reference center is nearest. Reference centers come from the first
//! row, which in these drawings is the header and spans every column.

use tablescan_types::{BoundingBox, CellGrid, TableStructureError};

/// Accumulates row groups during the top-to-bottom fold.
struct RowAccumulator {
    rows: Vec<Vec<BoundingBox>>,
    current: Vec<BoundingBox>,
    previous: BoundingBox,
}

impl RowAccumulator {
    fn new(first: BoundingBox) -> Self {
        Self {
            rows: Vec::new(),
            current: vec![first],
            previous: first,
        }
    }

    fn push(&mut self, bbox: BoundingBox, row_tolerance: f32) {
        if (bbox.y as f32) <= self.previous.y as f32 + row_tolerance {
            self.current.push(bbox);
        } else {
            self.rows.push(std::mem::take(&mut self.current));
            self.current.push(bbox);
        }
        self.previous = bbox;
    }

    fn finish(mut self) -> Vec<Vec<BoundingBox>> {
        if !self.current.is_empty() {
            self.rows.push(self.current);
        }
        self.rows
    }
}

fn group_rows(boxes: &[BoundingBox]) -> Vec<Vec<BoundingBox>> {
    let mean_height =
        boxes.iter().map(|b| b.height as f32).sum::<f32>() / boxes.len() as f32;
    let row_tolerance = mean_height / 2.0;
    let mut iter = boxes.iter().copied();
    let first = match iter.next() {
        Some(b) => b,
        None => return Vec::new(),
    };
    let mut acc = RowAccumulator::new(first);
    for bbox in iter {
        acc.push(bbox, row_tolerance);
    }
    acc.finish()
}

/// Index of the reference center closest to `key`, first one wins on
/// ties.
fn nearest_column(centers: &[f32], key: f32) -> usize {
    let mut best = 0;
    let mut best_distance = (centers[0] - key).abs();
    for (idx, center) in centers.iter().enumerate().skip(1) {
        let distance = (center - key).abs();
        if distance < best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    best
}

/// Arranges detected cell boxes into a rectangular grid.
///
/// A single box short-circuits to a 1x1 grid, which is what the
/// full-image fallback from detection produces. Rows shorter than the
/// widest row are padded with empty slots so the result is always
/// rectangular; a slot may also hold several boxes when a cell was
/// split by stray marks.
pub fn assemble(boxes: &[BoundingBox]) -> Result<CellGrid, TableStructureError> {
    if boxes.is_empty() {
        return Err(TableStructureError::Empty);
    }
    if boxes.len() == 1 {
        return CellGrid::new(vec![vec![vec![boxes[0]]]]);
    }

    let grouped = group_rows(boxes);

    let mut centers: Vec<f32> = grouped[0]
        .iter()
        .map(|b| b.x as f32 + b.width as f32 / 2.0)
        .collect();
    centers.sort_by(|a, b| a.total_cmp(b));

    let column_count = grouped.iter().map(Vec::len).max().unwrap_or(0);
    let mut rows = Vec::with_capacity(grouped.len());
    for group in &grouped {
        let mut slots: Vec<Vec<BoundingBox>> = vec![Vec::new(); column_count];
        for bbox in group {
            let key = bbox.x as f32 + bbox.width as f32 / 4.0;
            let column = nearest_column(&centers, key).min(column_count - 1);
            slots[column].push(*bbox);
        }
        rows.push(slots);
    }
    CellGrid::new(rows)
}
