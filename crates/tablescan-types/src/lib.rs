//! Shared domain models for the tablescan workspace.
//!
//! This crate centralizes the lightweight data structures used across the
//! detector, OCR, and CLI crates. Keep it backend-agnostic and free of
//! image/engine dependencies so every crate can depend on it without
//! pulling native libraries or heavy features.

use serde::Serialize;
use thiserror::Error;

/// Confidence value reserved for a cell judged empty: no candidate boxes,
/// or a crop that produced no usable recognition fragments. Distinct from
/// a genuine zero-confidence read.
pub const EMPTY_CELL_CONFIDENCE: f32 = -2.0;

/// Axis-aligned box in image pixel coordinates with non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost column covered by the box.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom row covered by the box.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// User-drawn rectangle from an interactive viewer. Width and height may be
/// negative depending on drag direction; [`SelectionRect::normalized`]
/// converts to the canonical non-negative form and must be applied before
/// the rectangle is used for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl SelectionRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Canonical form with non-negative width and height. Idempotent: a
    /// rectangle that is already normalized comes back unchanged, and the
    /// same region described from either drag corner normalizes to the
    /// same value.
    pub fn normalized(self) -> SelectionRect {
        let (x, width) = if self.width < 0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        SelectionRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Recognition output for one logical table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellResult {
    pub text: String,
    pub confidence: f32,
}

impl CellResult {
    pub fn new(text: String, confidence: f32) -> Self {
        Self { text, confidence }
    }

    /// The empty-cell terminal state: no text, sentinel confidence.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: EMPTY_CELL_CONFIDENCE,
        }
    }

    pub fn is_empty_cell(&self) -> bool {
        self.confidence == EMPTY_CELL_CONFIDENCE
    }
}

/// Row/column matrix of detected cell boxes. Every row has exactly
/// `column_count` slots; a slot holds zero, one, or more candidate boxes
/// (ragged tables produce both missing and duplicate candidates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    rows: Vec<Vec<Vec<BoundingBox>>>,
    column_count: usize,
}

impl CellGrid {
    /// Builds a grid, verifying rectangularity. Rows are padded by the
    /// assembler before construction; a ragged input here indicates a bug
    /// in the producer and is surfaced rather than coerced.
    pub fn new(rows: Vec<Vec<Vec<BoundingBox>>>) -> Result<Self, TableStructureError> {
        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || column_count == 0 {
            return Err(TableStructureError::Empty);
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != column_count {
                return Err(TableStructureError::RaggedRow {
                    row: index,
                    got: row.len(),
                    expected: column_count,
                });
            }
        }
        Ok(Self { rows, column_count })
    }

    pub fn rows(&self) -> &[Vec<Vec<BoundingBox>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }
}

#[derive(Debug, Error)]
pub enum TableStructureError {
    #[error("cell grid has no rows or no columns")]
    Empty,
    #[error("row {row} has {got} column slots, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_idempotent() {
        let rect = SelectionRect::new(10, 20, 30, 40);
        assert_eq!(rect.normalized(), rect);
        assert_eq!(rect.normalized().normalized(), rect.normalized());

        let dragged = SelectionRect::new(40, 60, -30, -40);
        assert_eq!(dragged.normalized().normalized(), dragged.normalized());
    }

    #[test]
    fn normalization_is_drag_direction_independent() {
        // normalize(x, y, dx, dy) == normalize(x+dx, y+dy, -dx, -dy)
        for &(x, y, dx, dy) in &[(10, 20, 30, 40), (0, 0, 5, -7), (-3, 4, -10, 12)] {
            let forward = SelectionRect::new(x, y, dx, dy).normalized();
            let backward = SelectionRect::new(x + dx, y + dy, -dx, -dy).normalized();
            assert_eq!(forward, backward);
        }
    }

    #[test]
    fn normalized_extents_are_non_negative() {
        let rect = SelectionRect::new(100, 100, -60, -25).normalized();
        assert!(rect.width >= 0 && rect.height >= 0);
        assert_eq!(rect, SelectionRect::new(40, 75, 60, 25));
    }

    #[test]
    fn cell_grid_rejects_ragged_rows() {
        let b = BoundingBox::new(0, 0, 5, 5);
        let rows = vec![vec![vec![b], vec![b]], vec![vec![b]]];
        assert!(matches!(
            CellGrid::new(rows),
            Err(TableStructureError::RaggedRow {
                row: 1,
                got: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn cell_grid_accepts_rectangular_rows() {
        let b = BoundingBox::new(0, 0, 5, 5);
        let grid = CellGrid::new(vec![vec![vec![b], vec![]], vec![vec![], vec![b]]]).unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
    }

    #[test]
    fn empty_cell_sentinel_is_distinguishable_from_zero() {
        let empty = CellResult::empty();
        assert!(empty.is_empty_cell());
        let low = CellResult::new("x".into(), 0.0);
        assert!(!low.is_empty_cell());
    }
}
