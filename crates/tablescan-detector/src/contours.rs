//! Connected-region bounding boxes over a binary mask.
//!
//! Regions are built from per-row runs merged with a union-find, using
//! 8-connectivity so diagonally touching runs join. On the combined-lines
//! mask every cell interior is one region; the page background is another
//! and is rejected by the size filter downstream.

use image::GrayImage;
use tablescan_types::BoundingBox;

use crate::config::GridDetectorConfig;
use crate::raster::FOREGROUND;

#[derive(Clone, Copy)]
struct ComponentStats {
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
}

impl ComponentStats {
    fn new(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }
}

#[derive(Clone, Copy)]
struct RowRun {
    y: usize,
    start: usize,
    end: usize,
}

struct RunDsu {
    parent: Vec<u32>,
    rank: Vec<u8>,
}

impl RunDsu {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len as u32).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        let idx = x as usize;
        let parent = self.parent[idx];
        if parent == x {
            return x;
        }
        let root = self.find(parent);
        self.parent[idx] = root;
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let mut root_a = self.find(a);
        let mut root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let rank_a = self.rank[root_a as usize];
        let rank_b = self.rank[root_b as usize];
        if rank_a < rank_b {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b as usize] = root_a;
        if rank_a == rank_b {
            self.rank[root_a as usize] = rank_a + 1;
        }
    }
}

/// Bounding boxes of all foreground regions, in first-encounter scan
/// order.
fn component_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let raw = mask.as_raw();
    let mut runs = Vec::new();
    let mut row_offsets = vec![0usize; height + 1];
    for y in 0..height {
        row_offsets[y] = runs.len();
        let row = &raw[y * width..(y + 1) * width];
        let mut x = 0usize;
        while x < width {
            if row[x] != FOREGROUND {
                x += 1;
                continue;
            }
            let start = x;
            while x < width && row[x] == FOREGROUND {
                x += 1;
            }
            runs.push(RowRun { y, start, end: x });
        }
    }
    row_offsets[height] = runs.len();
    if runs.is_empty() {
        return Vec::new();
    }

    let mut dsu = RunDsu::new(runs.len());
    for y in 1..height {
        let prev = row_offsets[y - 1]..row_offsets[y];
        let curr = row_offsets[y]..row_offsets[y + 1];
        for curr_idx in curr {
            let curr_run = runs[curr_idx];
            for prev_idx in prev.clone() {
                let prev_run = runs[prev_idx];
                // 8-connectivity: overlapping or diagonally touching.
                if prev_run.start <= curr_run.end && curr_run.start <= prev_run.end {
                    dsu.union(curr_idx as u32, prev_idx as u32);
                }
            }
        }
    }

    let mut stats: Vec<Option<ComponentStats>> = vec![None; runs.len()];
    for (idx, run) in runs.iter().enumerate() {
        let root = dsu.find(idx as u32) as usize;
        let entry = stats[root].get_or_insert_with(|| ComponentStats::new(run.start, run.y));
        entry.min_x = entry.min_x.min(run.start);
        entry.max_x = entry.max_x.max(run.end - 1);
        entry.min_y = entry.min_y.min(run.y);
        entry.max_y = entry.max_y.max(run.y);
    }
    stats
        .into_iter()
        .flatten()
        .map(|c| {
            BoundingBox::new(
                c.min_x as u32,
                c.min_y as u32,
                (c.max_x - c.min_x + 1) as u32,
                (c.max_y - c.min_y + 1) as u32,
            )
        })
        .collect()
}

/// Candidate cell boxes: regions sorted into reading order (top-to-bottom
/// by y, ties keep scan order) with the table border and oversized noise
/// blobs filtered out.
pub(crate) fn cell_boxes(mask: &GrayImage, config: &GridDetectorConfig) -> Vec<BoundingBox> {
    let mut boxes = component_boxes(mask);
    boxes.sort_by_key(|b| b.y);
    boxes.retain(|b| b.width < config.max_cell_width && b.height < config.max_cell_height);
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        let data = rows
            .iter()
            .flat_map(|r| r.iter().map(|&v| if v != 0 { FOREGROUND } else { 0 }))
            .collect();
        GrayImage::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn disjoint_regions_give_separate_boxes() {
        let mask = from_rows(&[
            &[1, 1, 0, 0, 1],
            &[1, 1, 0, 0, 1],
            &[0, 0, 0, 0, 0],
            &[0, 1, 1, 0, 0],
        ]);
        let boxes = component_boxes(&mask);
        assert_eq!(boxes.len(), 3);
        assert!(boxes.contains(&BoundingBox::new(0, 0, 2, 2)));
        assert!(boxes.contains(&BoundingBox::new(4, 0, 1, 2)));
        assert!(boxes.contains(&BoundingBox::new(1, 3, 2, 1)));
    }

    #[test]
    fn diagonal_touch_merges() {
        let mask = from_rows(&[&[1, 0, 0], &[0, 1, 0], &[0, 0, 1]]);
        let boxes = component_boxes(&mask);
        assert_eq!(boxes, vec![BoundingBox::new(0, 0, 3, 3)]);
    }

    #[test]
    fn reading_order_and_size_filter() {
        let config = GridDetectorConfig {
            max_cell_width: 4,
            max_cell_height: 4,
            ..GridDetectorConfig::default()
        };
        let mask = from_rows(&[
            &[1, 1, 1, 1, 1, 0, 0, 0],
            &[0, 0, 0, 0, 0, 0, 1, 0],
            &[0, 1, 0, 0, 0, 0, 1, 0],
        ]);
        let boxes = cell_boxes(&mask, &config);
        // The 5-wide run is rejected; the rest come back top-to-bottom.
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0], BoundingBox::new(6, 1, 1, 2));
        assert_eq!(boxes[1], BoundingBox::new(1, 2, 1, 1));
    }

    #[test]
    fn empty_mask_gives_no_boxes() {
        let mask = GrayImage::new(6, 4);
        assert!(component_boxes(&mask).is_empty());
    }
}
