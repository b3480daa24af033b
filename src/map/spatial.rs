use std::collections::HashMap;

use glam::DVec2;

/// Spatial index over projected shape bounds.
///
/// Each shape's bounding box is indexed into every cell it overlaps,
/// guaranteeing no false negatives while allowing false positives
/// (eliminated by the exact ring test in `ShapeLayer::hit_test`).
#[derive(Debug)]
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, p: DVec2) -> (i32, i32) {
        let x = (p.x / self.cell_size).floor() as i32;
        let y = (p.y / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from shape bounding boxes; `None` entries (shapes with nothing
    /// on the map) are skipped but keep their index.
    pub fn build(bboxes: impl Iterator<Item = Option<(DVec2, DVec2)>>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, bbox) in bboxes.enumerate() {
            let Some((min, max)) = bbox else { continue };
            let min_cell = grid.to_cell(min);
            let max_cell = grid.to_cell(max);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate shapes whose bounds may contain `p`
    pub fn candidates(&self, p: DVec2) -> &[usize] {
        self.cells
            .get(&self.to_cell(p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
