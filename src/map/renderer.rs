use glam::DVec2;
use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::data::{BoundaryShape, Dataset};
use crate::map::geometry::{bounds, point_in_rings};
use crate::map::projection::{Projection, Viewport};
use crate::map::spatial::FeatureGrid;

/// Grid cell size for the hit-test index, in Braille dots
const GRID_CELL: f64 = 16.0;

/// One boundary shape in canvas dot coordinates
#[derive(Clone, Debug, Default)]
pub struct ProjectedShape {
    pub rings: Vec<Vec<DVec2>>,
    pub bbox: Option<(DVec2, DVec2)>,
}

impl ProjectedShape {
    fn area(&self) -> f64 {
        self.bbox
            .map(|(min, max)| (max.x - min.x) * (max.y - min.y))
            .unwrap_or(f64::INFINITY)
    }
}

/// A boundary set projected for one canvas size.
///
/// Indices match the `BoundaryShape` slice it was built from. Building is
/// the expensive step (projection, per-cell ownership, outlines) and is
/// only repeated when the dataset or canvas size changes; drawing a frame
/// just reads the cached results.
#[derive(Debug)]
pub struct ShapeLayer {
    dataset: Dataset,
    viewport: Viewport,
    shapes: Vec<ProjectedShape>,
    grid: FeatureGrid,
    /// Shape owning each character cell (sampled at the cell centre), row-major
    owners: Vec<Option<usize>>,
    outlines: BrailleCanvas,
}

impl ShapeLayer {
    pub fn build(dataset: Dataset, source: &[BoundaryShape], viewport: Viewport) -> Self {
        let projection = Projection::for_dataset(dataset);

        let shapes: Vec<ProjectedShape> = source
            .par_iter()
            .map(|shape| project_shape(shape, &projection, &viewport))
            .collect();
        let grid = FeatureGrid::build(shapes.iter().map(|s| s.bbox), GRID_CELL);

        let mut layer = Self {
            dataset,
            viewport,
            shapes,
            grid,
            owners: Vec::new(),
            outlines: BrailleCanvas::new(viewport.cols as usize, viewport.rows as usize),
        };
        layer.owners = layer.rasterize();
        layer.draw_outlines();

        tracing::debug!(
            dataset = dataset.label(),
            shapes = layer.shapes.len(),
            cols = viewport.cols,
            rows = viewport.rows,
            "built shape layer"
        );
        layer
    }

    /// Whether this layer is still valid for the given dataset and canvas
    pub fn matches(&self, dataset: Dataset, viewport: &Viewport) -> bool {
        self.dataset == dataset && self.viewport == *viewport
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shape(&self, idx: usize) -> Option<&ProjectedShape> {
        self.shapes.get(idx)
    }

    /// Shape containing the dot-space point `p`. Where shapes overlap (an
    /// enclave inside its neighbour) the one with the smaller bounds wins.
    pub fn hit_test(&self, p: DVec2) -> Option<usize> {
        self.grid
            .candidates(p)
            .iter()
            .copied()
            .filter(|&idx| {
                let shape = &self.shapes[idx];
                shape
                    .bbox
                    .is_some_and(|(min, max)| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y)
                    && point_in_rings(&shape.rings, p)
            })
            .min_by(|&a, &b| self.shapes[a].area().total_cmp(&self.shapes[b].area()))
    }

    /// Owner of a character cell relative to the canvas origin
    pub fn owner_at(&self, col: u16, row: u16) -> Option<usize> {
        if col >= self.viewport.cols || row >= self.viewport.rows {
            return None;
        }
        self.owners[row as usize * self.viewport.cols as usize + col as usize]
    }

    /// Outline glyph for a character cell
    pub fn outline_at(&self, col: u16, row: u16) -> Option<char> {
        self.outlines.glyph(col as usize, row as usize)
    }

    fn rasterize(&self) -> Vec<Option<usize>> {
        let cols = self.viewport.cols as usize;
        let cells = cols * self.viewport.rows as usize;
        (0..cells)
            .into_par_iter()
            .map(|i| {
                let (col, row) = ((i % cols) as u16, (i / cols) as u16);
                self.hit_test(Viewport::cell_center(col, row))
            })
            .collect()
    }

    fn draw_outlines(&mut self) {
        let (width, _) = self.viewport.pixel_size();
        for shape in &self.shapes {
            for ring in &shape.rings {
                draw_ring(&mut self.outlines, ring, width);
            }
        }
    }
}

fn project_shape(shape: &BoundaryShape, projection: &Projection, viewport: &Viewport) -> ProjectedShape {
    let rings: Vec<Vec<DVec2>> = shape
        .rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter_map(|&(lon, lat)| projection.project(lon, lat))
                .map(|p| viewport.to_pixel(p))
                .collect::<Vec<_>>()
        })
        .filter(|ring| ring.len() >= 3)
        .collect();
    let bbox = bounds(&rings);
    ProjectedShape { rings, bbox }
}

/// Stroke a closed ring, skipping segments that jump across the canvas
fn draw_ring(canvas: &mut BrailleCanvas, ring: &[DVec2], width: usize) {
    let max_jump = width as f64 / 2.0;
    for pair in ring.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if (a.x - b.x).abs() > max_jump {
            continue;
        }
        canvas.stroke(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str, name: &str, lon: (f64, f64), lat: (f64, f64)) -> BoundaryShape {
        BoundaryShape {
            id: id.into(),
            name: name.into(),
            rings: vec![vec![
                (lon.0, lat.0),
                (lon.1, lat.0),
                (lon.1, lat.1),
                (lon.0, lat.1),
                (lon.0, lat.0),
            ]],
        }
    }

    fn world_layer() -> (ShapeLayer, Viewport) {
        let shapes = vec![
            rect("A", "Big", (-40.0, 40.0), (-20.0, 40.0)),
            // Enclave fully inside Big
            rect("B", "Small", (-5.0, 5.0), (5.0, 15.0)),
        ];
        let viewport = Viewport::fit(100, 40);
        (ShapeLayer::build(Dataset::World, &shapes, viewport), viewport)
    }

    fn cell_of(viewport: &Viewport, lon: f64, lat: f64) -> (u16, u16) {
        let p = viewport.to_pixel(Projection::for_dataset(Dataset::World).project(lon, lat).unwrap());
        ((p.x / 2.0) as u16, (p.y / 4.0) as u16)
    }

    #[test]
    fn test_smallest_shape_wins() {
        let (layer, viewport) = world_layer();
        let (col, row) = cell_of(&viewport, 0.0, 10.0);
        assert_eq!(layer.owner_at(col, row), Some(1));
        let (col, row) = cell_of(&viewport, 30.0, -10.0);
        assert_eq!(layer.owner_at(col, row), Some(0));
        // Far outside both
        let (col, row) = cell_of(&viewport, 150.0, -60.0);
        assert_eq!(layer.owner_at(col, row), None);
        assert_eq!(layer.owner_at(500, 500), None);
    }

    #[test]
    fn test_outlines_drawn_on_boundary() {
        let (layer, viewport) = world_layer();
        let (col, row) = cell_of(&viewport, 0.0, 40.0);
        assert!(layer.outline_at(col, row).is_some());
        let (col, row) = cell_of(&viewport, 150.0, -60.0);
        assert!(layer.outline_at(col, row).is_none());
    }

    #[test]
    fn test_layer_cache_key() {
        let (layer, viewport) = world_layer();
        assert_eq!(layer.len(), 2);
        assert!(layer.matches(Dataset::World, &viewport));
        assert!(!layer.matches(Dataset::UsStates, &viewport));
        assert!(!layer.matches(Dataset::World, &Viewport::fit(101, 40)));
    }

    #[test]
    fn test_territory_keeps_index_but_has_no_area() {
        let shapes = vec![
            rect("72", "Puerto Rico", (-67.3, -65.2), (17.9, 18.5)),
            rect("20", "Kansas", (-102.0, -94.6), (37.0, 40.0)),
        ];
        let layer = ShapeLayer::build(Dataset::UsStates, &shapes, Viewport::fit(120, 40));
        assert_eq!(layer.len(), 2);
        assert!(layer.shape(0).is_some_and(|s| s.bbox.is_none()));
        assert!(layer.shape(1).is_some_and(|s| s.bbox.is_some()));
    }
}
