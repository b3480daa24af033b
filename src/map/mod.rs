mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use projection::{AlbersUsa, EqualEarth, Projection, Viewport, REFERENCE_HEIGHT, REFERENCE_WIDTH};
pub use renderer::{ProjectedShape, ShapeLayer};
