use std::f64::consts::PI;

use glam::DVec2;

use crate::data::Dataset;

/// Width of the reference frame projections draw into
pub const REFERENCE_WIDTH: f64 = 800.0;
/// Height of the reference frame projections draw into
pub const REFERENCE_HEIGHT: f64 = 600.0;

const DEG: f64 = PI / 180.0;

/// Geographic -> reference frame mapping for one view mode
#[derive(Clone, Copy, Debug)]
pub enum Projection {
    EqualEarth(EqualEarth),
    AlbersUsa(AlbersUsa),
}

impl Projection {
    pub fn for_dataset(dataset: Dataset) -> Self {
        match dataset {
            Dataset::World => Projection::EqualEarth(EqualEarth::world()),
            Dataset::UsStates => Projection::AlbersUsa(AlbersUsa::new(900.0)),
        }
    }

    /// Project (lon, lat) in degrees. `None` when the point has no place on
    /// this map.
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> Option<DVec2> {
        match self {
            Projection::EqualEarth(p) => Some(p.project(lon, lat)),
            Projection::AlbersUsa(p) => p.project(lon, lat),
        }
    }
}

/// Equal Earth pseudocylindrical projection
#[derive(Clone, Copy, Debug)]
pub struct EqualEarth {
    scale: f64,
    translate: DVec2,
    center: DVec2,
}

impl EqualEarth {
    const A1: f64 = 1.340264;
    const A2: f64 = -0.081106;
    const A3: f64 = 0.000893;
    const A4: f64 = 0.003796;

    /// Scale 147, centred on (0°, 10°N)
    pub fn world() -> Self {
        Self::new(147.0, (0.0, 10.0))
    }

    pub fn new(scale: f64, center: (f64, f64)) -> Self {
        Self {
            scale,
            translate: DVec2::new(REFERENCE_WIDTH / 2.0, REFERENCE_HEIGHT / 2.0),
            center: Self::raw(center.0 * DEG, center.1 * DEG),
        }
    }

    fn raw(lambda: f64, phi: f64) -> DVec2 {
        let m = 3f64.sqrt() / 2.0;
        let l = (m * phi.sin()).asin();
        let l2 = l * l;
        let l6 = l2 * l2 * l2;
        DVec2::new(
            lambda * l.cos() / (m * (Self::A1 + 3.0 * Self::A2 * l2 + l6 * (7.0 * Self::A3 + 9.0 * Self::A4 * l2))),
            l * (Self::A1 + Self::A2 * l2 + l6 * (Self::A3 + Self::A4 * l2)),
        )
    }

    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let p = Self::raw(wrap_longitude(lon) * DEG, lat * DEG);
        screen(p, self.center, self.scale, self.translate)
    }
}

/// Conic equal-area (Albers) projection with its own rotation and centre
#[derive(Clone, Copy, Debug)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    rotate: f64,
    center: DVec2,
    scale: f64,
    translate: DVec2,
}

impl ConicEqualArea {
    /// `parallels` and `center` in degrees; `center` is given in rotated
    /// coordinates.
    pub fn new(parallels: (f64, f64), rotate: f64, center: (f64, f64), scale: f64, translate: DVec2) -> Self {
        let sy0 = (parallels.0 * DEG).sin();
        let n = (sy0 + (parallels.1 * DEG).sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = c.sqrt() / n;

        let mut projection = Self {
            n,
            c,
            r0,
            rotate,
            center: DVec2::ZERO,
            scale,
            translate,
        };
        projection.center = projection.raw(center.0 * DEG, center.1 * DEG);
        projection
    }

    fn raw(&self, lambda: f64, phi: f64) -> DVec2 {
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let x = lambda * self.n;
        DVec2::new(r * x.sin(), self.r0 - r * x.cos())
    }

    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let lambda = wrap_longitude(lon + self.rotate) * DEG;
        screen(self.raw(lambda, lat * DEG), self.center, self.scale, self.translate)
    }
}

/// Composite of the lower 48, Alaska and Hawaii, each inset at a fixed
/// offset from the frame centre.
#[derive(Clone, Copy, Debug)]
pub struct AlbersUsa {
    lower48: ConicEqualArea,
    alaska: ConicEqualArea,
    hawaii: ConicEqualArea,
}

impl AlbersUsa {
    pub fn new(k: f64) -> Self {
        let t = DVec2::new(REFERENCE_WIDTH / 2.0, REFERENCE_HEIGHT / 2.0);
        Self {
            lower48: ConicEqualArea::new((29.5, 45.5), 96.0, (-0.6, 38.7), k, t),
            alaska: ConicEqualArea::new(
                (55.0, 65.0),
                154.0,
                (-2.0, 58.5),
                k * 0.35,
                t + DVec2::new(-0.307 * k, 0.201 * k),
            ),
            hawaii: ConicEqualArea::new(
                (8.0, 18.0),
                157.0,
                (-3.0, 19.9),
                k,
                t + DVec2::new(-0.205 * k, 0.212 * k),
            ),
        }
    }

    /// Route a point to its inset by region; anything outside the three
    /// regions (territories) is dropped.
    pub fn project(&self, lon: f64, lat: f64) -> Option<DVec2> {
        let lon = wrap_longitude(lon);
        if lat >= 50.0 && (lon <= -129.0 || lon >= 170.0) {
            Some(self.alaska.project(lon, lat))
        } else if (15.0..=24.0).contains(&lat) && (-180.0..=-150.0).contains(&lon) {
            Some(self.hawaii.project(lon, lat))
        } else if (24.0..=50.0).contains(&lat) && (-125.5..=-66.0).contains(&lon) {
            Some(self.lower48.project(lon, lat))
        } else {
            None
        }
    }
}

#[inline]
fn screen(raw: DVec2, center: DVec2, scale: f64, translate: DVec2) -> DVec2 {
    DVec2::new(
        translate.x + scale * (raw.x - center.x),
        translate.y - scale * (raw.y - center.y),
    )
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Fits the reference frame into a canvas of `cols` x `rows` terminal cells.
///
/// Braille gives 2x4 dots per cell, which comes out roughly square on
/// common terminal fonts, so a single uniform scale keeps shapes
/// undistorted. The frame is centred in whatever space is left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    scale: f64,
    offset: DVec2,
}

impl Viewport {
    pub fn fit(cols: u16, rows: u16) -> Self {
        let width = cols as f64 * 2.0;
        let height = rows as f64 * 4.0;
        let scale = (width / REFERENCE_WIDTH).min(height / REFERENCE_HEIGHT);
        let offset = DVec2::new(
            (width - REFERENCE_WIDTH * scale) / 2.0,
            (height - REFERENCE_HEIGHT * scale) / 2.0,
        );
        Self {
            cols,
            rows,
            scale,
            offset,
        }
    }

    /// Canvas size in Braille dots
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.cols as usize * 2, self.rows as usize * 4)
    }

    /// Reference frame -> Braille dot coordinates
    #[inline]
    pub fn to_pixel(&self, reference: DVec2) -> DVec2 {
        reference * self.scale + self.offset
    }

    /// Dot-space centre of a character cell
    #[inline]
    pub fn cell_center(col: u16, row: u16) -> DVec2 {
        DVec2::new(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0)
    }
}
