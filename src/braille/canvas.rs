use glam::{DVec2, IVec2};

/// Bit for each dot of a cell, indexed `[dx][dy]`:
/// ```text
/// 0x01 0x08
/// 0x02 0x10
/// 0x04 0x20
/// 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Outline layer drawn with Braille patterns (U+2800..U+28FF).
///
/// Addressed in dots: a canvas of `cols` x `rows` cells has
/// `cols * 2` x `rows * 4` dots. Dots outside the canvas are dropped.
#[derive(Clone, Debug)]
pub struct BrailleCanvas {
    cols: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0; cols * rows],
        }
    }

    /// Turn on the dot at `p`
    pub fn plot(&mut self, p: IVec2) {
        if p.x < 0 || p.y < 0 {
            return;
        }
        let (x, y) = (p.x as usize, p.y as usize);
        let (col, row) = (x / 2, y / 4);
        if col >= self.cols || row >= self.rows {
            return;
        }
        self.cells[row * self.cols + col] |= DOT_BITS[x % 2][y % 4];
    }

    /// Bresenham segment between two dot-space points, endpoints included
    pub fn stroke(&mut self, from: DVec2, to: DVec2) {
        let (mut p, end) = (from.floor().as_ivec2(), to.floor().as_ivec2());
        let delta = IVec2::new((end.x - p.x).abs(), -(end.y - p.y).abs());
        let step = IVec2::new((end.x - p.x).signum(), (end.y - p.y).signum());
        let mut err = delta.x + delta.y;

        loop {
            self.plot(p);
            if p == end {
                break;
            }
            let e2 = 2 * err;
            if e2 >= delta.y {
                err += delta.y;
                p.x += step.x;
            }
            if e2 <= delta.x {
                err += delta.x;
                p.y += step.y;
            }
        }
    }

    /// Glyph for one character cell, `None` when no dot is set
    pub fn glyph(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        match self.cells[row * self.cols + col] {
            0 => None,
            bits => char::from_u32(0x2800 + bits as u32),
        }
    }
}
