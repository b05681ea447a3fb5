//! Box and coordinate helpers shared by the coarse attention grid and the
//! full-resolution images.

/// Side of one coarse attention cell in working-image pixels.
pub const COARSE_STRIDE: i64 = 8;

/// Half-open box `[top, bottom) x [left, right)` clipped to an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub top: i64,
    pub bottom: i64,
    pub left: i64,
    pub right: i64,
}

impl Boundary {
    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        row >= self.top && row < self.bottom && col >= self.left && col < self.right
    }
}

/// Square box of side `2*radius+1` centred on `(center_row, center_col)`,
/// clipped to `[0, total_rows] x [0, total_cols]`.
pub fn get_boundary(
    center_row: i64,
    center_col: i64,
    total_rows: i64,
    total_cols: i64,
    radius: i64,
) -> Boundary {
    let (top, bottom) = clip_span(center_row, total_rows, radius);
    let (left, right) = clip_span(center_col, total_cols, radius);
    Boundary {
        top,
        bottom,
        left,
        right,
    }
}

fn clip_span(center: i64, total: i64, radius: i64) -> (i64, i64) {
    let total = total.max(0);
    // Centers outside the array still yield an ordered (possibly empty) span.
    let lo = (center - radius).clamp(0, total);
    let hi = (center + radius + 1).min(total).max(lo);
    (lo, hi)
}

/// Query point in original, unscaled target-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryPoint {
    pub x: i64,
    pub y: i64,
}

impl QueryPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Position in the scaled working image, truncated toward zero.
    pub fn scaled(&self, scale: f64) -> (i64, i64) {
        ((self.x as f64 * scale) as i64, (self.y as f64 * scale) as i64)
    }

    /// `(row, col)` of the coarse attention cell holding the scaled point.
    pub fn coarse_cell(&self, scale: f64) -> (i64, i64) {
        let (x, y) = self.scaled(scale);
        (
            y.div_euclid(COARSE_STRIDE),
            x.div_euclid(COARSE_STRIDE),
        )
    }
}
