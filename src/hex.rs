//! Axial hex coordinates on a flat-top grid.

use serde::{Deserialize, Serialize};

/// Neighbor offsets in enumeration order. River descent breaks height ties by
/// this order, so it must stay fixed.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// All six neighbors, including ones that fall outside any generated grid.
    pub fn neighbors(self) -> [HexCoord; 6] {
        DIRECTIONS.map(|(dq, dr)| HexCoord::new(self.q + dq, self.r + dr))
    }

    pub fn distance(self, other: HexCoord) -> i32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + (dq + dr).abs() + dr.abs()) / 2
    }

    /// Position inside the `width x height` sample rectangle that
    /// [`generate_grid`] covers.
    pub fn to_offset(self) -> (i32, i32) {
        (self.q, self.r + (self.q >> 1))
    }

    pub fn from_offset(x: i32, y: i32) -> Self {
        Self::new(x, y - (x >> 1))
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Coordinates of a `width x height` offset-rectangle layout, column by column.
///
/// Each column `q` is shifted by `q >> 1` rows so the result is a
/// parallelogram in axial space. Non-positive extents yield nothing.
pub fn generate_grid(width: i32, height: i32) -> Vec<HexCoord> {
    if width <= 0 || height <= 0 {
        return Vec::new();
    }
    let mut grid = Vec::with_capacity((width as usize) * (height as usize));
    for q in 0..width {
        let offset = q >> 1;
        for r in -offset..height - offset {
            grid.push(HexCoord::new(q, r));
        }
    }
    grid
}
