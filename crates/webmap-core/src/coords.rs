//! Coordinate systems for stored chunk cells.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LAYER;

/// Position of a chunk cell in chunk coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellPos {
    /// Create a new cell position
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell position on the default layer
    #[inline]
    pub const fn on_default_layer(x: i32, z: i32) -> Self {
        Self::new(x, DEFAULT_LAYER, z)
    }
}

impl Default for CellPos {
    fn default() -> Self {
        Self::on_default_layer(0, 0)
    }
}

/// Rectangular footprint of chunk cells on a single y-layer.
///
/// Covers `x in [x0, x0 + w)` and `z in [z0, z0 + h)`. Bounds are computed in
/// `i64` so regions touching `i32::MAX` do not overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x0: i32,
    pub z0: i32,
    pub w: u32,
    pub h: u32,
    pub y: i32,
}

impl Region {
    /// Create a new region
    #[inline]
    pub const fn new(x0: i32, z0: i32, w: u32, h: u32, y: i32) -> Self {
        Self { x0, z0, w, h, y }
    }

    /// Exclusive upper x bound
    #[inline]
    pub const fn x_end(&self) -> i64 {
        self.x0 as i64 + self.w as i64
    }

    /// Exclusive upper z bound
    #[inline]
    pub const fn z_end(&self) -> i64 {
        self.z0 as i64 + self.h as i64
    }

    /// Returns true if the region covers no cells
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Number of cells covered
    #[inline]
    pub const fn cell_count(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Check whether a cell at `(x, z)` on any layer falls inside the footprint.
    #[inline]
    pub const fn contains(&self, x: i32, z: i32) -> bool {
        let (x, z) = (x as i64, z as i64);
        x >= self.x0 as i64 && x < self.x_end() && z >= self.z0 as i64 && z < self.z_end()
    }

    /// Check whether a full cell position lies inside the footprint and on its layer.
    #[inline]
    pub const fn contains_pos(&self, pos: CellPos) -> bool {
        pos.y == self.y && self.contains(pos.x, pos.z)
    }

    /// Column and row of a cell relative to the region origin, in cell units.
    ///
    /// Returns `None` for cells outside the footprint.
    #[inline]
    pub const fn cell_offset(&self, x: i32, z: i32) -> Option<(u32, u32)> {
        if self.contains(x, z) {
            Some(((x as i64 - self.x0 as i64) as u32, (z as i64 - self.z0 as i64) as u32))
        } else {
            None
        }
    }
}
