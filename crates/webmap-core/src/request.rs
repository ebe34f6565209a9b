//! Tile requests.

use serde::{Deserialize, Serialize};

use crate::constants::{CHUNK_SIZE, DEFAULT_LAYER};
use crate::coords::Region;
use crate::error::{Error, Result};
use crate::types::ServerId;

/// Request for a composite tile covering `w x h` chunk cells.
///
/// Every field takes part in equality and hashing, so the request itself is
/// the composite cache key: two requests differing in any field are distinct
/// entries, and overlapping viewports are never merged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRequest {
    pub server: ServerId,
    pub dimension: String,
    pub x: i32,
    pub z: i32,
    pub w: u32,
    pub h: u32,
    pub scale: u32,
    pub y: i32,
}

impl TileRequest {
    /// Single-cell request on the default layer at full resolution.
    pub fn new(server: ServerId, dimension: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            server,
            dimension: dimension.into(),
            x,
            z,
            w: 1,
            h: 1,
            scale: 1,
            y: DEFAULT_LAYER,
        }
    }

    /// Set the footprint size in chunk cells.
    #[must_use]
    pub const fn with_size(mut self, w: u32, h: u32) -> Self {
        self.w = w;
        self.h = h;
        self
    }

    /// Set the downsampling factor.
    #[must_use]
    pub const fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the y-layer.
    #[must_use]
    pub const fn with_layer(mut self, y: i32) -> Self {
        self.y = y;
        self
    }

    /// Footprint of the request in chunk cells.
    #[inline]
    pub const fn region(&self) -> Region {
        Region::new(self.x, self.z, self.w, self.h, self.y)
    }

    /// Pixels each cell contributes per axis (`16 / scale`, floored).
    ///
    /// Scales that do not divide 16 truncate the sampled block.
    #[inline]
    pub const fn tile_size(&self) -> u32 {
        if self.scale == 0 {
            0
        } else {
            CHUNK_SIZE as u32 / self.scale
        }
    }

    /// Output raster size as `(width, height)` in pixels.
    #[inline]
    pub const fn pixel_size(&self) -> (u32, u32) {
        (self.w * self.tile_size(), self.h * self.tile_size())
    }

    /// Reject requests that cannot produce a raster.
    ///
    /// `max_region_chunks` bounds each axis of the footprint.
    pub fn validate(&self, max_region_chunks: u32) -> Result<()> {
        if self.w == 0 || self.h == 0 {
            return Err(Error::InvalidRequest(format!(
                "empty footprint {}x{}",
                self.w, self.h
            )));
        }
        if self.w > max_region_chunks || self.h > max_region_chunks {
            return Err(Error::InvalidRequest(format!(
                "footprint {}x{} exceeds {max_region_chunks} chunks per axis",
                self.w, self.h
            )));
        }
        if self.scale == 0 || self.scale as usize > CHUNK_SIZE {
            return Err(Error::InvalidRequest(format!(
                "scale {} outside 1..={CHUNK_SIZE}",
                self.scale
            )));
        }
        Ok(())
    }
}
