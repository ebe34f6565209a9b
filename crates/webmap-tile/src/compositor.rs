//! Assembling decoded cells into one raster.

use image::{Rgb, RgbImage};
use tracing::trace;
use webmap_core::constants::CHUNK_SIZE;
use webmap_core::Region;

use crate::codec::PixelBlock;

/// A decoded cell ready for placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCell {
    pub x: i32,
    pub z: i32,
    pub block: PixelBlock,
}

/// Composite `cells` over a `background` fill covering `region`.
///
/// Each cell contributes a `tile_size x tile_size` block, `tile_size` being
/// `16 / scale` floored, placed at column `(x - x0) * tile_size` and row
/// `(z - z0) * tile_size`. The output is `w * tile_size` pixels wide and
/// `h * tile_size` high.
///
/// Downsampling is strided nearest-neighbour: every `scale`-th row and column
/// starting at index 0. It is lossy and not area-correct. Scales that do not
/// divide 16 drop the trailing samples of each block.
///
/// Cells outside the footprint are ignored. Placements never overlap, so the
/// order of `cells` does not affect the result.
pub fn composite(cells: &[DecodedCell], region: &Region, scale: u32, background: Rgb<u8>) -> RgbImage {
    let tile_size = (CHUNK_SIZE as u32).checked_div(scale).unwrap_or(0);
    let mut out = RgbImage::from_pixel(region.w * tile_size, region.h * tile_size, background);
    if tile_size == 0 {
        return out;
    }

    for cell in cells {
        let Some((col, row)) = region.cell_offset(cell.x, cell.z) else {
            trace!(x = cell.x, z = cell.z, "ignoring cell outside footprint");
            continue;
        };
        blit_strided(
            &mut out,
            &cell.block,
            col * tile_size,
            row * tile_size,
            tile_size,
            scale,
        );
    }
    out
}

fn blit_strided(
    out: &mut RgbImage,
    block: &PixelBlock,
    origin_x: u32,
    origin_y: u32,
    tile_size: u32,
    stride: u32,
) {
    for dy in 0..tile_size {
        for dx in 0..tile_size {
            if let Some(pixel) = block.get_pixel_checked(dx * stride, dy * stride) {
                out.put_pixel(origin_x + dx, origin_y + dy, *pixel);
            }
        }
    }
}
