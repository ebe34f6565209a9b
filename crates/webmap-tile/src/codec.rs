//! PNG codec for chunk blocks and composite tiles.
//!
//! Blocks and tiles share one format: 8-bit RGB PNG. Stored blocks may also
//! arrive as raw 16x16 RGBA byte arrays (row = z, column = x), which is what
//! uploaders send when they skip PNG encoding.

use std::io::Cursor;

use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use webmap_core::constants::{CHUNK_CHANNELS, CHUNK_SIZE, RAW_CHUNK_LEN};

use crate::error::{Result, TileError};

/// Decoded 16x16 RGB pixel block of one chunk cell.
pub type PixelBlock = RgbImage;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Decode a stored chunk payload into RGB samples, discarding alpha.
pub fn decode_block(bytes: &[u8]) -> Result<PixelBlock> {
    let block = if bytes.starts_with(&PNG_SIGNATURE) {
        image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| TileError::Decode(e.to_string()))?
            .to_rgb8()
    } else if bytes.len() == RAW_CHUNK_LEN {
        decode_raw(bytes)
    } else {
        return Err(TileError::Decode(format!(
            "{} bytes is neither a PNG nor a raw {CHUNK_SIZE}x{CHUNK_SIZE} RGBA block",
            bytes.len()
        )));
    };

    let expected = (CHUNK_SIZE as u32, CHUNK_SIZE as u32);
    if block.dimensions() != expected {
        return Err(TileError::Decode(format!(
            "block is {:?}, expected {expected:?}",
            block.dimensions()
        )));
    }
    Ok(block)
}

fn decode_raw(bytes: &[u8]) -> PixelBlock {
    let size = CHUNK_SIZE as u32;
    RgbImage::from_fn(size, size, |x, z| {
        let i = (z as usize * CHUNK_SIZE + x as usize) * CHUNK_CHANNELS;
        Rgb([bytes[i], bytes[i + 1], bytes[i + 2]])
    })
}

/// Encode an RGB raster of any size as PNG.
pub fn encode_tile(pixels: &RgbImage) -> Result<Bytes> {
    let mut buf = Cursor::new(Vec::new());
    pixels
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| TileError::Encode(e.to_string()))?;
    Ok(Bytes::from(buf.into_inner()))
}
