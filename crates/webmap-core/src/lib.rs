//! Core types for the webmap chunk store.
//!
//! This crate provides the vocabulary shared by storage and compositing:
//! - Tenant and namespace identifiers
//! - Chunk cell coordinates and rectangular regions
//! - Cell writes with opaque metadata
//! - Tile requests, which double as composite cache keys

pub mod coords;
pub mod error;
pub mod request;
pub mod types;

pub use coords::{CellPos, Region};
pub use error::{Error, Result};
pub use request::TileRequest;
pub use types::{CellMeta, CellWrite, NamespaceId, ServerId};

/// Store-wide constants
pub mod constants {
    /// Size of a chunk cell in pixels per axis
    pub const CHUNK_SIZE: usize = 16;
    /// Channels in a raw chunk payload (RGBA)
    pub const CHUNK_CHANNELS: usize = 4;
    /// Byte length of a raw, unencoded chunk payload
    pub const RAW_CHUNK_LEN: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_CHANNELS;
    /// Layer sentinel used when a client does not specify `y`
    pub const DEFAULT_LAYER: i32 = -9999;
    /// Fill color for pixels not covered by any stored cell
    pub const BACKGROUND: [u8; 3] = [213, 190, 149];
}
