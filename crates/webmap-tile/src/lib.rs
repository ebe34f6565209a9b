//! Tile compositing for the webmap chunk store.
//!
//! The read path turns a [`TileRequest`] into PNG bytes:
//!
//! 1. the [`TileCache`] is consulted with the request as key,
//! 2. on a miss the dimension is resolved and its region scanned,
//! 3. each stored cell is decoded by the [`codec`],
//! 4. the [`compositor`] assembles the blocks over a background fill,
//! 5. the raster is encoded and stored in the cache.
//!
//! Writes bypass the cache entirely. A tile read shortly after a write may
//! therefore show pre-write content until its cache entry expires; entries
//! are never invalidated early.

pub mod cache;
pub mod codec;
pub mod compositor;
pub mod config;
pub mod error;
pub mod service;

pub use cache::{MemoryTileCache, PassthroughCache, TileCache};
pub use codec::{decode_block, encode_tile, PixelBlock};
pub use compositor::{composite, DecodedCell};
pub use config::TileServiceConfig;
pub use error::{Result, TileError};
pub use service::TileService;

pub use bytes::Bytes;
pub use webmap_core::TileRequest;
